//! Customer check aggregate record.
//!
//! One `CustomerCheck` accumulates every field extracted across all files of
//! a batch. Each section is written by the document kinds mapped to it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Vietnamese dong amount. The currency has no minor unit.
pub type MoneyVnd = i64;

/// Number of reporting periods tracked in the P&L and balance sheet:
/// 30/06/25, 31/12/24, 30/06/24, 31/12/23, 30/06/23 (most recent first).
pub const REPORTING_PERIODS: usize = 5;

/// Closed string enum matching a checklist dropdown.
macro_rules! checklist_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

checklist_enum!(TriState {
    Na => "na",
    Yes => "yes",
    No => "no",
});

checklist_enum!(YesNo {
    Yes => "yes",
    No => "no",
});

checklist_enum!(ClientType {
    CorporateEntity => "corporate_entity",
    PrivateIndividual => "private_individual",
});

checklist_enum!(
    /// Business sector of the client.
    CustomerType {
        NaPrivateIndividual => "na_private_individual",
        ManufacturingProduction => "manufacturing_production",
        TradingCommercial => "trading_commercial",
        ConstructionRealEstate => "construction_real_estate",
        Services => "services",
        AgricultureForestryFishery => "agriculture_forestry_fishery",
        TechnologyItSoftware => "technology_it_software",
        EnergyUtilities => "energy_utilities",
        FinanceInsuranceBanking => "finance_insurance_banking",
        HealthcarePharmaceuticals => "healthcare_pharmaceuticals",
        MediaEntertainment => "media_entertainment",
    }
);

checklist_enum!(SourceOfClient {
    Epc => "epc",
    DirectOwnNetwork => "direct_own_network",
    Client => "client",
});

checklist_enum!(
    /// Share held by the primary owner.
    OwnershipBracket {
        Full => "100",
        MoreThanHalf => "gt_50",
        LessThanHalf => "lt_50",
        Na => "na",
    }
);

checklist_enum!(LandOwnershipSituation {
    LandOwner => "land_owner",
    RentalAgreement => "rental_agreement",
    Unknown => "unknown",
});

checklist_enum!(CompanySignboardStatus {
    AvailableMatchesClientInfo => "available_matches_client_info",
    AvailableDoesNotMatchClientInfo => "available_does_not_match_client_info",
    NotAvailableOrNotChecked => "not_available_or_not_checked",
});

checklist_enum!(LoanType {
    ShortTermLoan => "short_term_loan",
    MediumTermLoan => "medium_term_loan",
    LongTermLoan => "long_term_loan",
    CreditCard => "credit_card",
    Overdrafts => "overdrafts",
    Guarantee => "guarantee",
    FinancialLeasing => "financial_leasing",
    Factoring => "factoring",
    ConsumerLoan => "consumer_loan",
    OtherCreditFacility => "other_credit_facility",
});

impl Default for LoanType {
    fn default() -> Self {
        Self::OtherCreditFacility
    }
}

checklist_enum!(
    /// Credit bureau debt group.
    DebtClassification {
        Group1CurrentDebt => "group_1_current_debt",
        Group2SpecialMentionDebt => "group_2_special_mention_debt",
        Group3SubstandardDebt => "group_3_substandard_debt",
        Group4DoubtfulDebt => "group_4_doubtful_debt",
        Group5LossDebt => "group_5_loss_debt",
    }
);

impl Default for DebtClassification {
    fn default() -> Self {
        Self::Group1CurrentDebt
    }
}

// ==================== Root aggregate ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub corporate: CorporateInfo,
    #[serde(default)]
    pub land: LandInfo,
    #[serde(default)]
    pub financial: FinancialInfo,
    #[serde(default)]
    pub additional: AdditionalInfo,
}

impl CustomerCheck {
    /// Create an empty record stamped with the given completion time.
    pub fn started_at(at: DateTime<Utc>) -> Self {
        Self {
            check_completed_at: Some(at),
            ..Default::default()
        }
    }
}

// ==================== Corporate ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorporateInfo {
    #[serde(default)]
    pub general: GeneralCorporateInfo,
    #[serde(default)]
    pub history: CorporateHistory,
    #[serde(default)]
    pub relationship: RelationshipBackground,
    #[serde(default)]
    pub ownership: OwnershipInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralCorporateInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tax_code_mst: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_license_gpkd: Option<TriState>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub business_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_share_capital: Option<MoneyVnd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_type: Option<CustomerType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub business_operations: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorporateHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorporation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub history_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipBackground {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceOfClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnershipInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owners_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_category: Option<OwnershipBracket>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub company_director_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_decision_maker: String,
}

// ==================== Land ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandInfo {
    #[serde(default)]
    pub evn: EvnInformation,
    #[serde(default)]
    pub ownership: LandOwnershipInformation,
}

/// Electricity (EVN) billing details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvnInformation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub billing_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address_matches_client: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_amount: Option<MoneyVnd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billed_amounts_match_expenses: Option<TriState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandOwnershipInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<LandOwnershipSituation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landowner_is_signatory: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_expiration_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_docs_complete: Option<YesNo>,
}

// ==================== Financial ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_statement_date: Option<NaiveDate>,
    #[serde(default)]
    pub pl: PlInfo,
    #[serde(default)]
    pub balance_sheet: BalanceSheetInfo,
    #[serde(default)]
    pub loans: Vec<LoanInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlInfo {
    #[serde(default)]
    pub total_revenues: [MoneyVnd; REPORTING_PERIODS],
    #[serde(default)]
    pub total_costs: [MoneyVnd; REPORTING_PERIODS],
    #[serde(default)]
    pub total_energy_costs: [MoneyVnd; REPORTING_PERIODS],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetInfo {
    #[serde(default)]
    pub total_assets: [MoneyVnd; REPORTING_PERIODS],
    #[serde(default)]
    pub total_debt: [MoneyVnd; REPORTING_PERIODS],
}

/// One credit facility from a credit bureau (CIC) report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanInfo {
    #[serde(default)]
    pub loan_type: LoanType,
    #[serde(default)]
    pub debt_classification: DebtClassification,
    #[serde(default)]
    pub outstanding_amount: MoneyVnd,
    #[serde(default)]
    pub annual_interest_cost: MoneyVnd,
    #[serde(default)]
    pub annual_amortization: MoneyVnd,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payment_history: String,
}

// ==================== Additional ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    #[serde(default)]
    pub site_visit: SiteVisit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteVisit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_signboard: Option<CompanySignboardStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(OwnershipBracket::Full.as_str(), "100");
        assert_eq!(
            DebtClassification::from_str("group_3_substandard_debt"),
            Some(DebtClassification::Group3SubstandardDebt)
        );
        assert_eq!(
            serde_json::to_string(&CustomerType::TechnologyItSoftware).unwrap(),
            "\"technology_it_software\""
        );
        assert_eq!(LoanType::default(), LoanType::OtherCreditFacility);
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let check = CustomerCheck::default();
        let json = serde_json::to_value(&check).unwrap();
        assert!(json.get("check_completed_at").is_none());
        assert_eq!(json["corporate"]["general"], serde_json::json!({}));
        assert_eq!(
            json["financial"]["pl"]["total_revenues"],
            serde_json::json!([0, 0, 0, 0, 0])
        );
        assert_eq!(json["financial"]["loans"], serde_json::json!([]));
    }

    #[test]
    fn test_dates_serialize_as_plain_dates() {
        let mut check = CustomerCheck::default();
        check.corporate.history.incorporation_date = NaiveDate::from_ymd_opt(2015, 3, 9);
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(
            json["corporate"]["history"]["incorporation_date"],
            "2015-03-09"
        );
    }
}
