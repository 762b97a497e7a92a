//! Typed view of model output.
//!
//! The model returns loosely typed JSON. [`Extraction::from_fields`] turns it
//! into one struct per document kind right after parsing; values with the
//! wrong JSON type or an unknown enum spelling are dropped field by field.
//! [`Extraction::apply_to`] then writes whatever survived into the record.

use chrono::NaiveDate;
use serde_json::Value;

use super::FieldMap;
use crate::models::{
    ClientType, CompanySignboardStatus, CustomerCheck, CustomerType, DebtClassification,
    DocumentKind, LandOwnershipSituation, LoanInfo, LoanType, MoneyVnd, OwnershipBracket,
    TriState, YesNo, REPORTING_PERIODS,
};

/// Placeholder the model uses for "no date".
const NO_DATE: &str = "0000-00-00";
const NO_PAYMENT_HISTORY: &str = "No payment history found";

/// Per-period amounts; `None` entries were not numeric and leave the
/// existing value untouched.
pub type PeriodAmounts = [Option<MoneyVnd>; REPORTING_PERIODS];

fn text(fields: &FieldMap, key: &str) -> Option<String> {
    fields.get(key)?.as_str().map(str::to_string)
}

fn money(value: &Value) -> Option<MoneyVnd> {
    value.as_f64().map(|v| v as MoneyVnd)
}

fn date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() || value == NO_DATE {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn normalized(fields: &FieldMap, key: &str) -> Option<String> {
    text(fields, key).map(|s| s.trim().to_lowercase())
}

/// Parse a yes/no answer; `Some(None)` means the key was present but the
/// answer was unclear.
fn unclear_yes_no(fields: &FieldMap, key: &str, yes: &[&str], no: &[&str]) -> Option<Option<YesNo>> {
    let answer = normalized(fields, key)?;
    Some(if yes.contains(&answer.as_str()) {
        Some(YesNo::Yes)
    } else if no.contains(&answer.as_str()) {
        Some(YesNo::No)
    } else {
        None
    })
}

fn periods(fields: &FieldMap, key: &str) -> Option<PeriodAmounts> {
    let values = fields.get(key)?.as_array()?;
    if values.len() != REPORTING_PERIODS {
        return None;
    }
    let mut amounts = [None; REPORTING_PERIODS];
    for (slot, value) in amounts.iter_mut().zip(values) {
        *slot = money(value);
    }
    Some(amounts)
}

fn apply_periods(target: &mut [MoneyVnd; REPORTING_PERIODS], source: Option<PeriodAmounts>) {
    if let Some(source) = source {
        for (slot, value) in target.iter_mut().zip(source) {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_some<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessLicenseFields {
    pub client_name: Option<String>,
    pub client_type: Option<ClientType>,
    pub tax_code_mst: Option<String>,
    pub business_license_gpkd: Option<TriState>,
    pub business_address: Option<String>,
    pub registered_share_capital: Option<MoneyVnd>,
    pub business_operations: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub incorporation_date: Option<NaiveDate>,
    pub owners_name: Option<String>,
    pub ownership_category: Option<OwnershipBracket>,
    pub key_decision_maker: Option<String>,
}

impl BusinessLicenseFields {
    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            client_name: text(fields, "client_name"),
            client_type: normalized(fields, "client_type")
                .and_then(|s| ClientType::from_str(&s)),
            tax_code_mst: text(fields, "tax_code_mst"),
            business_license_gpkd: normalized(fields, "business_license_gpkd").and_then(|s| {
                match s.as_str() {
                    "n/a" => Some(TriState::Na),
                    other => TriState::from_str(other),
                }
            }),
            business_address: text(fields, "business_address"),
            registered_share_capital: fields.get("registered_share_capital").and_then(money),
            business_operations: text(fields, "business_operations"),
            customer_type: text(fields, "customer_type").and_then(|s| CustomerType::from_str(&s)),
            incorporation_date: date(fields.get("incorporation_date").and_then(Value::as_str)),
            owners_name: text(fields, "owners_name"),
            ownership_category: text(fields, "ownership_category").and_then(|s| {
                match s.as_str() {
                    ">50%" => Some(OwnershipBracket::MoreThanHalf),
                    "<50%" => Some(OwnershipBracket::LessThanHalf),
                    "n/a" => Some(OwnershipBracket::Na),
                    other => OwnershipBracket::from_str(other),
                }
            }),
            key_decision_maker: text(fields, "key_decision_maker"),
        }
    }

    fn apply_to(self, check: &mut CustomerCheck) {
        let corporate = &mut check.corporate;
        set(&mut corporate.general.client_name, self.client_name);
        set_some(&mut corporate.general.client_type, self.client_type);
        set(&mut corporate.general.tax_code_mst, self.tax_code_mst);
        set_some(
            &mut corporate.general.business_license_gpkd,
            self.business_license_gpkd,
        );
        set(&mut corporate.general.business_address, self.business_address);
        set_some(
            &mut corporate.general.registered_share_capital,
            self.registered_share_capital,
        );
        set(
            &mut corporate.general.business_operations,
            self.business_operations,
        );
        set_some(&mut corporate.general.customer_type, self.customer_type);
        set_some(&mut corporate.history.incorporation_date, self.incorporation_date);
        set(&mut corporate.ownership.owners_name, self.owners_name);
        set_some(
            &mut corporate.ownership.ownership_category,
            self.ownership_category,
        );
        set(
            &mut corporate.ownership.key_decision_maker,
            self.key_decision_maker,
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvnBillFields {
    pub billing_address: Option<String>,
    pub billing_address_matches_client: Option<YesNo>,
    pub billing_amount: Option<MoneyVnd>,
    pub billed_amounts_match_expenses: Option<TriState>,
}

impl EvnBillFields {
    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            billing_address: text(fields, "billing_address"),
            // unclear answers count as "no"
            billing_address_matches_client: normalized(fields, "billing_address_matches_client")
                .map(|s| match s.as_str() {
                    "yes" | "true" | "1" => YesNo::Yes,
                    _ => YesNo::No,
                }),
            billing_amount: fields.get("billing_amount").and_then(money),
            billed_amounts_match_expenses: normalized(fields, "billed_amounts_match_expenses")
                .map(|s| match s.as_str() {
                    "yes" | "true" | "1" | "match" | "matches" => TriState::Yes,
                    _ => TriState::No,
                }),
        }
    }

    fn apply_to(self, check: &mut CustomerCheck) {
        let evn = &mut check.land.evn;
        set(&mut evn.billing_address, self.billing_address);
        set_some(
            &mut evn.billing_address_matches_client,
            self.billing_address_matches_client,
        );
        set_some(&mut evn.billing_amount, self.billing_amount);
        set_some(
            &mut evn.billed_amounts_match_expenses,
            self.billed_amounts_match_expenses,
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandCertificateFields {
    /// Always set; missing or unrecognized answers become `Unknown`.
    pub situation: LandOwnershipSituation,
    /// Outer `None`: not answered. Inner `None`: answered but unclear.
    pub landowner_is_signatory: Option<Option<YesNo>>,
    pub documentation_complete: Option<Option<YesNo>>,
    pub lease_expiration_date: Option<NaiveDate>,
}

impl LandCertificateFields {
    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            situation: normalized(fields, "situation")
                .and_then(|s| LandOwnershipSituation::from_str(&s))
                .unwrap_or(LandOwnershipSituation::Unknown),
            landowner_is_signatory: unclear_yes_no(
                fields,
                "landowner_is_signatory",
                &["yes", "true", "1"],
                &["no", "false", "0"],
            ),
            documentation_complete: unclear_yes_no(
                fields,
                "documentation_complete",
                &["yes", "true", "1", "complete"],
                &["no", "false", "0", "incomplete"],
            ),
            lease_expiration_date: date(
                fields.get("lease_expiration_date").and_then(Value::as_str),
            ),
        }
    }

    fn apply_to(self, check: &mut CustomerCheck) {
        let land = &mut check.land.ownership;
        land.situation = Some(self.situation);
        set(&mut land.landowner_is_signatory, self.landowner_is_signatory);
        set(&mut land.owned_docs_complete, self.documentation_complete);
        set_some(&mut land.lease_expiration_date, self.lease_expiration_date);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdCheckFields {
    pub company_director_name: Option<String>,
    pub key_decision_maker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteVisitFields {
    pub company_signboard: Option<CompanySignboardStatus>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialStatementFields {
    pub financial_statement_date: Option<NaiveDate>,
    pub total_revenues: Option<PeriodAmounts>,
    pub total_costs: Option<PeriodAmounts>,
    pub total_energy_costs: Option<PeriodAmounts>,
    pub total_assets: Option<PeriodAmounts>,
    pub total_debt: Option<PeriodAmounts>,
}

impl FinancialStatementFields {
    fn from_fields(fields: &FieldMap) -> Self {
        Self {
            financial_statement_date: date(
                fields.get("financial_statement_date").and_then(Value::as_str),
            ),
            total_revenues: periods(fields, "total_revenues"),
            total_costs: periods(fields, "total_costs"),
            total_energy_costs: periods(fields, "total_energy_costs"),
            total_assets: periods(fields, "total_assets"),
            total_debt: periods(fields, "total_debt"),
        }
    }

    fn apply_to(self, check: &mut CustomerCheck) {
        let financial = &mut check.financial;
        set_some(
            &mut financial.financial_statement_date,
            self.financial_statement_date,
        );
        apply_periods(&mut financial.pl.total_revenues, self.total_revenues);
        apply_periods(&mut financial.pl.total_costs, self.total_costs);
        apply_periods(&mut financial.pl.total_energy_costs, self.total_energy_costs);
        apply_periods(&mut financial.balance_sheet.total_assets, self.total_assets);
        apply_periods(&mut financial.balance_sheet.total_debt, self.total_debt);
    }
}

fn positive_amount(loan: &FieldMap, key: &str) -> MoneyVnd {
    loan.get(key)
        .and_then(Value::as_f64)
        .filter(|v| *v > 0.0)
        .map(|v| v as MoneyVnd)
        .unwrap_or(0)
}

fn loan_from_fields(loan: &FieldMap) -> LoanInfo {
    LoanInfo {
        loan_type: normalized(loan, "loan_type")
            .and_then(|s| LoanType::from_str(&s))
            .unwrap_or_default(),
        debt_classification: normalized(loan, "debt_classification")
            .and_then(|s| DebtClassification::from_str(&s))
            .unwrap_or_default(),
        outstanding_amount: positive_amount(loan, "outstanding_amount"),
        annual_interest_cost: positive_amount(loan, "annual_interest_cost"),
        annual_amortization: positive_amount(loan, "annual_amortization"),
        maturity: date(loan.get("maturity").and_then(Value::as_str)),
        payment_history: text(loan, "payment_history")
            .unwrap_or_else(|| NO_PAYMENT_HISTORY.to_string()),
    }
}

/// Fields extracted from one document, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    BusinessLicense(BusinessLicenseFields),
    EvnBill(EvnBillFields),
    LandCertificate(LandCertificateFields),
    IdCheck(IdCheckFields),
    SiteVisit(SiteVisitFields),
    FinancialStatement(FinancialStatementFields),
    CicReport(Vec<LoanInfo>),
    /// Kinds that do not feed the record.
    Unmapped(DocumentKind),
}

impl Extraction {
    pub fn from_fields(kind: DocumentKind, fields: &FieldMap) -> Self {
        match kind {
            DocumentKind::BusinessLicense => {
                Self::BusinessLicense(BusinessLicenseFields::from_fields(fields))
            }
            DocumentKind::EvnBill => Self::EvnBill(EvnBillFields::from_fields(fields)),
            DocumentKind::LandCertificate => {
                Self::LandCertificate(LandCertificateFields::from_fields(fields))
            }
            DocumentKind::IdCheck => Self::IdCheck(IdCheckFields {
                company_director_name: text(fields, "company_director_name"),
                key_decision_maker: text(fields, "key_decision_maker"),
            }),
            DocumentKind::SiteVisitPhotos => Self::SiteVisit(SiteVisitFields {
                company_signboard: text(fields, "company_signboard")
                    .and_then(|s| CompanySignboardStatus::from_str(&s)),
            }),
            DocumentKind::FinancialStatement => {
                Self::FinancialStatement(FinancialStatementFields::from_fields(fields))
            }
            DocumentKind::CicReport => Self::CicReport(
                fields
                    .get("loans")
                    .and_then(Value::as_array)
                    .map(|loans| {
                        loans
                            .iter()
                            .filter_map(Value::as_object)
                            .map(loan_from_fields)
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            DocumentKind::CicReport2 | DocumentKind::Unknown => Self::Unmapped(kind),
        }
    }

    /// Write the extracted values into the record.
    pub fn apply_to(self, check: &mut CustomerCheck) {
        match self {
            Self::BusinessLicense(f) => f.apply_to(check),
            Self::EvnBill(f) => f.apply_to(check),
            Self::LandCertificate(f) => f.apply_to(check),
            Self::IdCheck(f) => {
                let ownership = &mut check.corporate.ownership;
                set(&mut ownership.company_director_name, f.company_director_name);
                set(&mut ownership.key_decision_maker, f.key_decision_maker);
            }
            Self::SiteVisit(f) => set_some(
                &mut check.additional.site_visit.company_signboard,
                f.company_signboard,
            ),
            Self::FinancialStatement(f) => f.apply_to(check),
            Self::CicReport(loans) => check.financial.loans.extend(loans),
            Self::Unmapped(_) => {}
        }
    }
}
