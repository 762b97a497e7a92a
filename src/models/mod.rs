//! Data models for customer checks.

mod customer_check;
mod kind;

pub use customer_check::{
    AdditionalInfo, BalanceSheetInfo, ClientType, CompanySignboardStatus, CorporateHistory,
    CorporateInfo, CustomerCheck, CustomerType, DebtClassification, EvnInformation,
    FinancialInfo, GeneralCorporateInfo, LandInfo, LandOwnershipInformation,
    LandOwnershipSituation, LoanInfo, LoanType, MoneyVnd, OwnershipBracket, OwnershipInfo,
    PlInfo, RelationshipBackground, SiteVisit, SourceOfClient, TriState, YesNo,
    REPORTING_PERIODS,
};
pub use kind::DocumentKind;
