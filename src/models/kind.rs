//! Business document kinds.

use serde::{Deserialize, Serialize};

/// Business purpose of a document, assigned by the caller per input.
///
/// The kind selects the extraction prompt and the aggregate section the
/// extracted fields are merged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    BusinessLicense,
    EvnBill,
    LandCertificate,
    IdCheck,
    FinancialStatement,
    SiteVisitPhotos,
    CicReport,
    #[serde(rename = "cic_report_2")]
    CicReport2,
    #[default]
    Unknown,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 9] = [
        DocumentKind::BusinessLicense,
        DocumentKind::EvnBill,
        DocumentKind::LandCertificate,
        DocumentKind::IdCheck,
        DocumentKind::FinancialStatement,
        DocumentKind::SiteVisitPhotos,
        DocumentKind::CicReport,
        DocumentKind::CicReport2,
        DocumentKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessLicense => "business_license",
            Self::EvnBill => "evn_bill",
            Self::LandCertificate => "land_certificate",
            Self::IdCheck => "id_check",
            Self::FinancialStatement => "financial_statement",
            Self::SiteVisitPhotos => "site_visit_photos",
            Self::CicReport => "cic_report",
            Self::CicReport2 => "cic_report_2",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Comma separated list of accepted names, for help and error text.
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_every_kind() {
        for kind in DocumentKind::ALL {
            assert_eq!(DocumentKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_from_str_is_lenient_about_case_and_spaces() {
        assert_eq!(
            DocumentKind::from_str(" EVN_Bill "),
            Some(DocumentKind::EvnBill)
        );
        assert_eq!(DocumentKind::from_str("rental_agreement"), None);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        let json = serde_json::to_string(&DocumentKind::CicReport2).unwrap();
        assert_eq!(json, "\"cic_report_2\"");
    }
}
