//! AI-assisted field extraction.
//!
//! Extracted OCR text is sent to Gemini with a kind-specific prompt; the
//! reply is parsed into a [`FieldMap`] and converted into typed fields by
//! [`Extraction::from_fields`].

mod fields;
mod gemini;
mod json;
mod prompts;
mod rate_limit;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::DocumentKind;

pub use fields::{
    BusinessLicenseFields, EvnBillFields, Extraction, FinancialStatementFields, IdCheckFields,
    LandCertificateFields, SiteVisitFields,
};
pub use gemini::{
    interpret_match, parse_duration, GeminiClient, GeminiConfig, RetryContext,
    GEMINI_API_KEY_ENV, GEMINI_MODEL_ENV,
};
pub use json::{extract_json, parse_fields};
pub use prompts::{address_comparison_prompt, build_prompt, SYSTEM_PREAMBLE};
pub use rate_limit::{RateLimiter, DEFAULT_MIN_INTERVAL};

/// Untyped fields returned by the model.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0} is not set; set it in your environment or .env")]
    MissingApiKey(&'static str),

    #[error("gemini request: {0}")]
    Transport(String),

    #[error("gemini http error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("service unavailable (503) after {retries} retries")]
    ServiceUnavailable { retries: u32 },

    #[error("decode response: {0}")]
    Decode(String),

    #[error("gemini error: {0}")]
    Gemini(String),

    #[error("gemini: empty response")]
    EmptyResponse,

    #[error("could not extract JSON from response: {0}")]
    NoJson(String),

    #[error("unmarshal response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("could not interpret answer: {0}")]
    UnclearAnswer(String),
}

/// Extracts fields from document text.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str, kind: DocumentKind) -> Result<FieldMap, AnalysisError>;
}

/// Decides whether two addresses name the same location.
#[async_trait]
pub trait AddressComparator: Send + Sync {
    async fn same_location(&self, first: &str, second: &str) -> Result<bool, AnalysisError>;
}
