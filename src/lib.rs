//! custcheck - customer due-diligence document extraction.
//!
//! Documents referenced by path or URL are resolved, classified, run through
//! OCR and analyzed by Gemini; the extracted fields are merged into a single
//! [`models::CustomerCheck`] record.

pub mod aggregate;
pub mod analysis;
pub mod batch;
pub mod cli;
pub mod config;
pub mod files;
pub mod http_client;
pub mod models;
pub mod ocr;
pub mod resolve;
