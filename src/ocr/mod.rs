//! OCR and text extraction.
//!
//! Extracts text from documents using:
//! - pdftotext (Poppler) for PDFs with an embedded text layer
//! - Google Cloud Vision for images and scanned PDF pages
//! - Tesseract as the local fallback for images Vision cannot decode
//!
//! [`OcrEngine`] owns the strategy; backends and external tools sit behind
//! traits so the strategy can run against doubles.

mod backend;
mod engine;
mod language;
mod tesseract;
mod tools;
mod vision;

pub use backend::{OcrBackend, OcrBackendType, OcrError};
pub use engine::{
    OcrEngine, OcrSettings, DEFAULT_DPI, DEFAULT_LANGUAGE, MIN_EMBEDDED_TEXT_CHARS,
    SIGNBOARD_UNCLEAR,
};
pub use language::{language_hints, tesseract_language};
pub use tesseract::TesseractBackend;
pub use tools::{collect_page_images, DocumentTools, SystemTools, REQUIRED_TOOLS};
pub use vision::{VisionBackend, VISION_API_KEY_ENV};
