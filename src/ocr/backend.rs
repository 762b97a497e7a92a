//! OCR backend abstraction.
//!
//! Backends turn a single image into text. The extraction engine picks
//! between them; callers never talk to a backend directly.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Available OCR backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrBackendType {
    /// Google Cloud Vision document text detection.
    Vision,
    /// Local Tesseract binary.
    Tesseract,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vision => "vision",
            Self::Tesseract => "tesseract",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vision" | "google-vision" | "gcv" => Some(Self::Vision),
            "tesseract" => Some(Self::Tesseract),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while extracting text.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    /// The vision service rejected the image bytes.
    #[error("bad image data: {0}")]
    BadImageData(String),

    #[error("required tool not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file type: {0}")]
    UnsupportedKind(String),

    #[error("office document processing not yet implemented for {0}")]
    NotImplemented(String),

    #[error(
        "image file appears to be corrupted or in an unsupported format, tried multiple processing methods: {0}"
    )]
    Corrupted(String),

    #[error("no pages found in PDF")]
    NoPages,
}

/// A backend that recognizes text in a single image.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    fn backend_type(&self) -> OcrBackendType;

    /// Whether the backend can run (credentials present, binary installed).
    fn is_available(&self) -> bool;

    /// How to make the backend available, for diagnostics.
    fn availability_hint(&self) -> String;

    /// Recognize text in `image`. `language` is a tesseract-style code
    /// list such as `eng+vie`.
    async fn ocr_image(&self, image: &Path, language: &str) -> Result<String, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_names() {
        assert_eq!(OcrBackendType::from_str("Vision"), Some(OcrBackendType::Vision));
        assert_eq!(OcrBackendType::from_str("gcv"), Some(OcrBackendType::Vision));
        assert_eq!(
            OcrBackendType::from_str("tesseract"),
            Some(OcrBackendType::Tesseract)
        );
        assert_eq!(OcrBackendType::from_str("paddle"), None);
        assert_eq!(OcrBackendType::Tesseract.to_string(), "tesseract");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            OcrError::UnsupportedKind("video".into()).to_string(),
            "unsupported file type: video"
        );
        assert_eq!(
            OcrError::NotImplemented("excel".into()).to_string(),
            "office document processing not yet implemented for excel"
        );
        assert!(OcrError::Corrupted("boom".into())
            .to_string()
            .ends_with("tried multiple processing methods: boom"));
    }
}
