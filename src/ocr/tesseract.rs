//! Tesseract OCR backend.
//!
//! Runs the `tesseract` binary and reads recognized text from stdout. Used
//! as the local fallback when the cloud backend cannot read an image.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::backend::{OcrBackend, OcrBackendType, OcrError};
use super::language::tesseract_language;

/// Local Tesseract backend.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: String,
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractBackend {
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }

    /// Use a specific binary instead of `tesseract` from PATH.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Tesseract is installed".to_string()
        } else {
            "Install tesseract-ocr: apt install tesseract-ocr (Linux) or brew install tesseract (macOS)"
                .to_string()
        }
    }

    async fn ocr_image(&self, image: &Path, language: &str) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .args(["-l", tesseract_language(language)])
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ));
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::OcrFailed(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            return Err(OcrError::OcrFailed("no text extracted from image".to_string()));
        }
        Ok(text)
    }
}
