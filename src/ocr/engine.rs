//! Text extraction state machine.
//!
//! Chooses a strategy by file kind:
//! - text files are read directly
//! - PDFs use their embedded text layer, falling back to per-page OCR
//! - images go through the vision backend with a recovery chain for
//!   images the service cannot decode

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::backend::{OcrBackend, OcrError};
use super::tools::DocumentTools;
use crate::files::FileKind;
use crate::models::DocumentKind;

/// Embedded PDF text longer than this (trimmed, in characters) is used as-is.
pub const MIN_EMBEDDED_TEXT_CHARS: usize = 10;

pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Returned for unreadable site visit photos instead of an error.
pub const SIGNBOARD_UNCLEAR: &str = "No signboard visible or signboard unclear in site visit photos";

#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// Tesseract-style language list, e.g. `eng+vie`.
    pub language: String,
    /// Rasterization resolution for scanned PDFs.
    pub dpi: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            dpi: DEFAULT_DPI,
        }
    }
}

impl OcrSettings {
    /// Non-positive DPI values fall back to the default.
    pub fn with_dpi(mut self, dpi: i64) -> Self {
        self.dpi = u32::try_from(dpi)
            .ok()
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DPI);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !language.trim().is_empty() {
            self.language = language;
        }
        self
    }
}

/// Extracts text from a local file.
pub struct OcrEngine {
    vision: Arc<dyn OcrBackend>,
    local: Arc<dyn OcrBackend>,
    tools: Arc<dyn DocumentTools>,
    settings: OcrSettings,
}

impl OcrEngine {
    pub fn new(
        vision: Arc<dyn OcrBackend>,
        local: Arc<dyn OcrBackend>,
        tools: Arc<dyn DocumentTools>,
        settings: OcrSettings,
    ) -> Self {
        Self {
            vision,
            local,
            tools,
            settings,
        }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    /// Extract text from `path` according to its file kind.
    pub async fn extract(
        &self,
        path: &Path,
        file_kind: FileKind,
        document_kind: DocumentKind,
    ) -> Result<String, OcrError> {
        match file_kind {
            FileKind::Text => {
                let bytes = tokio::fs::read(path).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            FileKind::Pdf => self.extract_pdf(path).await,
            FileKind::Image => self.extract_image(path, document_kind).await,
            kind if kind.is_office() => Err(OcrError::NotImplemented(kind.to_string())),
            kind => Err(OcrError::UnsupportedKind(kind.to_string())),
        }
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String, OcrError> {
        match self.tools.pdf_to_text(path).await {
            Ok(text) if text.trim().chars().count() > MIN_EMBEDDED_TEXT_CHARS => {
                debug!("Using embedded text layer of {}", path.display());
                return Ok(text);
            }
            Ok(_) => debug!("{} has no usable text layer", path.display()),
            Err(e) => debug!("pdftotext failed for {}: {}", path.display(), e),
        }

        if !self.vision.is_available() {
            return Err(OcrError::BackendNotAvailable(self.vision.availability_hint()));
        }

        let pages_dir = TempDir::new()?;
        let pages = self
            .tools
            .rasterize_pdf(path, self.settings.dpi, pages_dir.path())
            .await?;
        if pages.is_empty() {
            return Err(OcrError::NoPages);
        }

        info!("OCR on {} pages of {}", pages.len(), path.display());
        let mut texts = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            match self.vision.ocr_image(page, &self.settings.language).await {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        texts.push(text.to_string());
                    }
                }
                Err(e) => warn!("OCR failed for page {} of {}: {}", i + 1, path.display(), e),
            }
        }

        Ok(texts.join("\n\n"))
    }

    async fn extract_image(
        &self,
        path: &Path,
        document_kind: DocumentKind,
    ) -> Result<String, OcrError> {
        let language = &self.settings.language;
        let first = match self.vision.ocr_image(path, language).await {
            Ok(text) => return Ok(text),
            Err(OcrError::BadImageData(message)) => message,
            Err(e) => return Err(e),
        };

        warn!(
            "Vision could not decode {} ({}), attempting recovery",
            path.display(),
            first
        );
        let mut last_error = match self.convert_and_retry(path).await {
            Ok(text) => return Ok(text),
            Err(e) => {
                debug!("Conversion retry failed for {}: {}", path.display(), e);
                e
            }
        };

        match self.local.ocr_image(path, language).await {
            Ok(text) if !text.trim().is_empty() => {
                info!("Recovered {} with {}", path.display(), self.local.backend_type());
                return Ok(text);
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Local OCR failed for {}: {}", path.display(), e);
                last_error = e;
            }
        }

        if document_kind == DocumentKind::SiteVisitPhotos {
            info!("Unreadable site visit photo {}, recording unclear signboard", path.display());
            return Ok(SIGNBOARD_UNCLEAR.to_string());
        }

        Err(OcrError::Corrupted(last_error.to_string()))
    }

    async fn convert_and_retry(&self, path: &Path) -> Result<String, OcrError> {
        let work_dir = TempDir::new()?;
        let converted = work_dir.path().join("converted.png");
        self.tools.convert_image(path, &converted).await?;
        self.vision
            .ocr_image(&converted, &self.settings.language)
            .await
    }
}
