//! External document tools: poppler for PDFs, ImageMagick and ffmpeg for
//! image conversion.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::backend::OcrError;

/// Binaries the extraction pipeline can shell out to.
pub const REQUIRED_TOOLS: &[&str] = &["pdftotext", "pdftoppm", "tesseract", "convert", "ffmpeg"];

/// Document-level operations needed by the extraction engine.
#[async_trait]
pub trait DocumentTools: Send + Sync {
    /// Extract the embedded text layer of a PDF.
    async fn pdf_to_text(&self, pdf: &Path) -> Result<String, OcrError>;

    /// Render every page of `pdf` as a PNG in `out_dir`, returning the page
    /// images in page order.
    async fn rasterize_pdf(
        &self,
        pdf: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, OcrError>;

    /// Re-encode an image into the format implied by `dst`'s extension.
    async fn convert_image(&self, src: &Path, dst: &Path) -> Result<(), OcrError>;
}

/// [`DocumentTools`] backed by binaries on PATH.
#[derive(Debug, Clone, Default)]
pub struct SystemTools;

impl SystemTools {
    pub fn new() -> Self {
        Self
    }

    async fn run(tool: &str, command: &mut Command) -> Result<Output, OcrError> {
        let output = command.kill_on_drop(true).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OcrError::ToolNotFound(tool.to_string())
            } else {
                OcrError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: tool.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Page images produced by `pdftoppm` (`page-1.png`, `page-01.png`, ...).
pub fn collect_page_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("page-") && n.ends_with(".png"))
                .unwrap_or(false)
        })
        .collect();
    // pdftoppm zero-pads to a fixed width, so lexical order is page order
    pages.sort();
    Ok(pages)
}

#[async_trait]
impl DocumentTools for SystemTools {
    async fn pdf_to_text(&self, pdf: &Path) -> Result<String, OcrError> {
        let output = Self::run(
            "pdftotext",
            Command::new("pdftotext").arg("-layout").arg(pdf).arg("-"),
        )
        .await?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn rasterize_pdf(
        &self,
        pdf: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, OcrError> {
        let dpi = dpi.to_string();
        Self::run(
            "pdftoppm",
            Command::new("pdftoppm")
                .args(["-r", &dpi, "-png"])
                .arg(pdf)
                .arg(out_dir.join("page")),
        )
        .await?;

        let pages = collect_page_images(out_dir)?;
        debug!("Rasterized {} into {} pages", pdf.display(), pages.len());
        Ok(pages)
    }

    async fn convert_image(&self, src: &Path, dst: &Path) -> Result<(), OcrError> {
        let magick = Self::run(
            "convert",
            Command::new("convert")
                .arg(src)
                .args(["-quality", "95"])
                .arg(dst),
        )
        .await;

        if let Err(e) = magick {
            debug!("convert failed ({}), trying ffmpeg", e);
            Self::run(
                "ffmpeg",
                Command::new("ffmpeg")
                    .arg("-i")
                    .arg(src)
                    .args(["-y", "-frames:v", "1"])
                    .arg(dst),
            )
            .await?;
        }

        let converted = tokio::fs::metadata(dst).await.map(|m| m.len()).unwrap_or(0);
        if converted == 0 {
            return Err(OcrError::ToolFailed {
                tool: "convert".to_string(),
                message: format!("no output written to {}", dst.display()),
            });
        }
        Ok(())
    }
}
