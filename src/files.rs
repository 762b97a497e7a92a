//! File classification by media type and extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::DocumentKind;

/// Coarse file categories the extraction pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    Unknown,
    Image,
    Text,
    Pdf,
    Word,
    Excel,
    PowerPoint,
    Archive,
    Video,
    Audio,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Image => "image",
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::PowerPoint => "powerpoint",
            Self::Archive => "archive",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    /// Kinds with a defined extraction strategy (office formats included,
    /// they fail later with a typed "not implemented" error).
    pub fn is_processable(&self) -> bool {
        matches!(
            self,
            Self::Image | Self::Text | Self::Pdf | Self::Word | Self::Excel | Self::PowerPoint
        )
    }

    pub fn is_office(&self) -> bool {
        matches!(self, Self::Word | Self::Excel | Self::PowerPoint)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp", "heic", "svg", "jfif", "pjpeg",
    "pjp", "ico", "cur", "tga", "psd", "raw", "cr2", "nef", "orf", "sr2", "dng", "arw", "rw2",
    "pef", "srw", "x3f", "mrw", "raf", "dcr", "kdc", "erf", "mef", "iiq", "3fr", "fff", "hdr",
    "exr", "dds", "ktx", "pkm", "pvr", "astc",
];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "xml", "yaml", "yml"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "webm", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a"];

/// Strip parameters (`; charset=...`) and normalize case.
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase()
}

fn kind_from_media_type(media_type: &str) -> Option<FileKind> {
    let mt = essence(media_type);
    if mt.is_empty() {
        return None;
    }

    let kind = if mt.starts_with("image/") {
        FileKind::Image
    } else if mt == "text/plain" {
        FileKind::Text
    } else if mt == "application/pdf" {
        FileKind::Pdf
    } else if mt.starts_with("application/vnd.openxmlformats-officedocument.wordprocessingml")
        || mt == "application/msword"
    {
        FileKind::Word
    } else if mt.starts_with("application/vnd.openxmlformats-officedocument.spreadsheetml")
        || mt == "application/vnd.ms-excel"
    {
        FileKind::Excel
    } else if mt.starts_with("application/vnd.openxmlformats-officedocument.presentationml")
        || mt == "application/vnd.ms-powerpoint"
    {
        FileKind::PowerPoint
    } else if mt.starts_with("video/") {
        FileKind::Video
    } else if mt.starts_with("audio/") {
        FileKind::Audio
    } else if mt.starts_with("application/zip")
        || mt.starts_with("application/x-rar")
        || mt.starts_with("application/x-7z")
    {
        FileKind::Archive
    } else {
        return None;
    };
    Some(kind)
}

fn kind_from_extension(file_name: &str) -> FileKind {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let ext = ext.as_str();

    if IMAGE_EXTENSIONS.contains(&ext) {
        FileKind::Image
    } else if TEXT_EXTENSIONS.contains(&ext) {
        FileKind::Text
    } else if ext == "pdf" {
        FileKind::Pdf
    } else if matches!(ext, "doc" | "docx") {
        FileKind::Word
    } else if matches!(ext, "xls" | "xlsx" | "xlsm") {
        FileKind::Excel
    } else if matches!(ext, "ppt" | "pptx" | "pptm") {
        FileKind::PowerPoint
    } else if ARCHIVE_EXTENSIONS.contains(&ext) {
        FileKind::Archive
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        FileKind::Video
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        FileKind::Audio
    } else {
        FileKind::Unknown
    }
}

/// Classify a file, preferring the media type and falling back to the
/// file name extension.
pub fn detect_file_kind(file_name: &str, media_type: &str) -> FileKind {
    kind_from_media_type(media_type).unwrap_or_else(|| kind_from_extension(file_name))
}

/// Apply the caller's business context to an ambiguous classification:
/// site visit photographs of unknown type are treated as images.
pub fn effective_file_kind(kind: FileKind, document_kind: DocumentKind) -> FileKind {
    if kind == FileKind::Unknown && document_kind == DocumentKind::SiteVisitPhotos {
        FileKind::Image
    } else {
        kind
    }
}

/// Guess a media type from a file name's extension. Empty when unknown.
pub fn guess_mime_from_filename(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default()
}

/// Sniff a media type from file content (magic bytes).
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|t| t.mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_wins_over_extension() {
        assert_eq!(detect_file_kind("scan.txt", "application/pdf"), FileKind::Pdf);
        assert_eq!(detect_file_kind("photo.bin", "image/heic"), FileKind::Image);
        assert_eq!(
            detect_file_kind("notes", "text/plain; charset=utf-8"),
            FileKind::Text
        );
        assert_eq!(
            detect_file_kind(
                "x",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            FileKind::Excel
        );
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect_file_kind("bill.JPG", ""), FileKind::Image);
        assert_eq!(detect_file_kind("ledger.csv", "application/octet-stream"), FileKind::Text);
        assert_eq!(detect_file_kind("license.pdf", ""), FileKind::Pdf);
        assert_eq!(detect_file_kind("deck.pptx", ""), FileKind::PowerPoint);
        assert_eq!(detect_file_kind("bundle.7z", ""), FileKind::Archive);
        assert_eq!(detect_file_kind("downloaded", ""), FileKind::Unknown);
    }

    #[test]
    fn test_site_visit_override_only_for_unknown() {
        assert_eq!(
            effective_file_kind(FileKind::Unknown, DocumentKind::SiteVisitPhotos),
            FileKind::Image
        );
        assert_eq!(
            effective_file_kind(FileKind::Unknown, DocumentKind::EvnBill),
            FileKind::Unknown
        );
        assert_eq!(
            effective_file_kind(FileKind::Pdf, DocumentKind::SiteVisitPhotos),
            FileKind::Pdf
        );
    }

    #[test]
    fn test_processable_kinds() {
        assert!(FileKind::Image.is_processable());
        assert!(FileKind::Word.is_processable());
        assert!(!FileKind::Archive.is_processable());
        assert!(!FileKind::Unknown.is_processable());
    }

    #[test]
    fn test_guess_mime_from_filename() {
        assert_eq!(guess_mime_from_filename("a.pdf"), "application/pdf");
        assert_eq!(guess_mime_from_filename("a.png"), "image/png");
        assert_eq!(guess_mime_from_filename("no_extension"), "");
    }

    #[test]
    fn test_sniff_png_magic() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_mime(&png), Some("image/png"));
        assert_eq!(sniff_mime(b"plain words"), None);
    }
}
