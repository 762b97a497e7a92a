//! Source resolution: turn a local path or URL into a local file.
//!
//! Remote sources are downloaded into a named temporary file that lives as
//! long as the returned [`ResolvedSource`].

pub mod google_drive;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::files::{guess_mime_from_filename, sniff_mime};
use crate::http_client::{HttpClient, HttpTransport, TransportError};

/// Download timeout for remote sources.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// File name used when neither headers nor the URL provide one.
const FALLBACK_FILE_NAME: &str = "downloaded";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("empty input")]
    EmptyInput,

    #[error("not a file and not a valid URL: {0}")]
    InvalidSource(String),

    #[error("download of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("http {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Canonical URL the failure relates to, when one was resolved.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// A source materialized on the local filesystem.
#[derive(Debug)]
pub struct ResolvedSource {
    /// Original path, or the canonical URL the content was fetched from.
    pub source_ref: String,
    pub local_path: PathBuf,
    /// Best-effort display name.
    pub file_name: String,
    /// Media type, empty when unknown.
    pub media_type: String,
    /// Backing temp file for downloads, deleted on drop.
    download: Option<NamedTempFile>,
}

impl ResolvedSource {
    /// Whether the content was downloaded into a temporary file.
    pub fn is_download(&self) -> bool {
        self.download.is_some()
    }
}

/// Resolves task inputs to local files.
#[derive(Clone)]
pub struct SourceResolver {
    transport: Arc<dyn HttpTransport>,
}

impl SourceResolver {
    /// Create a resolver using a reqwest client with the download timeout.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self::with_transport(Arc::new(HttpClient::new(
            DOWNLOAD_TIMEOUT,
        )?)))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Resolve a local path or URL.
    pub async fn resolve(&self, input: &str) -> Result<ResolvedSource, ResolveError> {
        if input.is_empty() {
            return Err(ResolveError::EmptyInput);
        }

        if is_regular_file(input).await {
            return Ok(resolve_local(input));
        }

        let url = Url::parse(input).map_err(|_| ResolveError::InvalidSource(input.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResolveError::InvalidSource(input.to_string()));
        }

        self.download(&url).await
    }

    async fn download(&self, url: &Url) -> Result<ResolvedSource, ResolveError> {
        let resolved_url = google_drive::normalize(url);
        if resolved_url != url.as_str() {
            debug!("Rewrote Google Drive link to {}", resolved_url);
        }

        let response = self
            .transport
            .get(&resolved_url)
            .await
            .map_err(|source| ResolveError::Transport {
                url: resolved_url.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(ResolveError::Status {
                url: resolved_url,
                status: response.status.as_u16(),
            });
        }

        let file_name = response
            .content_disposition_filename()
            .or_else(|| last_path_segment(url))
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

        let media_type = match response.content_type() {
            Some(ct) if !is_generic_media_type(ct) => ct.to_string(),
            _ => sniff_mime(&response.body)
                .map(str::to_string)
                .unwrap_or_else(|| guess_mime_from_filename(&file_name)),
        };

        let suffix = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix("custcheck-")
            .suffix(&suffix)
            .tempfile()?;
        tokio::fs::write(temp.path(), &response.body).await?;

        info!(
            "Downloaded {} ({} bytes) to {}",
            resolved_url,
            response.body.len(),
            temp.path().display()
        );

        Ok(ResolvedSource {
            source_ref: resolved_url,
            local_path: temp.path().to_path_buf(),
            file_name,
            media_type,
            download: Some(temp),
        })
    }
}

async fn is_regular_file(path: &str) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn resolve_local(input: &str) -> ResolvedSource {
    let path = PathBuf::from(input);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    let media_type = guess_mime_from_filename(&file_name.to_lowercase());

    ResolvedSource {
        source_ref: input.to_string(),
        local_path: path,
        file_name,
        media_type,
        download: None,
    }
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
}

fn is_generic_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    essence.is_empty()
        || essence.eq_ignore_ascii_case("application/octet-stream")
        || essence.eq_ignore_ascii_case("binary/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpResponse;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serves one canned response and records requested URLs.
    struct CannedTransport {
        response: HttpResponse,
        requested: Mutex<Vec<String>>,
    }

    impl CannedTransport {
        fn new(response: HttpResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.response.clone())
        }

        async fn post_json(
            &self,
            _url: &str,
            _body: &serde_json::Value,
        ) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connection("unexpected POST".into()))
        }
    }

    fn canned_resolver(response: HttpResponse) -> (SourceResolver, Arc<CannedTransport>) {
        let transport = CannedTransport::new(response);
        (SourceResolver::with_transport(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_local_file_is_used_in_place() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        let input = file.path().to_string_lossy().to_string();

        let (resolver, transport) = canned_resolver(HttpResponse::new(StatusCode::OK, ""));
        let resolved = resolver.resolve(&input).await.unwrap();

        assert_eq!(resolved.local_path, file.path());
        assert_eq!(resolved.source_ref, input);
        assert_eq!(resolved.media_type, "application/pdf");
        assert!(resolved.file_name.ends_with(".pdf"));
        assert!(!resolved.is_download());
        assert!(transport.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_invalid_inputs() {
        let (resolver, _) = canned_resolver(HttpResponse::new(StatusCode::OK, ""));
        assert!(matches!(
            resolver.resolve("").await,
            Err(ResolveError::EmptyInput)
        ));
        let err = resolver.resolve("no/such/file.pdf").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "not a file and not a valid URL: no/such/file.pdf"
        );
    }

    #[tokio::test]
    async fn test_download_uses_content_disposition_name() {
        let response = HttpResponse::new(StatusCode::OK, "hello")
            .with_header("content-type", "text/plain")
            .with_header("content-disposition", "attachment; filename=\"notes.txt\"");
        let (resolver, _) = canned_resolver(response);

        let resolved = resolver
            .resolve("https://files.example.com/get?id=7")
            .await
            .unwrap();
        assert_eq!(resolved.file_name, "notes.txt");
        assert_eq!(resolved.media_type, "text/plain");
        assert!(resolved.local_path.to_string_lossy().ends_with(".txt"));
        assert_eq!(std::fs::read(&resolved.local_path).unwrap(), b"hello");

        let path = resolved.local_path.clone();
        drop(resolved);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_download_falls_back_to_url_segment_and_sniffing() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let response = HttpResponse::new(StatusCode::OK, png)
            .with_header("content-type", "application/octet-stream");
        let (resolver, _) = canned_resolver(response);

        let resolved = resolver
            .resolve("https://cdn.example.com/uploads/storefront.png")
            .await
            .unwrap();
        assert_eq!(resolved.file_name, "storefront.png");
        assert_eq!(resolved.media_type, "image/png");
    }

    #[tokio::test]
    async fn test_download_generic_name() {
        let (resolver, _) = canned_resolver(HttpResponse::new(StatusCode::OK, "x"));
        let resolved = resolver.resolve("https://example.com/").await.unwrap();
        assert_eq!(resolved.file_name, "downloaded");
    }

    #[tokio::test]
    async fn test_drive_links_are_normalized_before_fetch() {
        let (resolver, transport) = canned_resolver(HttpResponse::new(StatusCode::OK, "x"));
        let resolved = resolver
            .resolve("https://drive.google.com/file/d/abc123/view?usp=sharing")
            .await
            .unwrap();

        let expected = "https://drive.google.com/uc?id=abc123&export=download";
        assert_eq!(resolved.source_ref, expected);
        assert!(resolved.is_download());
        assert_eq!(transport.requested.lock().unwrap().as_slice(), [expected]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let (resolver, _) = canned_resolver(HttpResponse::new(StatusCode::NOT_FOUND, "gone"));
        let err = resolver
            .resolve("https://example.com/missing.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Status { status: 404, .. }));
        assert_eq!(err.url(), Some("https://example.com/missing.pdf"));
    }
}
