//! Google Cloud Vision OCR backend.
//!
//! Sends the image inline (base64) to `images:annotate` with
//! `DOCUMENT_TEXT_DETECTION`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{OcrBackend, OcrBackendType, OcrError};
use super::language::language_hints;
use crate::http_client::{HttpClient, HttpTransport};

pub const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const VISION_TIMEOUT: Duration = Duration::from_secs(120);
pub const VISION_API_KEY_ENV: &str = "GOOGLE_VISION_API_KEY";

/// Message fragment the service uses for undecodable images.
const BAD_IMAGE_SIGNATURE: &str = "Bad image data";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest<'a> {
    requests: Vec<ImageRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
    image_context: ImageContext,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

#[derive(Deserialize, Default)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

/// Cloud Vision backend.
pub struct VisionBackend {
    api_key: Option<String>,
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
}

impl VisionBackend {
    /// Backend reading its key from `GOOGLE_VISION_API_KEY`.
    pub fn from_env() -> Result<Self, OcrError> {
        let transport = HttpClient::new(VISION_TIMEOUT)
            .map_err(|e| OcrError::BackendNotAvailable(e.to_string()))?;
        let api_key = std::env::var(VISION_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Ok(Self::new(api_key, Arc::new(transport)))
    }

    pub fn new(api_key: Option<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api_key,
            endpoint: VISION_ENDPOINT.to_string(),
            transport,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn classify_message(message: String) -> OcrError {
        if message.contains(BAD_IMAGE_SIGNATURE) {
            OcrError::BadImageData(message)
        } else {
            OcrError::OcrFailed(format!("vision API error: {}", message))
        }
    }
}

#[async_trait]
impl OcrBackend for VisionBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Vision
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Google Cloud Vision is configured".to_string()
        } else {
            format!("Set {} to enable Google Cloud Vision OCR", VISION_API_KEY_ENV)
        }
    }

    async fn ocr_image(&self, image: &Path, language: &str) -> Result<String, OcrError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| OcrError::BackendNotAvailable(self.availability_hint()))?;

        let bytes = tokio::fs::read(image).await?;
        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(&bytes),
                },
                features: vec![Feature {
                    kind: "DOCUMENT_TEXT_DETECTION",
                }],
                image_context: ImageContext {
                    language_hints: language_hints(language),
                },
            }],
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| OcrError::OcrFailed(format!("failed to encode request: {}", e)))?;

        debug!("Vision OCR on {} ({} bytes)", image.display(), bytes.len());
        let url = format!("{}?key={}", self.endpoint, api_key);
        let response = self
            .transport
            .post_json(&url, &body)
            .await
            .map_err(|e| OcrError::OcrFailed(format!("vision request failed: {}", e)))?;

        if !response.is_success() {
            let text = response.text();
            if text.contains(BAD_IMAGE_SIGNATURE) {
                return Err(OcrError::BadImageData(text));
            }
            return Err(OcrError::OcrFailed(format!(
                "vision API returned {}: {}",
                response.status, text
            )));
        }

        let parsed: AnnotateResponse = response
            .json()
            .map_err(|e| OcrError::OcrFailed(format!("invalid vision response: {}", e)))?;
        let first = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::OcrFailed("no responses from vision API".to_string()))?;

        if let Some(error) = first.error {
            return Err(Self::classify_message(error.message));
        }

        if let Some(full) = first.full_text_annotation {
            return Ok(full.text);
        }
        Ok(first
            .text_annotations
            .into_iter()
            .next()
            .map(|a| a.description)
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_default())
    }
}
