//! Google Gemini client.
//!
//! Every attempt passes through the shared [`RateLimiter`]. Server-side
//! throttling is handled in an explicit retry loop:
//! - 429 with a `retryDelay` hint: wait exactly that long and retry
//! - 503: exponential backoff, bounded number of retries
//! - anything else non-2xx is terminal

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::json::parse_fields;
use super::prompts::{address_comparison_prompt, build_prompt, SYSTEM_PREAMBLE};
use super::rate_limit::{RateLimiter, DEFAULT_MIN_INTERVAL};
use super::{AddressComparator, AnalysisError, DocumentAnalyzer, FieldMap};
use crate::http_client::{HttpClient, HttpResponse, HttpTransport};
use crate::models::DocumentKind;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";

const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_UNAVAILABLE_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_MAX_UNAVAILABLE_RETRIES: u32 = 3;

/// Connection and retry settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// API base URL, without the `/models/...` suffix.
    pub endpoint: String,
    pub timeout: Duration,
    /// Minimum spacing between accepted requests.
    pub min_interval: Duration,
    /// First 503 backoff; doubled on each further retry.
    pub unavailable_backoff: Duration,
    pub max_unavailable_retries: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            unavailable_backoff: DEFAULT_UNAVAILABLE_BACKOFF,
            max_unavailable_retries: DEFAULT_MAX_UNAVAILABLE_RETRIES,
        }
    }

    /// Read `GEMINI_API_KEY` (required) and `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let api_key = std::env::var(GEMINI_API_KEY_ENV)
            .map(|k| k.trim().to_string())
            .unwrap_or_default();
        if api_key.is_empty() {
            return Err(AnalysisError::MissingApiKey(GEMINI_API_KEY_ENV));
        }

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var(GEMINI_MODEL_ENV) {
            config = config.with_model(&model);
        }
        Ok(config)
    }

    /// Override the model; blank values are ignored.
    pub fn with_model(mut self, model: &str) -> Self {
        let model = model.trim();
        if !model.is_empty() {
            self.model = model.to_string();
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_unavailable_backoff(mut self, backoff: Duration) -> Self {
        self.unavailable_backoff = backoff;
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
    role: &'a str,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize, Default)]
struct ErrorDetail {
    #[serde(rename = "retryInfo", default)]
    retry_info: Option<RetryInfo>,
    /// `google.rpc.RetryInfo` details carry the delay at the top level.
    #[serde(rename = "retryDelay", default)]
    retry_delay: Option<String>,
}

#[derive(Deserialize, Default)]
struct RetryInfo {
    #[serde(rename = "retryDelay", default)]
    retry_delay: String,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: ApiError,
}

/// Server-suggested retry delay from a 429 body.
fn retry_delay(body: &[u8]) -> Option<Duration> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed.error.details.iter().find_map(|detail| {
        let hint = detail
            .retry_info
            .as_ref()
            .map(|info| info.retry_delay.as_str())
            .or(detail.retry_delay.as_deref())?;
        parse_duration(hint)
    })
}

/// Parse a duration string such as `30s`, `1.5s`, `500ms` or `1m30s`.
///
/// Negative and malformed durations yield `None`.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() || s.starts_with('-') {
        return None;
    }

    let mut rest = s;
    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let value: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_end..];
        nanos += value * scale;
    }

    Some(Duration::from_nanos(nanos.round() as u64))
}

/// Read a yes/no verdict from an address comparison reply.
///
/// Looks at `addresses_match`, `result` and `match` first, then at any
/// value that is literally `yes` or `no`.
pub fn interpret_match(fields: &FieldMap) -> Option<bool> {
    fn as_answer(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    let answer = ["addresses_match", "result", "match"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(as_answer))
        .or_else(|| {
            fields
                .values()
                .filter_map(Value::as_str)
                .find(|s| matches!(s.trim().to_lowercase().as_str(), "yes" | "no"))
                .map(str::to_string)
        })?;

    match answer.trim().to_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Bookkeeping for one logical request across its retries.
#[derive(Debug, Default, Clone)]
pub struct RetryContext {
    /// Requests sent, including the first.
    pub attempts: u32,
    /// 503 retries taken so far.
    pub unavailable_attempts: u32,
    /// Time spent sleeping on server-imposed delays.
    pub total_wait: Duration,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    config: GeminiConfig,
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<RateLimiter>,
}

impl GeminiClient {
    /// Client with its own reqwest transport and rate limiter.
    pub fn new(config: GeminiConfig) -> Result<Self, AnalysisError> {
        let transport =
            HttpClient::new(config.timeout).map_err(|e| AnalysisError::Transport(e.to_string()))?;
        let limiter = Arc::new(RateLimiter::new(config.min_interval));
        Ok(Self::with_parts(config, Arc::new(transport), limiter))
    }

    pub fn with_parts(
        config: GeminiConfig,
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            config,
            transport,
            limiter,
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Send `prompt` and parse the JSON payload of the reply.
    pub async fn generate_json(&self, prompt: &str) -> Result<FieldMap, AnalysisError> {
        let combined = format!("{}{}", SYSTEM_PREAMBLE, prompt);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &combined }],
                role: "user",
            }],
        };
        let body = serde_json::to_value(&request)?;
        let url = self.config.generate_url();
        let mut ctx = RetryContext::default();

        loop {
            self.limiter.acquire().await;
            ctx.attempts += 1;

            let response = self
                .transport
                .post_json(&url, &body)
                .await
                .map_err(|e| AnalysisError::Transport(e.to_string()))?;

            match response.status.as_u16() {
                200..=299 => {
                    if ctx.attempts > 1 {
                        debug!(
                            "Gemini succeeded after {} attempts ({:?} waiting)",
                            ctx.attempts, ctx.total_wait
                        );
                    }
                    return Self::parse_response(&response);
                }
                429 => {
                    let Some(delay) = retry_delay(&response.body) else {
                        return Err(Self::api_error(&response));
                    };
                    warn!("Rate limit hit, waiting {:?} before retry", delay);
                    tokio::time::sleep(delay).await;
                    ctx.total_wait += delay;
                    self.limiter.stamp().await;
                }
                503 if ctx.unavailable_attempts < self.config.max_unavailable_retries => {
                    let delay = self.config.unavailable_backoff * 2u32.pow(ctx.unavailable_attempts);
                    ctx.unavailable_attempts += 1;
                    warn!(
                        "Service unavailable (503), retrying in {:?} (attempt {}/{})",
                        delay, ctx.unavailable_attempts, self.config.max_unavailable_retries
                    );
                    tokio::time::sleep(delay).await;
                    ctx.total_wait += delay;
                    self.limiter.stamp().await;
                }
                503 => {
                    warn!("Service unavailable (503), max retries exceeded");
                    return Err(AnalysisError::ServiceUnavailable {
                        retries: ctx.unavailable_attempts,
                    });
                }
                _ => return Err(Self::api_error(&response)),
            }
        }
    }

    fn api_error(response: &HttpResponse) -> AnalysisError {
        AnalysisError::Api {
            status: response.status.as_u16(),
            body: response.text(),
        }
    }

    fn parse_response(response: &HttpResponse) -> Result<FieldMap, AnalysisError> {
        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;

        if let Some(error) = parsed.error.filter(|e| !e.message.is_empty()) {
            return Err(AnalysisError::Gemini(error.message));
        }

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(AnalysisError::EmptyResponse)?;

        parse_fields(&text)
    }
}

#[async_trait]
impl DocumentAnalyzer for GeminiClient {
    async fn analyze(&self, text: &str, kind: DocumentKind) -> Result<FieldMap, AnalysisError> {
        info!("Analyzing {} ({} chars) with {}", kind, text.chars().count(), self.config.model);
        self.generate_json(&build_prompt(kind, text)).await
    }
}

#[async_trait]
impl AddressComparator for GeminiClient {
    async fn same_location(&self, first: &str, second: &str) -> Result<bool, AnalysisError> {
        let fields = self
            .generate_json(&address_comparison_prompt(first, second))
            .await?;
        interpret_match(&fields)
            .ok_or_else(|| AnalysisError::UnclearAnswer(Value::Object(fields).to_string()))
    }
}
