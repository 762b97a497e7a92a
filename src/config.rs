//! Configuration management using the prefer crate.
//!
//! A config file is optional. When present it supplies defaults for the
//! extraction settings; command line flags override it. Secrets are never
//! read from the file, only from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::DEFAULT_MIN_INTERVAL;
use crate::batch::{DEFAULT_BATCH_TIMEOUT, DEFAULT_CONCURRENCY};
use crate::models::DocumentKind;
use crate::ocr::{DEFAULT_DPI, DEFAULT_LANGUAGE};

/// Name prefer uses to discover `custcheck.{toml,yaml,json,...}`.
pub const CONFIG_NAME: &str = "custcheck";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("invalid document kind {0:?} in config, expected one of: {names}", names = DocumentKind::names())]
    InvalidDocumentKind(String),
}

/// Values as written in a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// OCR language, e.g. `eng` or `vie+eng`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// PDF rasterization resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u64>,
    /// Maximum number of documents processed at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u64>,
    /// Deadline for a whole batch, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Gemini model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    /// Minimum spacing between Gemini requests, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_min_interval_secs: Option<u64>,
    /// Default document kind for inputs without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_kind: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a config file in the standard locations.
    ///
    /// A missing or unreadable file yields the default (empty) config.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(e) => {
                tracing::debug!("No config file found: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file, parsed by extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overlay the values present in this file onto `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(language) = self.language.as_deref().filter(|l| !l.trim().is_empty()) {
            settings.language = language.trim().to_string();
        }
        if let Some(dpi) = self.dpi {
            settings.set_dpi(dpi as i64);
        }
        if let Some(concurrency) = self.concurrency {
            settings.set_concurrency(concurrency as i64);
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(model) = self.gemini_model.as_deref().filter(|m| !m.trim().is_empty()) {
            settings.gemini_model = Some(model.trim().to_string());
        }
        if let Some(secs) = self.gemini_min_interval_secs {
            settings.gemini_min_interval = Duration::from_secs(secs);
        }
        if let Some(kind) = &self.document_kind {
            settings.document_kind = DocumentKind::from_str(kind)
                .ok_or_else(|| ConfigError::InvalidDocumentKind(kind.clone()))?;
        }
        Ok(())
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub language: String,
    pub dpi: u32,
    pub concurrency: usize,
    pub timeout: Duration,
    /// `None` leaves the choice to `GEMINI_MODEL` or the client default.
    pub gemini_model: Option<String>,
    pub gemini_min_interval: Duration,
    pub document_kind: DocumentKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            dpi: DEFAULT_DPI,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_BATCH_TIMEOUT,
            gemini_model: None,
            gemini_min_interval: DEFAULT_MIN_INTERVAL,
            document_kind: DocumentKind::Unknown,
        }
    }
}

impl Settings {
    /// Non-positive values fall back to the default resolution.
    pub fn set_dpi(&mut self, dpi: i64) {
        self.dpi = u32::try_from(dpi)
            .ok()
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DPI);
    }

    /// Non-positive values fall back to the default concurrency.
    pub fn set_concurrency(&mut self, concurrency: i64) {
        self.concurrency = usize::try_from(concurrency)
            .ok()
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);
    }
}

/// Load settings from an explicit config path or by discovery.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings)?;
    Ok((settings, config))
}
