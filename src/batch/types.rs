//! Batch results, statistics and progress events.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::files::FileKind;
use crate::models::{CustomerCheck, DocumentKind};
use crate::resolve::ResolvedSource;

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Status carried by a [`ProgressEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Completed,
    Failed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress update for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 1-based input position.
    pub current: usize,
    pub total: usize,
    /// The input as given by the caller.
    pub reference: String,
    pub status: ProgressStatus,
    pub error: Option<String>,
}

/// Outcome of one input.
#[derive(Debug, Serialize)]
pub struct TaskResult {
    /// Position of the input in the batch.
    pub index: usize,
    /// Original path or canonical URL.
    pub source_ref: String,
    pub local_path: PathBuf,
    pub file_name: String,
    pub file_kind: FileKind,
    #[serde(rename = "extracted_text")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// File size in bytes.
    pub size: u64,
    #[serde(rename = "processing_time_secs", serialize_with = "duration_secs")]
    pub elapsed: Duration,
    pub processed_at: DateTime<Utc>,
    pub document_kind: DocumentKind,
    /// Keeps a downloaded temp file alive as long as the result.
    #[serde(skip)]
    pub(crate) download: Option<ResolvedSource>,
}

impl TaskResult {
    pub(crate) fn new(index: usize, input: &str, document_kind: DocumentKind) -> Self {
        Self {
            index,
            source_ref: input.to_string(),
            local_path: PathBuf::new(),
            file_name: String::new(),
            file_kind: FileKind::Unknown,
            text: String::new(),
            error: None,
            size: 0,
            elapsed: Duration::ZERO,
            processed_at: Utc::now(),
            document_kind,
            download: None,
        }
    }

    pub(crate) fn failed(
        index: usize,
        input: &str,
        document_kind: DocumentKind,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        let mut result = Self::new(index, input, document_kind);
        result.error = Some(error.into());
        result.elapsed = elapsed;
        result
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Succeeded with non-empty text.
    pub fn is_processed(&self) -> bool {
        self.error.is_none() && !self.text.is_empty()
    }

    /// Succeeded without producing text.
    pub fn is_skipped(&self) -> bool {
        self.error.is_none() && self.text.is_empty()
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Bytes across all inputs.
    pub total_size: u64,
    pub average_file_size: u64,
    /// Processed inputs per second.
    pub processing_rate: f64,
    /// Failed inputs as a percentage of all inputs.
    pub error_rate: f64,
}

/// Everything a batch run produced.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// One entry per input, in input order.
    pub results: Vec<TaskResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(rename = "duration_secs", serialize_with = "duration_secs")]
    pub duration: Duration,
    pub customer_check: CustomerCheck,
}

impl BatchResult {
    pub fn new(
        results: Vec<TaskResult>,
        started_at: DateTime<Utc>,
        duration: Duration,
        customer_check: CustomerCheck,
    ) -> Self {
        let failed = results.iter().filter(|r| r.is_failed()).count();
        let processed = results.iter().filter(|r| r.is_processed()).count();
        let skipped = results.iter().filter(|r| r.is_skipped()).count();

        Self {
            total: results.len(),
            processed,
            failed,
            skipped,
            results,
            started_at,
            finished_at: Utc::now(),
            duration,
            customer_check,
        }
    }

    pub fn stats(&self) -> ProcessingStats {
        let total_size: u64 = self.results.iter().map(|r| r.size).sum();
        let average_file_size = if self.results.is_empty() {
            0
        } else {
            total_size / self.results.len() as u64
        };

        let secs = self.duration.as_secs_f64();
        let processing_rate = if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        };
        let error_rate = if self.total > 0 {
            self.failed as f64 / self.total as f64 * 100.0
        } else {
            0.0
        };

        ProcessingStats {
            total: self.total,
            processed: self.processed,
            failed: self.failed,
            skipped: self.skipped,
            total_size,
            average_file_size,
            processing_rate,
            error_rate,
        }
    }
}
