//! Batch scheduler.
//!
//! Every input runs as its own task behind a semaphore of `concurrency`
//! permits. A task resolves its source, classifies it, extracts text,
//! optionally analyzes it and merges the fields into the shared record.
//! All tasks share one deadline; after they are joined the record is
//! finalized once.

mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::analysis::{AddressComparator, DocumentAnalyzer};
use crate::files::{detect_file_kind, effective_file_kind};
use crate::models::DocumentKind;
use crate::ocr::{OcrEngine, OcrError};
use crate::resolve::SourceResolver;

pub use types::{BatchResult, ProcessingStats, ProgressEvent, ProgressStatus, TaskResult};

pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(1200);

/// Deadline used when the configured timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Error recorded for tasks cut off by the batch deadline.
pub const DEADLINE_EXCEEDED: &str = "batch deadline exceeded";

#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Maximum number of tasks past the semaphore at once.
    pub concurrency: usize,
    /// Extract text only.
    pub skip_analysis: bool,
    /// Kind for inputs without an explicit one.
    pub default_kind: DocumentKind,
    /// Deadline for the whole batch, measured from its start.
    pub timeout: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            skip_analysis: false,
            default_kind: DocumentKind::Unknown,
            timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

impl BatchSettings {
    /// Non-positive values fall back to the default.
    pub fn with_concurrency(mut self, concurrency: i64) -> Self {
        self.concurrency = usize::try_from(concurrency)
            .ok()
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_kind(mut self, kind: DocumentKind) -> Self {
        self.default_kind = kind;
        self
    }

    pub fn with_skip_analysis(mut self, skip: bool) -> Self {
        self.skip_analysis = skip;
        self
    }
}

/// Runs batches of inputs through the extraction pipeline.
#[derive(Clone)]
pub struct BatchProcessor {
    resolver: Arc<SourceResolver>,
    engine: Arc<OcrEngine>,
    analyzer: Option<Arc<dyn DocumentAnalyzer>>,
    comparator: Option<Arc<dyn AddressComparator>>,
    settings: BatchSettings,
}

impl BatchProcessor {
    /// Text extraction only; call [`with_analysis`](Self::with_analysis) to
    /// enable field extraction.
    pub fn new(resolver: SourceResolver, engine: OcrEngine, settings: BatchSettings) -> Self {
        Self {
            resolver: Arc::new(resolver),
            engine: Arc::new(engine),
            analyzer: None,
            comparator: None,
            settings,
        }
    }

    pub fn with_analysis(
        mut self,
        analyzer: Arc<dyn DocumentAnalyzer>,
        comparator: Arc<dyn AddressComparator>,
    ) -> Self {
        self.analyzer = Some(analyzer);
        self.comparator = Some(comparator);
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    fn analysis_enabled(&self) -> bool {
        !self.settings.skip_analysis && self.analyzer.is_some()
    }

    /// Process every input and return one result per input.
    ///
    /// `kinds` overrides the default document kind per input reference.
    /// Progress events are sent on `event_tx`; a dropped receiver is fine.
    pub async fn process(
        &self,
        inputs: &[String],
        kinds: &HashMap<String, DocumentKind>,
        event_tx: mpsc::Sender<ProgressEvent>,
    ) -> BatchResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = batch_deadline(tokio::time::Instant::now(), self.settings.timeout);
        let total = inputs.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let aggregator = Arc::new(Aggregator::new());

        info!(
            "Processing {} inputs ({} concurrent, analysis {})",
            total,
            self.settings.concurrency,
            if self.analysis_enabled() { "on" } else { "off" }
        );

        let task_kinds: Vec<DocumentKind> = inputs
            .iter()
            .map(|input| kinds.get(input).copied().unwrap_or(self.settings.default_kind))
            .collect();

        let handles: Vec<_> = inputs
            .iter()
            .zip(&task_kinds)
            .enumerate()
            .map(|(index, (input, kind))| {
                let processor = self.clone();
                let task = Task {
                    index,
                    total,
                    input: input.clone(),
                    kind: *kind,
                };
                let semaphore = semaphore.clone();
                let aggregator = aggregator.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    processor
                        .run_task(task, semaphore, aggregator, deadline, event_tx)
                        .await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Task for {} did not finish: {}", inputs[index], e);
                    let error = format!("task failed: {}", e);
                    let _ = event_tx
                        .send(ProgressEvent {
                            current: index + 1,
                            total,
                            reference: inputs[index].clone(),
                            status: ProgressStatus::Failed,
                            error: Some(error.clone()),
                        })
                        .await;
                    results.push(TaskResult::failed(
                        index,
                        &inputs[index],
                        task_kinds[index],
                        error,
                        start.elapsed(),
                    ));
                }
            }
        }

        if let Some(comparator) = &self.comparator {
            let outcome = aggregator.finalize(comparator.as_ref()).await;
            debug!("Address check: {:?}", outcome);
        }

        let customer_check = match Arc::try_unwrap(aggregator) {
            Ok(aggregator) => aggregator.into_record(),
            Err(shared) => shared.snapshot().await,
        };

        let batch = BatchResult::new(results, started_at, start.elapsed(), customer_check);
        info!(
            "Batch finished: {} processed, {} failed, {} skipped in {:?}",
            batch.processed, batch.failed, batch.skipped, batch.duration
        );
        batch
    }

    async fn run_task(
        self,
        task: Task,
        semaphore: Arc<Semaphore>,
        aggregator: Arc<Aggregator>,
        deadline: tokio::time::Instant,
        event_tx: mpsc::Sender<ProgressEvent>,
    ) -> TaskResult {
        let started = Instant::now();

        let outcome = tokio::time::timeout_at(deadline, async {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| format!("scheduler closed: {}", e))?;
            let _ = event_tx.send(task.event(ProgressStatus::Processing, None)).await;
            Ok::<_, String>(self.process_one(&task, &aggregator, started).await)
        })
        .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                TaskResult::failed(task.index, &task.input, task.kind, error, started.elapsed())
            }
            Err(_) => {
                warn!("{} did not finish before the batch deadline", task.input);
                TaskResult::failed(
                    task.index,
                    &task.input,
                    task.kind,
                    DEADLINE_EXCEEDED,
                    started.elapsed(),
                )
            }
        };

        let status = if result.is_failed() {
            ProgressStatus::Failed
        } else {
            ProgressStatus::Completed
        };
        let _ = event_tx.send(task.event(status, result.error.clone())).await;
        result
    }

    async fn process_one(&self, task: &Task, aggregator: &Aggregator, started: Instant) -> TaskResult {
        let mut result = TaskResult::new(task.index, &task.input, task.kind);
        let fail = |mut result: TaskResult, error: String| {
            debug!("{} failed: {}", task.input, error);
            result.error = Some(error);
            result.elapsed = started.elapsed();
            result.processed_at = Utc::now();
            result
        };

        let resolved = match self.resolver.resolve(&task.input).await {
            Ok(resolved) => resolved,
            Err(e) => {
                if let Some(url) = e.url() {
                    result.source_ref = url.to_string();
                }
                return fail(result, e.to_string());
            }
        };

        if resolved.is_download() {
            debug!(
                "{} downloaded to {}",
                resolved.source_ref,
                resolved.local_path.display()
            );
        }
        result.source_ref = resolved.source_ref.clone();
        result.local_path = resolved.local_path.clone();
        result.file_name = resolved.file_name.clone();
        result.size = tokio::fs::metadata(&resolved.local_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        result.file_kind = effective_file_kind(
            detect_file_kind(&resolved.file_name, &resolved.media_type),
            task.kind,
        );
        result.download = Some(resolved);

        if !result.file_kind.is_processable() {
            let error = OcrError::UnsupportedKind(result.file_kind.to_string()).to_string();
            return fail(result, error);
        }

        let extracted = self
            .engine
            .extract(&result.local_path, result.file_kind, task.kind)
            .await;
        match extracted {
            Ok(text) => result.text = text,
            Err(e) => return fail(result, e.to_string()),
        }

        if !result.text.is_empty() && !self.settings.skip_analysis {
            if let Some(analyzer) = &self.analyzer {
                let analyzed = analyzer.analyze(&result.text, task.kind).await;
                match analyzed {
                    Ok(fields) => aggregator.merge(task.kind, &fields).await,
                    Err(e) => return fail(result, format!("Gemini analysis error: {}", e)),
                }
            }
        }

        result.elapsed = started.elapsed();
        result.processed_at = Utc::now();
        result
    }
}

fn batch_deadline(now: tokio::time::Instant, timeout: Duration) -> tokio::time::Instant {
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Identity of one scheduled input.
struct Task {
    index: usize,
    total: usize,
    input: String,
    kind: DocumentKind,
}

impl Task {
    fn event(&self, status: ProgressStatus, error: Option<String>) -> ProgressEvent {
        ProgressEvent {
            current: self.index + 1,
            total: self.total,
            reference: self.input.clone(),
            status,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, FieldMap};
    use crate::files::FileKind;
    use crate::http_client::{HttpResponse, HttpTransport, TransportError};
    use crate::models::YesNo;
    use crate::ocr::{DocumentTools, OcrBackend, OcrBackendType, OcrSettings};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct NoNetwork;

    #[async_trait]
    impl HttpTransport for NoNetwork {
        async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(StatusCode::NOT_FOUND, "missing"))
        }

        async fn post_json(
            &self,
            _url: &str,
            _body: &serde_json::Value,
        ) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connection("offline".into()))
        }
    }

    struct NoOcr;

    #[async_trait]
    impl OcrBackend for NoOcr {
        fn backend_type(&self) -> OcrBackendType {
            OcrBackendType::Tesseract
        }

        fn is_available(&self) -> bool {
            false
        }

        fn availability_hint(&self) -> String {
            "disabled".into()
        }

        async fn ocr_image(&self, _image: &Path, _language: &str) -> Result<String, OcrError> {
            Err(OcrError::BackendNotAvailable("disabled".into()))
        }
    }

    struct NoTools;

    #[async_trait]
    impl DocumentTools for NoTools {
        async fn pdf_to_text(&self, _pdf: &Path) -> Result<String, OcrError> {
            Err(OcrError::ToolNotFound("pdftotext".into()))
        }

        async fn rasterize_pdf(
            &self,
            _pdf: &Path,
            _dpi: u32,
            _out_dir: &Path,
        ) -> Result<Vec<PathBuf>, OcrError> {
            Err(OcrError::ToolNotFound("pdftoppm".into()))
        }

        async fn convert_image(&self, _src: &Path, _dst: &Path) -> Result<(), OcrError> {
            Err(OcrError::ToolNotFound("convert".into()))
        }
    }

    /// Analyzer that echoes the document text into kind-specific fields and
    /// tracks how many calls overlap.
    struct EchoAnalyzer {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl EchoAnalyzer {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DocumentAnalyzer for EchoAnalyzer {
        async fn analyze(&self, text: &str, kind: DocumentKind) -> Result<FieldMap, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if text.contains("FAIL") {
                return Err(AnalysisError::EmptyResponse);
            }
            let value = match kind {
                DocumentKind::BusinessLicense => {
                    serde_json::json!({"business_address": text.trim(), "client_name": "ABC"})
                }
                DocumentKind::EvnBill => serde_json::json!({
                    "billing_address": text.trim(),
                    "billing_address_matches_client": "no"
                }),
                _ => serde_json::json!({}),
            };
            Ok(value.as_object().cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl AddressComparator for EchoAnalyzer {
        async fn same_location(&self, _a: &str, _b: &str) -> Result<bool, AnalysisError> {
            Err(AnalysisError::EmptyResponse)
        }
    }

    fn processor(settings: BatchSettings) -> BatchProcessor {
        let engine = OcrEngine::new(
            Arc::new(NoOcr),
            Arc::new(NoOcr),
            Arc::new(NoTools),
            OcrSettings::default(),
        );
        BatchProcessor::new(
            SourceResolver::with_transport(Arc::new(NoNetwork)),
            engine,
            settings,
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    fn events() -> (mpsc::Sender<ProgressEvent>, mpsc::Receiver<ProgressEvent>) {
        mpsc::channel(256)
    }

    fn drain(mut rx: mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_every_input_yields_one_result() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![
            write(&dir, "a.txt", "first document"),
            write(&dir, "empty.txt", ""),
            dir.path().join("missing.txt").to_string_lossy().to_string(),
            write(&dir, "clip.mp4", "not really a video"),
            "https://example.com/gone.pdf".to_string(),
            write(&dir, "b.md", "second document"),
        ];
        let (tx, _rx) = events();

        let batch = processor(BatchSettings::default())
            .process(&inputs, &HashMap::new(), tx)
            .await;

        assert_eq!(batch.total, inputs.len());
        assert_eq!(batch.results.len(), inputs.len());
        assert_eq!(batch.processed + batch.failed + batch.skipped, inputs.len());
        assert_eq!((batch.processed, batch.skipped, batch.failed), (2, 1, 3));

        for (i, result) in batch.results.iter().enumerate() {
            assert_eq!(result.index, i);
        }
        assert_eq!(batch.results[0].text, "first document");
        assert_eq!(batch.results[0].file_kind, FileKind::Text);
        assert_eq!(batch.results[0].size, 14);
        assert!(batch.results[2]
            .error
            .as_deref()
            .unwrap()
            .starts_with("not a file and not a valid URL"));
        assert_eq!(
            batch.results[3].error.as_deref(),
            Some("unsupported file type: video")
        );
        assert_eq!(batch.results[4].error.as_deref(), Some("http 404 from https://example.com/gone.pdf"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let dir = TempDir::new().unwrap();
        let inputs: Vec<String> = (0..8)
            .map(|i| write(&dir, &format!("doc{}.txt", i), "some text"))
            .collect();
        let analyzer = EchoAnalyzer::new(Duration::from_millis(30));
        let (tx, _rx) = events();

        let batch = processor(BatchSettings::default().with_concurrency(2))
            .with_analysis(analyzer.clone(), analyzer.clone())
            .process(&inputs, &HashMap::new(), tx)
            .await;

        assert_eq!(batch.processed, 8);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 8);
        let max = analyzer.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 2, "saw {} concurrent analyses", max);
        assert!(max >= 1);
    }

    #[tokio::test]
    async fn test_progress_events_are_ordered_per_input() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![
            write(&dir, "a.txt", "alpha"),
            "relative/missing.txt".to_string(),
            write(&dir, "c.txt", "gamma"),
        ];
        let (tx, rx) = events();

        processor(BatchSettings::default())
            .process(&inputs, &HashMap::new(), tx)
            .await;
        let events = drain(rx);

        assert_eq!(events.len(), inputs.len() * 2);
        for (i, input) in inputs.iter().enumerate() {
            let positions: Vec<(usize, &ProgressEvent)> = events
                .iter()
                .enumerate()
                .filter(|(_, e)| &e.reference == input)
                .collect();
            assert_eq!(positions.len(), 2);
            assert_eq!(positions[0].1.status, ProgressStatus::Processing);
            assert_ne!(positions[1].1.status, ProgressStatus::Processing);
            assert!(positions[0].0 < positions[1].0);
            assert_eq!(positions[0].1.current, i + 1);
            assert_eq!(positions[0].1.total, 3);
        }

        let failed = events
            .iter()
            .find(|e| e.status == ProgressStatus::Failed)
            .unwrap();
        assert_eq!(failed.reference, "relative/missing.txt");
        assert!(failed.error.is_some());
    }

    #[tokio::test]
    async fn test_deadline_fails_slow_tasks() {
        let dir = TempDir::new().unwrap();
        let inputs: Vec<String> = (0..4)
            .map(|i| write(&dir, &format!("slow{}.txt", i), "text"))
            .collect();
        let analyzer = EchoAnalyzer::new(Duration::from_secs(10));
        let (tx, _rx) = events();

        let started = Instant::now();
        let batch = processor(
            BatchSettings::default()
                .with_concurrency(1)
                .with_timeout(Duration::from_millis(100)),
        )
        .with_analysis(analyzer.clone(), analyzer)
        .process(&inputs, &HashMap::new(), tx)
        .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(batch.failed, 4);
        for result in &batch.results {
            assert_eq!(result.error.as_deref(), Some(DEADLINE_EXCEEDED));
        }
    }

    #[tokio::test]
    async fn test_analysis_failure_marks_task_failed() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![write(&dir, "bad.txt", "FAIL please")];
        let analyzer = EchoAnalyzer::new(Duration::ZERO);
        let (tx, _rx) = events();

        let batch = processor(BatchSettings::default())
            .with_analysis(analyzer.clone(), analyzer)
            .process(&inputs, &HashMap::new(), tx)
            .await;

        assert_eq!(batch.failed, 1);
        assert_eq!(
            batch.results[0].error.as_deref(),
            Some("Gemini analysis error: gemini: empty response")
        );
        assert_eq!(batch.results[0].text, "FAIL please");
    }

    #[tokio::test]
    async fn test_fields_merge_and_finalize_with_fallback() {
        let dir = TempDir::new().unwrap();
        let license = write(&dir, "license.txt", "12 Le Loi Street, District 1, HCMC");
        let bill = write(&dir, "bill.txt", "12 Le Loi St, Dist 1, Ho Chi Minh City");
        let inputs = vec![license.clone(), bill.clone()];
        let kinds = HashMap::from([
            (license, DocumentKind::BusinessLicense),
            (bill, DocumentKind::EvnBill),
        ]);
        let analyzer = EchoAnalyzer::new(Duration::ZERO);
        let (tx, _rx) = events();

        let batch = processor(BatchSettings::default())
            .with_analysis(analyzer.clone(), analyzer)
            .process(&inputs, &kinds, tx)
            .await;

        let record = &batch.customer_check;
        assert_eq!(record.corporate.general.client_name, "ABC");
        assert_eq!(batch.results[1].document_kind, DocumentKind::EvnBill);
        // comparator errors, so the deterministic match decides and overrides "no"
        assert_eq!(record.land.evn.billing_address_matches_client, Some(YesNo::Yes));
        assert!(record.check_completed_at.is_some());
    }

    #[tokio::test]
    async fn test_skip_analysis_extracts_text_only() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![write(&dir, "a.txt", "text")];
        let analyzer = EchoAnalyzer::new(Duration::ZERO);
        let (tx, _rx) = events();

        let batch = processor(BatchSettings::default().with_skip_analysis(true))
            .with_analysis(analyzer.clone(), analyzer.clone())
            .process(&inputs, &HashMap::new(), tx)
            .await;

        assert_eq!(batch.processed, 1);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_downloaded_file_lives_with_result() {
        struct Serve;

        #[async_trait]
        impl HttpTransport for Serve {
            async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
                Ok(HttpResponse::new(StatusCode::OK, "remote text")
                    .with_header("content-type", "text/plain"))
            }

            async fn post_json(
                &self,
                _url: &str,
                _body: &serde_json::Value,
            ) -> Result<HttpResponse, TransportError> {
                Err(TransportError::Connection("offline".into()))
            }
        }

        let engine = OcrEngine::new(
            Arc::new(NoOcr),
            Arc::new(NoOcr),
            Arc::new(NoTools),
            OcrSettings::default(),
        );
        let processor = BatchProcessor::new(
            SourceResolver::with_transport(Arc::new(Serve)),
            engine,
            BatchSettings::default(),
        );
        let (tx, _rx) = events();
        let batch = processor
            .process(&["https://example.com/notes.txt".to_string()], &HashMap::new(), tx)
            .await;

        let result = &batch.results[0];
        assert_eq!(result.text, "remote text");
        assert_eq!(result.file_name, "notes.txt");
        assert!(result.local_path.exists());
        let path = result.local_path.clone();
        drop(batch);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_huge_timeout_does_not_overflow() {
        let dir = TempDir::new().unwrap();
        let inputs = vec![
            write(&dir, "a.txt", "alpha"),
            "relative/missing.txt".to_string(),
        ];
        let (tx, _rx) = events();

        let batch = processor(
            BatchSettings::default().with_timeout(Duration::from_secs(u64::MAX)),
        )
        .process(&inputs, &HashMap::new(), tx)
        .await;

        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.processed, 1);
        assert_eq!(batch.failed, 1);
        assert_ne!(batch.results[1].error.as_deref(), Some(DEADLINE_EXCEEDED));
    }

    #[test]
    fn test_batch_deadline_saturates() {
        let now = tokio::time::Instant::now();
        assert_eq!(
            batch_deadline(now, Duration::from_secs(5)),
            now + Duration::from_secs(5)
        );
        assert_eq!(
            batch_deadline(now, Duration::from_secs(u64::MAX)),
            now + FAR_FUTURE
        );
    }

    #[test]
    fn test_concurrency_coercion() {
        assert_eq!(BatchSettings::default().with_concurrency(0).concurrency, 3);
        assert_eq!(BatchSettings::default().with_concurrency(-2).concurrency, 3);
        assert_eq!(BatchSettings::default().with_concurrency(7).concurrency, 7);
    }
}
