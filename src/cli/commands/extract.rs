//! `custcheck extract`: run a batch and write the results.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use console::style;
use tokio::sync::mpsc;

use crate::analysis::{GeminiClient, GeminiConfig};
use crate::batch::{BatchProcessor, BatchSettings};
use crate::cli::inputs;
use crate::cli::progress::{self, print_summary, BatchProgress};
use crate::config::{load_settings, Settings};
use crate::models::DocumentKind;
use crate::ocr::{OcrEngine, OcrSettings, SystemTools, TesseractBackend, VisionBackend};
use crate::resolve::SourceResolver;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Paths or URLs to process
    pub inputs: Vec<String>,

    /// Additional path or URL (repeatable)
    #[arg(short, long)]
    pub input: Vec<String>,

    /// Path or URL with its document kind, as <ref>:<kind> (repeatable)
    #[arg(long)]
    pub file_source: Vec<String>,

    /// File with one path or URL per line
    #[arg(long)]
    pub links_file: Option<PathBuf>,

    /// OCR language, e.g. eng or vie+eng [default: eng]
    #[arg(long)]
    pub lang: Option<String>,

    /// Document kind for inputs given without one [default: unknown]
    #[arg(long)]
    pub source: Option<String>,

    /// Batch deadline in seconds [default: 1200]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// PDF rasterization resolution [default: 300]
    #[arg(long, allow_negative_numbers = true)]
    pub dpi: Option<i64>,

    /// Documents processed at once [default: 3]
    #[arg(long, allow_negative_numbers = true)]
    pub concurrency: Option<i64>,

    /// Extract text only, without Gemini field extraction
    #[arg(long)]
    pub skip_analysis: bool,

    /// Print one line per finished document
    #[arg(short = 'P', long)]
    pub progress: bool,

    /// Write the aggregated customer check as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Write the per-file results as JSON
    #[arg(long)]
    pub results: Option<PathBuf>,
}

impl ExtractArgs {
    /// Command line flags win over the config file.
    fn apply_to_settings(&self, settings: &mut Settings) -> anyhow::Result<()> {
        if let Some(lang) = self.lang.as_deref().filter(|l| !l.trim().is_empty()) {
            settings.language = lang.trim().to_string();
        }
        if let Some(kind) = &self.source {
            settings.document_kind = DocumentKind::from_str(kind).with_context(|| {
                format!(
                    "unknown document kind {:?}, expected one of: {}",
                    kind,
                    DocumentKind::names()
                )
            })?;
        }
        if let Some(secs) = self.timeout {
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(dpi) = self.dpi {
            settings.set_dpi(dpi);
        }
        if let Some(concurrency) = self.concurrency {
            settings.set_concurrency(concurrency);
        }
        Ok(())
    }
}

fn build_analyzer(settings: &Settings) -> anyhow::Result<Arc<GeminiClient>> {
    let mut config = GeminiConfig::from_env()
        .context("Gemini analysis needs an API key (or pass --skip-analysis)")?;
    if let Some(model) = &settings.gemini_model {
        config = config.with_model(model);
    }
    let client = GeminiClient::new(config.with_min_interval(settings.gemini_min_interval))?;
    tracing::info!("Using Gemini model {}", client.config().model);
    Ok(Arc::new(client))
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

pub async fn cmd_extract(config_path: Option<&Path>, args: ExtractArgs) -> anyhow::Result<()> {
    let (mut settings, _config) = load_settings(config_path).await?;
    args.apply_to_settings(&mut settings)?;

    let links = match &args.links_file {
        Some(path) => inputs::read_links_file(path).await?,
        None => Vec::new(),
    };
    let collected = inputs::collect(&args.inputs, &args.input, &args.file_source, links)?;

    // Fail before any work when analysis cannot run.
    let analyzer = if args.skip_analysis {
        None
    } else {
        Some(build_analyzer(&settings)?)
    };

    let engine = OcrEngine::new(
        Arc::new(VisionBackend::from_env()?),
        Arc::new(TesseractBackend::new()),
        Arc::new(SystemTools::new()),
        OcrSettings::default()
            .with_language(settings.language.clone())
            .with_dpi(i64::from(settings.dpi)),
    );
    let batch_settings = BatchSettings::default()
        .with_concurrency(settings.concurrency as i64)
        .with_timeout(settings.timeout)
        .with_default_kind(settings.document_kind)
        .with_skip_analysis(args.skip_analysis);

    let mut processor = BatchProcessor::new(SourceResolver::new()?, engine, batch_settings);
    if let Some(client) = analyzer {
        processor = processor.with_analysis(client.clone(), client);
    }

    println!(
        "{} Processing {} documents with {} workers",
        style("→").cyan(),
        collected.inputs.len(),
        settings.concurrency
    );

    let (event_tx, event_rx) = mpsc::channel(64);
    let progress = BatchProgress::new(collected.inputs.len(), args.progress);
    let progress_task = tokio::spawn(progress.run(event_rx));

    let batch = processor
        .process(&collected.inputs, &collected.kinds, event_tx)
        .await;
    progress::finish(progress_task).await;

    print_summary(&batch);

    if let Some(path) = &args.json {
        write_json(path, &batch.customer_check).await?;
        println!("{} Customer check written to {}", style("✓").green(), path.display());
    }
    if let Some(path) = &args.results {
        write_json(path, &batch.results).await?;
        println!("{} Results written to {}", style("✓").green(), path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ExtractArgs,
    }

    fn parse(args: &[&str]) -> ExtractArgs {
        let mut argv = vec!["extract"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_flags_override_settings() {
        let args = parse(&[
            "x.pdf",
            "--lang",
            "vie",
            "--source",
            "land_certificate",
            "--timeout",
            "30",
            "--dpi",
            "-1",
            "--concurrency",
            "8",
        ]);
        let mut settings = Settings::default();
        args.apply_to_settings(&mut settings).unwrap();
        assert_eq!(settings.language, "vie");
        assert_eq!(settings.document_kind, DocumentKind::LandCertificate);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.dpi, 300);
        assert_eq!(settings.concurrency, 8);
    }

    #[test]
    fn test_unset_flags_keep_settings() {
        let args = parse(&["x.pdf"]);
        let mut settings = Settings {
            language: "vie+eng".into(),
            concurrency: 5,
            ..Default::default()
        };
        args.apply_to_settings(&mut settings).unwrap();
        assert_eq!(settings.language, "vie+eng");
        assert_eq!(settings.concurrency, 5);
    }

    #[test]
    fn test_unknown_source_kind() {
        let args = parse(&["x.pdf", "--source", "passport"]);
        assert!(args.apply_to_settings(&mut Settings::default()).is_err());
    }
}
