//! CLI parser and command dispatch.

mod extract;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use extract::ExtractArgs;

#[derive(Parser)]
#[command(name = "custcheck")]
#[command(about = "Extract customer due-diligence data from scanned documents")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text and checklist fields from documents
    Extract(ExtractArgs),

    /// Check that the external tools and API keys are available
    Tools,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => extract::cmd_extract(cli.config.as_deref(), args).await,
        Commands::Tools => tools::cmd_tools().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract_flags() {
        let cli = Cli::try_parse_from([
            "custcheck",
            "-v",
            "extract",
            "a.png",
            "--input",
            "b.pdf",
            "--file-source",
            "https://x.example/c.pdf:evn_bill",
            "--concurrency",
            "0",
            "--skip-analysis",
            "--progress",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.inputs, vec!["a.png"]);
        assert_eq!(args.input, vec!["b.pdf"]);
        assert_eq!(args.file_source, vec!["https://x.example/c.pdf:evn_bill"]);
        assert_eq!(args.concurrency, Some(0));
        assert!(args.skip_analysis);
        assert!(args.progress);
    }
}
