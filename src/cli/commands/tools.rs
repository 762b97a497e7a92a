//! `custcheck tools`: report external tool and credential availability.

use console::style;

use crate::analysis::GEMINI_API_KEY_ENV;
use crate::ocr::{OcrBackend, TesseractBackend, REQUIRED_TOOLS, VISION_API_KEY_ENV};

fn env_is_set(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.trim().is_empty())
}

pub async fn cmd_tools() -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("External tools:").cyan());
    let mut all_found = true;
    for tool in REQUIRED_TOOLS {
        let status = match which::which(tool) {
            Ok(path) => format!("{} {}", style("✓ found").green(), style(path.display()).dim()),
            Err(_) => {
                all_found = false;
                style("✗ not found").red().to_string()
            }
        };
        println!("  {:<15} {}", tool, status);
    }

    let tesseract = TesseractBackend::new();
    if !tesseract.is_available() {
        println!("  {}", style(tesseract.availability_hint()).dim());
    }

    println!("\n{}", style("API keys:").cyan());
    for key in [GEMINI_API_KEY_ENV, VISION_API_KEY_ENV] {
        let status = if env_is_set(key) {
            style("✓ set").green()
        } else {
            all_found = false;
            style("✗ not set").red()
        };
        println!("  {:<24} {}", key, status);
    }

    println!();
    if all_found {
        println!("{} Everything needed is available", style("✓").green());
    } else {
        println!(
            "{} Some tools or keys are missing; affected documents will fail",
            style("!").yellow()
        );
    }
    Ok(())
}
