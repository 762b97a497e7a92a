//! Input collection for the `extract` command.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};

use crate::models::DocumentKind;

/// Inputs in command line order plus the per-input kind overrides.
#[derive(Debug, Default, PartialEq)]
pub struct CollectedInputs {
    pub inputs: Vec<String>,
    pub kinds: HashMap<String, DocumentKind>,
}

/// Split `<ref>:<kind>` on the last colon so URL schemes survive.
pub fn parse_file_source(pair: &str) -> anyhow::Result<(String, DocumentKind)> {
    let Some((reference, kind)) = pair.rsplit_once(':') else {
        bail!("invalid --file-source {:?}, expected <path-or-url>:<kind>", pair);
    };
    let reference = reference.trim();
    if reference.is_empty() {
        bail!("invalid --file-source {:?}, missing path or URL", pair);
    }
    let kind = DocumentKind::from_str(kind).with_context(|| {
        format!(
            "unknown document kind {:?} in --file-source, expected one of: {}",
            kind,
            DocumentKind::names()
        )
    })?;
    Ok((reference.to_string(), kind))
}

/// One reference per line; blank lines and `#` comments are skipped.
pub fn parse_links(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub async fn read_links_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read links file {}", path.display()))?;
    Ok(parse_links(&contents))
}

/// Gather positional inputs, `--input` values, `--file-source` pairs and
/// links file entries.
pub fn collect(
    positional: &[String],
    flagged: &[String],
    file_sources: &[String],
    links: Vec<String>,
) -> anyhow::Result<CollectedInputs> {
    let mut collected = CollectedInputs::default();

    for input in positional.iter().chain(flagged).cloned().chain(links) {
        let input = input.trim().to_string();
        if !input.is_empty() {
            collected.inputs.push(input);
        }
    }

    for pair in file_sources {
        let (reference, kind) = parse_file_source(pair)?;
        collected.kinds.insert(reference.clone(), kind);
        collected.inputs.push(reference);
    }

    if collected.inputs.is_empty() {
        bail!("no inputs given; pass paths or URLs, --input, --file-source or --links-file");
    }
    Ok(collected)
}
