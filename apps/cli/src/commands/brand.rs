//! Brand command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use plume_core::{PlumeConfig, PlumeServices};
use std::path::Path;

/// Ingest a brand document.
pub async fn ingest(config: &PlumeConfig, path: &Path) -> Result<()> {
    let services = PlumeServices::from_config(config)
        .await
        .context("Failed to initialize services")?;
    let chunks = services
        .brand
        .ingest(path)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))?;

    if chunks == 0 {
        println!("{}", format!("No text found in {}", path.display()).yellow());
    } else {
        println!(
            "{} {} chunks from {} into {}",
            "Ingested".green(),
            chunks,
            path.display(),
            config.collection().cyan()
        );
    }
    Ok(())
}

/// Search brand knowledge.
pub async fn search(
    config: &PlumeConfig,
    query: &str,
    limit: Option<usize>,
    json_output: bool,
) -> Result<()> {
    let services = PlumeServices::from_config(config)
        .await
        .context("Failed to initialize services")?;
    let snippets = services.brand.search(query, limit.or(Some(config.retrieval_limit()))).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snippets)?);
        return Ok(());
    }

    if snippets.is_empty() {
        println!("{}", "No matching brand knowledge".yellow());
        println!("  {}", "Add documents with: plume brand ingest <file>".dimmed());
        return Ok(());
    }

    for (i, snippet) in snippets.iter().enumerate() {
        println!("{} {}", format!("[{}]", i + 1).bold(), snippet.source.cyan());
        println!("{}", snippet.content);
        println!();
    }
    Ok(())
}
