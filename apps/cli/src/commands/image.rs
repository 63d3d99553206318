//! Analyze-image command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use plume_core::{PlumeConfig, PlumeServices};
use serde_json::json;
use std::path::Path;

/// Execute the analyze-image command.
pub async fn execute(
    config: &PlumeConfig,
    path: &Path,
    prompt: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let services = PlumeServices::from_config(config)
        .await
        .context("Failed to initialize services")?;
    let generation = services.vision.analyze_file(path, prompt).await?;

    if json_output {
        let output = json!({
            "file": path.display().to_string(),
            "provider": generation.provider(),
            "analysis": generation.text(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !generation.is_generated() {
        println!("{}", generation.text().yellow());
        return Ok(());
    }
    println!("{}", generation.text());
    Ok(())
}
