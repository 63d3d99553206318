//! Generate command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use plume_core::{GenerationRequest, PlumeConfig, PlumeServices};

/// Execute the generate command.
pub async fn execute(
    config: &PlumeConfig,
    request: &GenerationRequest,
    json_output: bool,
) -> Result<()> {
    let services = PlumeServices::from_config(config)
        .await
        .context("Failed to initialize services")?;
    let response = services.copy.generate(request).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.content);

    if !response.context_used.is_empty() {
        println!();
        println!("{}", format!("Brand context ({})", response.context_used.len()).bold());
        for snippet in &response.context_used {
            println!("  • {}", first_line(snippet).dimmed());
        }
    }

    println!();
    println!("{}", "Trace:".bold());
    for entry in &response.logs {
        println!("  {}", entry.dimmed());
    }

    Ok(())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
