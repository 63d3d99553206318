//! Providers command implementation.

use anyhow::Result;
use colored::Colorize;
use plume_core::{PlumeConfig, StatusReport};

/// Execute the providers command.
pub fn execute(config: &PlumeConfig, json_output: bool) -> Result<()> {
    let report = StatusReport::from_config(config);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Providers:".bold());
    for status in &report.providers {
        let state = if status.configured {
            "configured".green()
        } else {
            "not configured".yellow()
        };
        println!(
            "  • {}: {} {}",
            status.provider.display_name(),
            state,
            format!("(default model {})", status.default_model).dimmed()
        );
    }

    println!();
    println!("{}", "Search:".bold());
    let search =
        if report.search_configured { "configured".green() } else { "not configured".yellow() };
    println!("  • Tavily: {}", search);

    if !report.any_provider() {
        println!();
        println!(
            "  Set {} or add a key to {}",
            "OPENAI_API_KEY".cyan(),
            "~/.plume/config.toml".cyan()
        );
    }
    Ok(())
}
