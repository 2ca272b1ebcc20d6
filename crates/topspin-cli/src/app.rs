//! Shared CLI plumbing: configuration loading and styled output.

use anyhow::Result;
use console::style;
use topspin_core::{GeminiClient, GeminiConfig, Settings};

/// Stored settings plus the API client built from them.
pub struct RunContext {
    pub settings: Settings,
    pub client: GeminiClient,
}

/// Load settings and build the API client, or exit with guidance when no
/// key is configured.
pub fn load_run_context() -> Result<RunContext> {
    let settings = Settings::load();

    let api_key = match settings.resolved_api_key() {
        Some(key) => key,
        None => {
            eprintln!("Error: No Gemini API key configured.");
            eprintln!("\nSet your key with:");
            eprintln!("  topspin config --api-key YOUR_KEY\n");
            eprintln!("Or set the GEMINI_API_KEY environment variable.");
            eprintln!("Get a key from: https://aistudio.google.com/app/apikey");
            std::process::exit(1);
        }
    };

    let client = GeminiClient::new(GeminiConfig::new(api_key))?;
    Ok(RunContext { settings, client })
}

/// Print a styled header
pub fn header(text: &str) {
    println!();
    println!("{}", style(text).bold().cyan());
    println!();
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", style("✓").green().bold(), text);
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", style("✗").red().bold(), text);
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", style("ℹ").blue(), text);
}
