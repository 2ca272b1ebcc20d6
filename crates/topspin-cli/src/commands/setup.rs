//! Interactive first-run configuration.
//!
//! # Flow
//!
//! 1. Enter or keep the API key, with format validation
//! 2. Verify the key by listing models
//! 3. Optionally pin a model (default: auto-select)

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Password, Select};
use topspin_core::{
    GeminiClient, GeminiConfig, ModelCatalog, ModelInfo, ModelSelector, NamePreference, Settings,
};

use crate::app;

const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";

pub async fn run() -> Result<()> {
    app::header("topspin setup");

    let mut settings = Settings::load();
    let theme = ColorfulTheme::default();

    let api_key = match settings.resolved_api_key() {
        Some(existing) => {
            let keep = Select::with_theme(&theme)
                .with_prompt("Keep current API key?")
                .items(&["Yes", "No"])
                .default(0)
                .interact()?
                == 0;
            if keep {
                existing
            } else {
                app::info(&format!("Get your API key from: {API_KEY_URL}"));
                prompt_and_validate_key(&theme)?
            }
        }
        None => {
            app::info(&format!("Get your API key from: {API_KEY_URL}"));
            prompt_and_validate_key(&theme)?
        }
    };

    // Verify the key with a models listing; the result also feeds the pin step.
    let client = GeminiClient::new(GeminiConfig::new(api_key.clone()))?;
    let models = match client.list_models().await {
        Ok(models) => {
            app::success(&format!("Key verified, {} models visible", models.len()));
            models
        }
        Err(e) => {
            app::error(&format!("Could not verify the key: {e}"));
            let save_anyway = Confirm::with_theme(&theme)
                .with_prompt("Save it anyway?")
                .default(false)
                .interact()?;
            if !save_anyway {
                anyhow::bail!("Setup aborted");
            }
            Vec::new()
        }
    };

    settings.api_key = Some(api_key);
    settings.model = prompt_model_pin(&theme, &models)?;
    settings.save()?;

    println!();
    app::success("Configuration saved! Run 'topspin analyze <video>' to get coached.");

    Ok(())
}

/// Prompt for and validate an API key
fn prompt_and_validate_key(theme: &ColorfulTheme) -> Result<String> {
    loop {
        let api_key = Password::with_theme(theme)
            .with_prompt("Gemini API key")
            .interact()?;

        if !api_key.starts_with("AIza") {
            app::error("Invalid Gemini key format. Keys start with 'AIza'");
        } else if api_key.len() < 30 {
            app::error("API key seems too short");
        } else {
            return Ok(api_key);
        }
    }
}

/// Offer to pin a model; None keeps catalog auto-selection.
fn prompt_model_pin(theme: &ColorfulTheme, models: &[ModelInfo]) -> Result<Option<String>> {
    let generating: Vec<&ModelInfo> = models.iter().filter(|m| m.supports_generation()).collect();
    if generating.is_empty() {
        return Ok(None);
    }

    let auto_pick = NamePreference::default().pick(models);
    let mut items = vec!["Auto-select (prefers a flash model)".to_string()];
    items.extend(generating.iter().map(|m| {
        if auto_pick.as_deref() == Some(m.name.as_str()) {
            format!("{} [auto-selected]", m.short_name())
        } else {
            m.short_name().to_string()
        }
    }));

    let choice = Select::with_theme(theme)
        .with_prompt("Which model should analyze videos?")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(if choice == 0 {
        None
    } else {
        Some(generating[choice - 1].name.clone())
    })
}
