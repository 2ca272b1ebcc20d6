//! The config command: read and update stored settings.

use anyhow::Result;
use topspin_core::Settings;

use crate::app;
use crate::args::ConfigArgs;

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = Settings::load();
    let mut changed = false;

    if let Some(api_key) = args.api_key {
        settings.api_key = Some(api_key);
        changed = true;
    }
    if let Some(model) = args.model {
        settings.model = if model.is_empty() { None } else { Some(model) };
        changed = true;
    }
    if let Some(secs) = args.poll_interval {
        if secs == 0 {
            anyhow::bail!("Poll interval must be at least 1 second");
        }
        settings.poll_interval_secs = secs;
        changed = true;
    }
    if let Some(secs) = args.max_wait {
        settings.max_wait_secs = secs;
        changed = true;
    }

    if changed {
        settings.save()?;
        app::success("Settings saved");
    }

    if args.show || !changed {
        show_settings(&settings);
    }

    Ok(())
}

fn show_settings(settings: &Settings) {
    println!("Config file: {}", Settings::config_path().display());
    println!();

    let key_status = match &settings.api_key {
        Some(_) => "[configured]",
        None if settings.resolved_api_key().is_some() => "[from environment]",
        None => "[not set]",
    };
    println!("  api_key:       {key_status}");
    println!(
        "  model:         {}",
        settings.model.as_deref().unwrap_or("(auto-select)")
    );
    println!("  poll_interval: {}s", settings.poll_interval_secs);
    println!("  max_wait:      {}s", settings.max_wait_secs);
    println!(
        "  prompt:        {}",
        if settings.prompt.is_some() {
            "custom"
        } else {
            "(built-in coaching prompt)"
        }
    );
}
