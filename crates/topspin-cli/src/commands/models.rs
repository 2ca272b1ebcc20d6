//! The models command: list what your API key can use.

use anyhow::Result;
use console::style;
use topspin_core::{ModelCatalog, ModelSelector, NamePreference};

use crate::app;

pub async fn run(all: bool) -> Result<()> {
    let ctx = app::load_run_context()?;
    let models = ctx.client.list_models().await?;

    let auto_pick = NamePreference::default().pick(&models);

    let mut shown = 0;
    for model in &models {
        if !all && !model.supports_generation() {
            continue;
        }
        shown += 1;

        let mut line = format!("{:<36}", model.short_name());
        if let Some(display_name) = &model.display_name {
            line.push(' ');
            line.push_str(display_name);
        }

        if auto_pick.as_deref() == Some(model.name.as_str()) {
            println!("{} {}", line, style("[auto-selected]").green());
        } else if !model.supports_generation() {
            println!("{} {}", line, style("(no content generation)").dim());
        } else {
            println!("{line}");
        }
    }

    if shown == 0 {
        app::info("No generation-capable models visible to this key. Try --all.");
    }

    Ok(())
}
