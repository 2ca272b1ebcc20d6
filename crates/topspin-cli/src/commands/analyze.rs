//! The analyze command: run a video through the coaching pipeline.

use std::time::Duration;

use anyhow::{Context, Result};
use console::{style, Term};
use topspin_core::{
    analyze_video, qualified, resolve_model, AnalysisStage, NamePreference, ProgressFn, VideoFile,
    DEFAULT_COACHING_PROMPT,
};

use crate::app;
use crate::args::AnalyzeArgs;

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let ctx = app::load_run_context()?;

    let video = if args.video == "-" {
        let mut stdin = std::io::stdin().lock();
        VideoFile::stage(&mut stdin, "stdin.mp4")?
    } else {
        VideoFile::open(&args.video)?
    };

    let instructions = match (args.prompt, &args.prompt_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?,
        (None, None) => ctx
            .settings
            .prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_COACHING_PROMPT.to_string()),
    };

    let mut poll = ctx.settings.poll_config();
    if let Some(secs) = args.poll_interval {
        poll.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.max_wait {
        poll.max_wait = Duration::from_secs(secs);
    }
    if poll.interval.is_zero() {
        anyhow::bail!("Poll interval must be at least 1 second");
    }

    let model = match args.model.or_else(|| ctx.settings.model.clone()) {
        Some(model) => qualified(&model),
        None => resolve_model(&ctx.client, &NamePreference::default()).await,
    };

    let term = Term::stderr();
    let render = progress_renderer(term.clone(), model.clone());
    let progress: Option<&ProgressFn> = if args.quiet { None } else { Some(&render) };

    let result = analyze_video(
        &ctx.client,
        &ctx.client,
        &video,
        &model,
        &instructions,
        &poll,
        progress,
    )
    .await;

    if !args.quiet {
        let _ = term.clear_line();
    }

    let report = result?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &report.report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            app::success(&format!("Report written to {}", path.display()));
        }
        None => {
            app::header("Coach's Report");
            println!("{}", report.report.trim_end());
        }
    }

    if !args.quiet {
        eprintln!(
            "{}",
            style(format!(
                "Analyzed with {} after {}s of remote processing",
                report.model,
                report.processing_wait.as_secs()
            ))
            .dim()
        );
    }

    Ok(())
}

/// Single-line status display on stderr, overwritten as stages advance.
fn progress_renderer(term: Term, model: String) -> impl Fn(AnalysisStage) + Send + Sync {
    move |stage| {
        let _ = term.clear_line();
        let message = match stage {
            AnalysisStage::Uploading => format!("Sending video to AI ({model})..."),
            AnalysisStage::Processing { waited } => {
                format!("Coach is watching the video... ({}s)", waited.as_secs())
            }
            AnalysisStage::Analyzing => "Ready! Analyzing form...".to_string(),
            AnalysisStage::CleaningUp => "Cleaning up...".to_string(),
        };
        let _ = term.write_str(&message);
    }
}
