//! End-to-end analysis pipeline: upload, await readiness, generate the
//! coaching report, clean up.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::CoachError;
use crate::ingest::{ingest_and_await_ready, release, PollConfig};
use crate::media::VideoFile;
use crate::provider::{report, AnalysisBackend, AnalysisStage, MediaStore, ProgressFn};

/// Coaching instructions sent alongside the video.
pub const DEFAULT_COACHING_PROMPT: &str = "\
You are an elite, old-school tennis coach (think Toni Nadal).
Analyze this PROFESSIONAL player.
1. Identify the stroke.
2. Find 3 biomechanical inefficiencies.
3. Prescribe 3 specific drills.
Use Markdown.";

/// Finished analysis.
#[derive(Debug)]
pub struct CoachReport {
    /// Markdown report produced by the model.
    pub report: String,
    /// Model that produced it.
    pub model: String,
    /// Time from upload start until the video was ready for analysis.
    pub processing_wait: Duration,
}

/// Run the full pipeline against `video`.
///
/// The remote file is deleted best-effort on every exit path that created
/// one: success, a processing failure, a timeout, and a rejected generation
/// call. Cleanup failures never mask the primary result. A staged local
/// copy, if `video` holds one, is removed when `video` drops.
pub async fn analyze_video(
    store: &dyn MediaStore,
    backend: &dyn AnalysisBackend,
    video: &VideoFile,
    model: &str,
    instructions: &str,
    poll: &PollConfig,
    progress: Option<&ProgressFn>,
) -> Result<CoachReport, CoachError> {
    let started = Instant::now();
    let ready = ingest_and_await_ready(store, video, poll, progress).await?;
    let processing_wait = started.elapsed();

    report(progress, AnalysisStage::Analyzing);
    let outcome = backend.generate(model, &ready, instructions).await;

    report(progress, AnalysisStage::CleaningUp);
    release(store, ready.name()).await;

    let text = outcome.map_err(CoachError::Inference)?;
    Ok(CoachReport {
        report: text,
        model: model.to_string(),
        processing_wait,
    })
}
