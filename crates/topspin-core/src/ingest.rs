//! Upload-then-poll controller: submit a video and wait, bounded, for the
//! service to finish ingesting it.
//!
//! The polling decision is a pure function over the observed state and a
//! deadline fixed at upload time, so the wait provably ends within
//! `max_wait + interval` regardless of what the service reports.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::CoachError;
use crate::media::VideoFile;
use crate::provider::{report, AnalysisStage, MediaState, MediaStore, ProgressFn, ReadyMedia};

/// Seconds between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Wall-clock budget for the readiness wait.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// Polling cadence and wall-clock budget for the readiness wait.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between status checks.
    pub interval: Duration,
    /// Total wall-clock budget before the wait is abandoned.
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

/// Verdict on one observed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Ready,
    Fail,
    TimedOut,
    Again,
}

/// Terminal states win even when the deadline has passed; the deadline only
/// decides how long non-terminal states are tolerated.
fn next_step(state: MediaState, now: Instant, deadline: Instant) -> Step {
    match state {
        MediaState::Active => Step::Ready,
        MediaState::Failed => Step::Fail,
        _ if now >= deadline => Step::TimedOut,
        _ => Step::Again,
    }
}

/// Upload `video` and wait until the service reports it ready.
///
/// Returns exactly one terminal outcome:
/// - `Ok(ReadyMedia)` once the file is ACTIVE
/// - [`CoachError::Upload`] if the upload itself fails (no status check is
///   ever made in that case, and there is no remote file to clean up)
/// - [`CoachError::RemoteProcessing`] as soon as the service reports FAILED
/// - [`CoachError::Timeout`] when `poll.max_wait` elapses while the file is
///   still processing
///
/// The first status check happens immediately after upload; sleeps only
/// separate consecutive checks, so a file that is already ready costs no
/// waiting. Transient status-check failures are logged and tolerated, the
/// deadline still bounds them. On the failing exits the remote file is
/// deleted best-effort before the error is returned; on success the caller
/// owns the handle and is expected to [`release`] it when done.
///
/// Each call owns its handle and clock, so concurrent analyses are
/// independent tasks with no shared state.
pub async fn ingest_and_await_ready(
    store: &dyn MediaStore,
    video: &VideoFile,
    poll: &PollConfig,
    progress: Option<&ProgressFn>,
) -> Result<ReadyMedia, CoachError> {
    report(progress, AnalysisStage::Uploading);

    let media = store
        .upload(video.path(), video.mime_type(), video.display_name())
        .await
        .map_err(CoachError::Upload)?;

    // The upload response carries the initial state, which may already be
    // terminal for small files.
    match media.state {
        MediaState::Active => return Ok(ReadyMedia::new(media)),
        MediaState::Failed => {
            let detail = media.error_message().map(str::to_string);
            report(progress, AnalysisStage::CleaningUp);
            release(store, &media.name).await;
            return Err(CoachError::RemoteProcessing { detail });
        }
        _ => {}
    }

    let start = Instant::now();
    let deadline = start + poll.max_wait;
    let mut current = media;

    loop {
        match store.get(&current.name).await {
            Ok(next) => current = next,
            Err(e) => {
                // A lost poll is not a terminal outcome; keep the last known
                // state and let the deadline bound the wait.
                crate::verbose!("Status check for {} failed: {e}", current.name);
            }
        }

        match next_step(current.state, Instant::now(), deadline) {
            Step::Ready => return Ok(ReadyMedia::new(current)),
            Step::Fail => {
                let detail = current.error_message().map(str::to_string);
                report(progress, AnalysisStage::CleaningUp);
                release(store, &current.name).await;
                return Err(CoachError::RemoteProcessing { detail });
            }
            Step::TimedOut => {
                report(progress, AnalysisStage::CleaningUp);
                release(store, &current.name).await;
                return Err(CoachError::Timeout {
                    waited: start.elapsed(),
                    budget: poll.max_wait,
                });
            }
            Step::Again => {
                report(
                    progress,
                    AnalysisStage::Processing {
                        waited: start.elapsed(),
                    },
                );
                tokio::time::sleep(poll.interval).await;
            }
        }
    }
}

/// Best-effort removal of a remote file.
///
/// Failures are logged and swallowed so cleanup never masks the primary
/// result. Safe to call repeatedly: deleting an already-deleted file fails
/// remotely and is swallowed like any other cleanup error.
pub async fn release(store: &dyn MediaStore, name: &str) {
    if let Err(e) = store.delete(name).await {
        crate::verbose!("Failed to delete remote file {name}: {e}");
    }
}
