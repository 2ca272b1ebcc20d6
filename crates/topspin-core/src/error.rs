use std::time::Duration;

use thiserror::Error;

/// Transport and protocol failures from the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("upload session rejected: {0}")]
    UploadSession(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal outcome of a failed analysis.
///
/// Each variant corresponds to one distinct stage of the pipeline. Nothing
/// here is retried internally; every value reaching a caller is final.
#[derive(Debug, Error)]
pub enum CoachError {
    /// The video never reached the remote file store.
    #[error("upload failed: {0}")]
    Upload(#[source] ApiError),

    /// The store accepted the video but could not process it.
    #[error("the service could not process the video{}", detail_suffix(.detail))]
    RemoteProcessing { detail: Option<String> },

    /// The wall-clock budget elapsed with the video still processing.
    #[error("video was not ready after {}s (budget {}s); it may be too large or the service too busy", .waited.as_secs(), .budget.as_secs())]
    Timeout { waited: Duration, budget: Duration },

    /// The generation request was rejected or returned nothing usable.
    #[error("analysis failed: {0}")]
    Inference(#[source] ApiError),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}
