//! Remote service abstractions shared by the analysis pipeline.
//!
//! The pipeline talks to three capabilities: a media store (upload, status,
//! delete), a generation backend, and a model catalog. [`GeminiClient`]
//! implements all three against the Generative Language API; tests substitute
//! scripted fakes.

mod gemini;

pub use gemini::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, GeminiClient, GeminiConfig};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::error::ApiError;
use crate::model::ModelInfo;

/// Server-side lifecycle state of uploaded media.
///
/// Anything unrecognized on the wire maps to [`MediaState::Unspecified`],
/// which the pipeline treats like `Processing` rather than failing the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaState {
    Processing,
    Active,
    Failed,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl MediaState {
    /// Whether the state ends the readiness wait.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaState::Active | MediaState::Failed)
    }
}

/// Handle to media held by the remote file store.
///
/// `name` is the opaque service-assigned identifier ("files/..."); `uri` is
/// what generation requests reference. Timestamps are kept as the service's
/// RFC 3339 strings for display, the readiness wait runs on a local clock.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMedia {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub size_bytes: Option<String>,

    #[serde(default)]
    pub create_time: Option<String>,

    #[serde(default)]
    pub expiration_time: Option<String>,

    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub state: MediaState,

    /// Populated by the service when processing failed.
    #[serde(default)]
    pub error: Option<StatusDetail>,
}

impl RemoteMedia {
    /// Human-readable failure reason reported by the service, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }
}

/// Error payload attached to failed media (`google.rpc.Status` shape).
#[derive(Debug, Clone, Deserialize)]
pub struct StatusDetail {
    #[serde(default)]
    pub code: Option<i32>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Error returned when wrapping a handle that is not ACTIVE.
#[derive(Debug, Error)]
#[error("media is not ready (state {0:?})")]
pub struct NotReady(pub MediaState);

/// A media handle proven ACTIVE.
///
/// [`AnalysisBackend::generate`] only accepts this type, so a request for a
/// still-processing or failed file cannot be expressed.
#[derive(Debug, Clone)]
pub struct ReadyMedia(RemoteMedia);

impl ReadyMedia {
    /// Wrap a handle whose state was just observed as `Active`.
    pub(crate) fn new(media: RemoteMedia) -> Self {
        Self(media)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn uri(&self) -> Option<&str> {
        self.0.uri.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.0.mime_type.as_deref()
    }
}

impl TryFrom<RemoteMedia> for ReadyMedia {
    type Error = NotReady;

    fn try_from(media: RemoteMedia) -> Result<Self, NotReady> {
        match media.state {
            MediaState::Active => Ok(Self(media)),
            state => Err(NotReady(state)),
        }
    }
}

/// File storage operations of the remote service.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a local file. The returned handle carries the initial state,
    /// which may already be terminal.
    async fn upload(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteMedia, ApiError>;

    /// Re-query the current state of an uploaded file.
    async fn get(&self, name: &str) -> Result<RemoteMedia, ApiError>;

    /// Delete the remote file. Callers treat failures as best-effort.
    async fn delete(&self, name: &str) -> Result<(), ApiError>;
}

/// Content generation against ready media.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Run one generation request and return the model's text.
    async fn generate(
        &self,
        model: &str,
        media: &ReadyMedia,
        instructions: &str,
    ) -> Result<String, ApiError>;
}

/// Listing of models offered by the service.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError>;
}

/// Pipeline stages surfaced to front-ends while an analysis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    /// Sending bytes to the file store.
    Uploading,
    /// Waiting for the service to finish ingesting; `waited` since upload.
    Processing { waited: Duration },
    /// Handle ready, generation request in flight.
    Analyzing,
    /// Best-effort removal of the remote file.
    CleaningUp,
}

/// Callback invoked as the pipeline advances.
pub type ProgressFn = dyn Fn(AnalysisStage) + Send + Sync;

/// Invoke the progress observer, if any.
pub(crate) fn report(progress: Option<&ProgressFn>, stage: AnalysisStage) {
    if let Some(observer) = progress {
        observer(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(state: MediaState) -> RemoteMedia {
        RemoteMedia {
            name: "files/abc123".to_string(),
            display_name: Some("rally.mp4".to_string()),
            mime_type: Some("video/mp4".to_string()),
            size_bytes: None,
            create_time: None,
            expiration_time: None,
            uri: Some("https://generativelanguage.googleapis.com/v1beta/files/abc123".to_string()),
            state,
            error: None,
        }
    }

    #[test]
    fn test_media_state_terminality() {
        assert!(MediaState::Active.is_terminal());
        assert!(MediaState::Failed.is_terminal());
        assert!(!MediaState::Processing.is_terminal());
        assert!(!MediaState::Unspecified.is_terminal());
    }

    #[test]
    fn test_ready_media_rejects_non_active_handles() {
        assert!(ReadyMedia::try_from(media(MediaState::Active)).is_ok());

        let err = ReadyMedia::try_from(media(MediaState::Processing)).unwrap_err();
        assert_eq!(err.0, MediaState::Processing);

        assert!(ReadyMedia::try_from(media(MediaState::Failed)).is_err());
    }

    #[test]
    fn test_media_state_decodes_wire_values() {
        let decode = |raw: &str| -> MediaState { serde_json::from_str(raw).unwrap() };
        assert_eq!(decode("\"PROCESSING\""), MediaState::Processing);
        assert_eq!(decode("\"ACTIVE\""), MediaState::Active);
        assert_eq!(decode("\"FAILED\""), MediaState::Failed);
        assert_eq!(decode("\"STATE_UNSPECIFIED\""), MediaState::Unspecified);
        assert_eq!(decode("\"SOMETHING_NEW\""), MediaState::Unspecified);
    }

    #[test]
    fn test_remote_media_decodes_file_resource() {
        let raw = r#"{
            "name": "files/xyz789",
            "displayName": "serve.mov",
            "mimeType": "video/quicktime",
            "sizeBytes": "1048576",
            "createTime": "2024-05-01T12:00:00Z",
            "expirationTime": "2024-05-03T12:00:00Z",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/xyz789",
            "state": "PROCESSING"
        }"#;
        let media: RemoteMedia = serde_json::from_str(raw).unwrap();
        assert_eq!(media.name, "files/xyz789");
        assert_eq!(media.mime_type.as_deref(), Some("video/quicktime"));
        assert_eq!(media.state, MediaState::Processing);
        assert!(media.error_message().is_none());
    }

    #[test]
    fn test_remote_media_decodes_failure_detail() {
        let raw = r#"{
            "name": "files/bad",
            "state": "FAILED",
            "error": {"code": 3, "message": "Unsupported video codec"}
        }"#;
        let media: RemoteMedia = serde_json::from_str(raw).unwrap();
        assert_eq!(media.state, MediaState::Failed);
        assert_eq!(media.error_message(), Some("Unsupported video codec"));
    }

    #[test]
    fn test_remote_media_defaults_missing_state() {
        let media: RemoteMedia = serde_json::from_str(r#"{"name": "files/min"}"#).unwrap();
        assert_eq!(media.state, MediaState::Unspecified);
        assert!(!media.state.is_terminal());
    }
}
