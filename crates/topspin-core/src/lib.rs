pub mod analyze;
pub mod error;
pub mod ingest;
pub mod media;
pub mod model;
pub mod provider;
pub mod settings;
pub mod verbose;

pub use analyze::{analyze_video, CoachReport, DEFAULT_COACHING_PROMPT};
pub use error::{ApiError, CoachError};
pub use ingest::{
    ingest_and_await_ready, release, PollConfig, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL,
};
pub use media::{mime_for_extension, VideoFile};
pub use model::{
    qualified, resolve_model, Fixed, ModelInfo, ModelSelector, NamePreference, DEFAULT_MODEL,
};
pub use provider::{
    AnalysisBackend, AnalysisStage, GeminiClient, GeminiConfig, MediaState, MediaStore,
    ModelCatalog, NotReady, ProgressFn, ReadyMedia, RemoteMedia, StatusDetail, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use settings::{Settings, API_KEY_ENV_VARS};
pub use verbose::set_verbose;
