//! Gemini implementation of the media store, analysis backend, and model
//! catalog, speaking the Generative Language REST API.
//!
//! Uploads use the resumable Files API protocol: a start request opens an
//! upload session, the bytes go to the session URL in a single
//! upload-and-finalize request, and the response carries the file handle.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{AnalysisBackend, MediaStore, ModelCatalog, ReadyMedia, RemoteMedia};
use crate::error::ApiError;
use crate::model::{self, ModelInfo};

/// Production endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Request timeout in seconds, sized for multi-minute video uploads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Configuration for [`GeminiClient`].
///
/// Passed explicitly at construction; the client holds no process-global
/// credential state.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Point the client at a different endpoint (e.g. a regional mirror).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the Gemini API.
///
/// Owns its connection pool; clone-cheap handles are not needed because the
/// pipeline borrows one client for all three capabilities.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(mut config: GeminiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: RemoteMedia,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelPage {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ApiError::Status { status, detail })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{e}")))
}

/// Flatten a generation response into the model's text.
fn extract_text(response: GenerateResponse) -> Result<String, ApiError> {
    let GenerateResponse {
        candidates,
        prompt_feedback,
    } = response;

    let text = candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "model returned no candidates".to_string());
        return Err(ApiError::Decode(format!("empty response: {reason}")));
    }

    Ok(text)
}

#[async_trait]
impl MediaStore for GeminiClient {
    async fn upload(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteMedia, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        crate::verbose!("Uploading {display_name} ({} bytes)...", bytes.len());

        // Open a resumable upload session; the session URL comes back in a header.
        let start = self
            .client
            .post(self.url("upload/v1beta/files"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len() as u64)
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = ensure_success(start).await?;

        let session_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::UploadSession("service did not return an upload session URL".to_string())
            })?;

        let finalize = self
            .client
            .post(session_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(bytes)
            .send()
            .await?;

        let envelope: FileEnvelope = read_json(finalize).await?;
        crate::verbose!(
            "Upload accepted as {} (state {:?})",
            envelope.file.name,
            envelope.file.state
        );
        Ok(envelope.file)
    }

    async fn get(&self, name: &str) -> Result<RemoteMedia, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("v1beta/{name}")))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("v1beta/{name}")))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisBackend for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        media: &ReadyMedia,
        instructions: &str,
    ) -> Result<String, ApiError> {
        let uri = media
            .uri()
            .ok_or_else(|| ApiError::Decode("file handle is missing its uri".to_string()))?;

        let mut file_data = json!({ "fileUri": uri });
        if let Some(mime) = media.mime_type() {
            file_data["mimeType"] = mime.into();
        }

        // The video part leads so the instructions refer to it.
        let body = json!({
            "contents": [{
                "parts": [
                    { "fileData": file_data },
                    { "text": instructions }
                ]
            }]
        });

        let endpoint = format!("v1beta/{}:generateContent", model::qualified(model));
        let response = self
            .client
            .post(self.url(&endpoint))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: GenerateResponse = read_json(response).await?;
        extract_text(parsed)
    }
}

#[async_trait]
impl ModelCatalog for GeminiClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.url("v1beta/models"))
                .header(API_KEY_HEADER, &self.config.api_key)
                .query(&[("pageSize", "50")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ModelPage = read_json(request.send().await?).await?;
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MediaState;

    #[test]
    fn test_upload_response_decodes_file_envelope() {
        let raw = r#"{
            "file": {
                "name": "files/abc123",
                "displayName": "rally.mp4",
                "mimeType": "video/mp4",
                "sizeBytes": "2097152",
                "createTime": "2024-05-01T12:00:00Z",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
                "state": "PROCESSING"
            }
        }"#;
        let envelope: FileEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.file.name, "files/abc123");
        assert_eq!(envelope.file.state, MediaState::Processing);
        assert_eq!(envelope.file.size_bytes.as_deref(), Some("2097152"));
    }

    #[test]
    fn test_model_page_decodes_pagination_token() {
        let raw = r#"{
            "models": [
                {
                    "name": "models/gemini-1.5-flash",
                    "displayName": "Gemini 1.5 Flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {
                    "name": "models/embedding-001",
                    "supportedGenerationMethods": ["embedContent"]
                }
            ],
            "nextPageToken": "page-two"
        }"#;
        let page: ModelPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.models.len(), 2);
        assert!(page.models[0].supports_generation());
        assert!(!page.models[1].supports_generation());
        assert_eq!(page.next_page_token.as_deref(), Some("page-two"));
    }

    #[test]
    fn test_extract_text_joins_candidate_parts() {
        let raw = r###"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "## Forehand\n"},
                        {"text": "Solid contact point."}
                    ]
                }
            }]
        }"###;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = extract_text(response).unwrap();
        assert_eq!(text, "## Forehand\nSolid contact point.");
    }

    #[test]
    fn test_extract_text_reports_block_reason() {
        let raw = r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_text_handles_missing_candidates() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let client = GeminiClient::new(
            GeminiConfig::new("test-key").with_base_url("http://localhost:8080/"),
        )
        .unwrap();
        assert_eq!(client.url("v1beta/models"), "http://localhost:8080/v1beta/models");
    }
}
