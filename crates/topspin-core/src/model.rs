//! Model catalog types and selection strategies.
//!
//! Which model analyzes a video is a pluggable decision: callers either pin
//! a model explicitly ([`Fixed`]) or let a strategy choose from the live
//! catalog ([`NamePreference`]). Catalog failures never abort an analysis,
//! the strategy's fallback is used instead.

use serde::Deserialize;

use crate::provider::ModelCatalog;

/// Model used when the catalog is unavailable or no strategy matches.
pub const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";

/// One model as reported by the service catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Fully-qualified resource name, e.g. "models/gemini-1.5-flash"
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// API methods the model supports, e.g. "generateContent"
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Whether the model can serve generateContent requests.
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }

    /// Short identifier without the "models/" prefix.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }
}

/// Strategy that picks the analysis model from the live catalog.
pub trait ModelSelector: Send + Sync {
    /// Choose a model, or None if nothing in the catalog is suitable.
    fn pick(&self, models: &[ModelInfo]) -> Option<String>;
}

/// Picks the first generation-capable model whose name contains `needle`,
/// falling back to `fallback` when none matches.
#[derive(Debug, Clone)]
pub struct NamePreference {
    pub needle: String,
    pub fallback: String,
}

impl Default for NamePreference {
    fn default() -> Self {
        Self {
            needle: "flash".to_string(),
            fallback: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelSelector for NamePreference {
    fn pick(&self, models: &[ModelInfo]) -> Option<String> {
        models
            .iter()
            .filter(|m| m.supports_generation())
            .find(|m| m.name.contains(&self.needle))
            .map(|m| m.name.clone())
            .or_else(|| Some(self.fallback.clone()))
    }
}

/// Always picks the given model, ignoring the catalog.
#[derive(Debug, Clone)]
pub struct Fixed(pub String);

impl ModelSelector for Fixed {
    fn pick(&self, _models: &[ModelInfo]) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Expand a bare model id to its resource name ("models/...").
pub fn qualified(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

/// Query the catalog and let the strategy choose.
///
/// A catalog failure is logged and treated as an empty catalog, so strategies
/// with a fallback still produce an answer and the analysis can proceed.
pub async fn resolve_model(catalog: &dyn ModelCatalog, selector: &dyn ModelSelector) -> String {
    let models = match catalog.list_models().await {
        Ok(models) => models,
        Err(e) => {
            crate::verbose!("model listing failed, using fallback: {e}");
            Vec::new()
        }
    };

    selector
        .pick(&models)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            display_name: None,
            description: None,
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_supports_generation() {
        assert!(model("models/gemini-1.5-pro", &["generateContent"]).supports_generation());
        assert!(!model("models/embedding-001", &["embedContent"]).supports_generation());
        assert!(!model("models/aqa", &[]).supports_generation());
    }

    #[test]
    fn test_short_name_strips_prefix() {
        assert_eq!(model("models/gemini-1.5-pro", &[]).short_name(), "gemini-1.5-pro");
        assert_eq!(model("gemini-1.5-pro", &[]).short_name(), "gemini-1.5-pro");
    }

    #[test]
    fn test_name_preference_skips_non_generating_models() {
        let models = vec![
            model("models/gemini-1.5-flash-embed", &["embedContent"]),
            model("models/gemini-1.5-flash", &["generateContent"]),
            model("models/gemini-1.5-pro", &["generateContent"]),
        ];
        let picked = NamePreference::default().pick(&models);
        assert_eq!(picked.as_deref(), Some("models/gemini-1.5-flash"));
    }

    #[test]
    fn test_name_preference_falls_back_when_no_match() {
        let models = vec![model("models/gemini-1.5-pro", &["generateContent"])];
        let picked = NamePreference::default().pick(&models);
        assert_eq!(picked.as_deref(), Some(DEFAULT_MODEL));

        assert_eq!(
            NamePreference::default().pick(&[]).as_deref(),
            Some(DEFAULT_MODEL)
        );
    }

    #[test]
    fn test_fixed_ignores_catalog() {
        let models = vec![model("models/gemini-1.5-flash", &["generateContent"])];
        let picked = Fixed("models/gemini-2.0-pro".to_string()).pick(&models);
        assert_eq!(picked.as_deref(), Some("models/gemini-2.0-pro"));
    }

    #[test]
    fn test_qualified_expands_bare_ids() {
        assert_eq!(qualified("gemini-1.5-pro"), "models/gemini-1.5-pro");
        assert_eq!(qualified("models/gemini-1.5-pro"), "models/gemini-1.5-pro");
    }

    struct FailingCatalog;

    #[async_trait]
    impl ModelCatalog for FailingCatalog {
        async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
            Err(ApiError::Decode("catalog unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_resolve_model_survives_catalog_failure() {
        let picked = resolve_model(&FailingCatalog, &NamePreference::default()).await;
        assert_eq!(picked, DEFAULT_MODEL);
    }
}
