use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::Settings;

/// Fallback key variable checked when the configured one is unset.
pub const SECONDARY_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Errors from a generative backend. The dispatcher absorbs all of them.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("backend call failed: {0}")]
    Failure(String),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("backend returned no usable hits")]
    EmptyResult,
}

/// Whether a backend can serve requests, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCapability {
    Available { name: String },
    Unavailable { reason: String },
}

impl BackendCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

impl fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available { name } => write!(f, "{} (available)", name),
            Self::Unavailable { reason } => write!(f, "unavailable: {}", reason),
        }
    }
}

/// Request handed to a generative backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub prompt: String,
    /// Sampling temperature, 0.0-1.0.
    pub temperature: f32,
}

/// A text-in, text-out generative model.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    fn capability(&self) -> BackendCapability;

    /// Raw model output for the prompt.
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError>;
}

/// Stand-in used when no generative backend can run.
#[derive(Debug, Clone)]
pub struct NullBackend {
    reason: String,
}

impl NullBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for NullBackend {
    fn capability(&self) -> BackendCapability {
        BackendCapability::Unavailable {
            reason: self.reason.clone(),
        }
    }

    async fn complete(&self, _request: &BackendRequest) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(self.reason.clone()))
    }
}

/// Look up the API key, trying the configured variable first.
pub fn api_key_from_env(settings: &Settings) -> Result<String, BackendError> {
    [settings.api_key_env.as_str(), SECONDARY_API_KEY_ENV]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| BackendError::MissingCredential(settings.api_key_env.clone()))
}

/// Pick the generative backend for this process.
pub fn resolve_backend(settings: &Settings) -> Arc<dyn GenerativeBackend> {
    let backend = build_backend(settings);
    log::info!("Generative backend: {}", backend.capability());
    backend
}

#[cfg(feature = "gemini")]
fn build_backend(settings: &Settings) -> Arc<dyn GenerativeBackend> {
    match api_key_from_env(settings) {
        Ok(api_key) => match super::gemini::GeminiBackend::new(api_key, settings.gemini_model.clone()) {
            Ok(backend) => Arc::new(backend),
            Err(e) => Arc::new(NullBackend::new(e.to_string())),
        },
        Err(e) => Arc::new(NullBackend::new(e.to_string())),
    }
}

#[cfg(not(feature = "gemini"))]
fn build_backend(_settings: &Settings) -> Arc<dyn GenerativeBackend> {
    Arc::new(NullBackend::new(
        "built without the `gemini` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_backend_is_unavailable() {
        let backend = NullBackend::new("not configured");
        assert!(!backend.capability().is_available());

        let request = BackendRequest {
            prompt: "anything".to_string(),
            temperature: 0.7,
        };
        let result = backend.complete(&request).await;
        assert!(matches!(result, Err(BackendError::Unavailable(reason)) if reason == "not configured"));
    }

    #[test]
    fn test_missing_credential() {
        let settings = Settings {
            api_key_env: "CHULOOPA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Settings::default()
        };
        if std::env::var(SECONDARY_API_KEY_ENV).is_err() {
            assert!(matches!(
                api_key_from_env(&settings),
                Err(BackendError::MissingCredential(_))
            ));
        }
    }

    #[test]
    fn test_capability_display() {
        let available = BackendCapability::Available {
            name: "gemini".to_string(),
        };
        assert_eq!(available.to_string(), "gemini (available)");
        assert!(available.is_available());
    }
}
