//! Client for the slider store API.
//!
//! The store is an external collaborator reached over REST. Every response
//! uses the envelope `{ "success": bool, "data": ..., "error": { "code", "message" } }`.

use crate::config::Config;
use crate::i18n::{LanguageConfig, TrackSet};
use crate::retry::{with_retry_if, RetryConfig};
use crate::slider::{SliderPatch, SliderPayload, WireSlider};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a failure status or `success: false`
    #[error("Store API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The entry changed since it was read (version mismatch)
    #[error("Conflicting change: {0}")]
    Conflict(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response did not match the envelope contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether repeating the same read could succeed (network, 5xx, 429).
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(_) => true,
            StoreError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary for slider entries and language configuration.
#[async_trait]
pub trait SliderStore: Send + Sync {
    /// Read the whole collection.
    async fn list_sliders(&self) -> StoreResult<Vec<WireSlider>>;

    async fn create_slider(&self, payload: &SliderPayload) -> StoreResult<WireSlider>;

    /// Replace every field of an entry.
    async fn update_slider(&self, id: &str, payload: &SliderPayload) -> StoreResult<WireSlider>;

    /// Update only the fields present in the patch.
    async fn patch_slider(&self, id: &str, patch: &SliderPatch) -> StoreResult<WireSlider>;

    async fn delete_slider(&self, id: &str) -> StoreResult<()>;

    /// Read the active-languages configuration.
    async fn list_languages(&self) -> StoreResult<Vec<LanguageConfig>>;
}

#[async_trait]
impl<S: SliderStore + ?Sized> SliderStore for Arc<S> {
    async fn list_sliders(&self) -> StoreResult<Vec<WireSlider>> {
        (**self).list_sliders().await
    }

    async fn create_slider(&self, payload: &SliderPayload) -> StoreResult<WireSlider> {
        (**self).create_slider(payload).await
    }

    async fn update_slider(&self, id: &str, payload: &SliderPayload) -> StoreResult<WireSlider> {
        (**self).update_slider(id, payload).await
    }

    async fn patch_slider(&self, id: &str, patch: &SliderPatch) -> StoreResult<WireSlider> {
        (**self).patch_slider(id, patch).await
    }

    async fn delete_slider(&self, id: &str) -> StoreResult<()> {
        (**self).delete_slider(id).await
    }

    async fn list_languages(&self) -> StoreResult<Vec<LanguageConfig>> {
        (**self).list_languages().await
    }
}

/// Fetch the language configuration and build the active track set.
pub async fn fetch_tracks<S: SliderStore + ?Sized>(store: &S) -> anyhow::Result<TrackSet> {
    let languages = store
        .list_languages()
        .await
        .context("Failed to fetch active languages")?;
    let tracks = TrackSet::from_configs(&languages).context("Invalid language configuration")?;

    info!(
        "Active languages: {} (default: {})",
        tracks.codes().collect::<Vec<_>>().join(", "),
        tracks.default_track()
    );
    Ok(tracks)
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_true")]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

fn default_true() -> bool {
    true
}

/// `SliderStore` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    read_retry: RetryConfig,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            read_retry: RetryConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut store = Self::new(&config.api_url)
            .with_read_retry(RetryConfig::store_read(config.read_retry_attempts));
        store.api_key = config.api_key.clone();
        store
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_read_retry(mut self, retry: RetryConfig) -> Self {
        self.read_retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn slider_url(&self, id: &str) -> String {
        self.url(&format!("/sliders/{}", id))
    }

    /// Send a request and unwrap the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> StoreResult<Option<T>> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("{}: HTTP {}", what, status);

        let envelope: Option<Envelope<T>> = if body.trim().is_empty() {
            None
        } else {
            match serde_json::from_str(&body) {
                Ok(envelope) => Some(envelope),
                Err(e) if status.is_success() => return Err(StoreError::Serialization(e)),
                Err(_) => None,
            }
        };

        let (success, data, error) = match envelope {
            Some(envelope) => (envelope.success, envelope.data, envelope.error),
            None => (true, None, None),
        };

        if status.is_success() && success {
            return Ok(data);
        }

        let (code, message) = match error {
            Some(error) => (error.code, error.message),
            None => (None, status.canonical_reason().unwrap_or("").to_string()),
        };

        Err(match status {
            StatusCode::CONFLICT => StoreError::Conflict(format!("{}: {}", what, message)),
            StatusCode::NOT_FOUND => StoreError::NotFound(what.to_string()),
            _ => StoreError::Api {
                status: status.as_u16(),
                code,
                message,
            },
        })
    }

    async fn read<T: DeserializeOwned>(&self, path: &str, what: &str) -> StoreResult<T> {
        with_retry_if(
            &self.read_retry,
            what,
            move || async move {
                self.execute::<T>(self.client.get(self.url(path)), what)
                    .await?
                    .ok_or_else(|| StoreError::InvalidResponse(format!("{}: missing data", what)))
            },
            StoreError::is_transient,
        )
        .await
    }

    async fn write(&self, request: RequestBuilder, what: &str) -> StoreResult<WireSlider> {
        self.execute::<WireSlider>(request, what)
            .await?
            .ok_or_else(|| StoreError::InvalidResponse(format!("{}: missing data", what)))
    }
}

#[async_trait]
impl SliderStore for HttpStore {
    async fn list_sliders(&self) -> StoreResult<Vec<WireSlider>> {
        self.read("/sliders", "List sliders").await
    }

    async fn create_slider(&self, payload: &SliderPayload) -> StoreResult<WireSlider> {
        let request = self.client.post(self.url("/sliders")).json(payload);
        self.write(request, "Create slider").await
    }

    async fn update_slider(&self, id: &str, payload: &SliderPayload) -> StoreResult<WireSlider> {
        let request = self.client.put(self.slider_url(id)).json(payload);
        self.write(request, &format!("Update slider {}", id)).await
    }

    async fn patch_slider(&self, id: &str, patch: &SliderPatch) -> StoreResult<WireSlider> {
        let request = self.client.patch(self.slider_url(id)).json(patch);
        self.write(request, &format!("Patch slider {}", id)).await
    }

    async fn delete_slider(&self, id: &str) -> StoreResult<()> {
        let request = self.client.delete(self.slider_url(id));
        self.execute::<serde_json::Value>(request, &format!("Delete slider {}", id))
            .await?;
        Ok(())
    }

    async fn list_languages(&self) -> StoreResult<Vec<LanguageConfig>> {
        self.read("/languages", "List languages").await
    }
}
