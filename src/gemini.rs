//! Blocking HTTP plumbing for the Google Generative Language API.
//!
//! Shared by [`crate::embedder::gemini`] and [`crate::generator::gemini`].
//! Calls block the current thread; async callers must run them on a
//! blocking pool.
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response is not valid JSON: {0}")]
    Decode(String),
}

/// Thin wrapper over a `reqwest` blocking client bound to one API key.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client. `timeout = None` disables the per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GeminiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeminiError::Request(format!("client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Endpoint URL for `model` and `method`, e.g. `embedContent`.
    #[must_use]
    pub fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{method}", self.base_url, model_path(model))
    }

    /// POST a JSON body and return the decoded JSON response.
    pub fn post<B: Serialize + ?Sized>(
        &self,
        model: &str,
        method: &str,
        body: &B,
    ) -> Result<Value, GeminiError> {
        let url = self.endpoint(model, method);
        debug!("POST {url}");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| GeminiError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp
            .text()
            .map_err(|e| GeminiError::Request(format!("failed to read body: {e}")))?;
        serde_json::from_str(&text).map_err(|e| GeminiError::Decode(e.to_string()))
    }
}

/// Normalise a model name to its `models/...` resource path.
#[must_use]
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
