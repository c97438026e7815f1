//! Structured Generation Client
//!
//! Typed wrapper over the proxy's `POST /generate` endpoint. The rest of an
//! application calls this instead of speaking the `{action, payload}`
//! protocol itself.
//!
//! ## Example
//!
//! ```rust,ignore
//! use assistive_gateway::catalog::{CatalogKind, DisabilityCategory};
//! use assistive_gateway::client::GenerationClient;
//!
//! let client = GenerationClient::new("http://127.0.0.1:3000/generate")?;
//! let mut devices = client
//!     .fetch_catalog(DisabilityCategory::Auditiva, CatalogKind::Devices)
//!     .await?;
//! client.attach_images(&mut devices).await;
//! ```

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::catalog::{CatalogKind, CatalogRecord, DisabilityCategory};
use crate::normalize::normalize_catalog;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::schema::SchemaDescriptor;

/// Error surfaced to the caller of the client.
///
/// `code` is the HTTP status of the proxy response, or `0` when the proxy
/// could not be reached. `message` is meant to be shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ClientError {
    /// HTTP status, `0` for transport failures
    pub code: u16,
    /// Human-readable message
    pub message: String,
    /// Underlying error message, when `message` is a user-facing rewrite
    pub detail: Option<String>,
    /// Raw model output for undecodable responses
    pub raw: Option<String>,
}

impl ClientError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            raw: None,
        }
    }

    fn transport(err: reqwest::Error) -> Self {
        Self::new(0, format!("No se pudo contactar con el servidor: {err}"))
    }

    /// Transport failures, throttling and gateway errors.
    pub const fn is_retryable(&self) -> bool {
        matches!(self.code, 0 | 429 | 502 | 503 | 504)
    }

    /// Replace the message with a user-facing one, keeping the original as `detail`.
    fn with_user_message(mut self, message: impl Into<String>) -> Self {
        let original = std::mem::replace(&mut self.message, message.into());
        self.detail.get_or_insert(original);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    raw: Option<String>,
}

/// Client for the generation proxy.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http_client: HttpClient,
    endpoint: String,
    retry: RetryExecutor,
}

impl GenerationClient {
    /// Client for the proxy at `endpoint` (the full `/generate` URL).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::new(0, format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::with_http_client(endpoint, http_client))
    }

    /// Client using a caller-provided HTTP client.
    pub fn with_http_client(endpoint: impl Into<String>, http_client: HttpClient) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            retry: RetryExecutor::new(RetryPolicy::default()),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryExecutor::new(policy);
        self
    }

    /// Send one `{action, payload}` request, retrying transient failures.
    pub async fn call(&self, action: &str, payload: Value) -> Result<Value, ClientError> {
        self.retry
            .execute(|| self.call_once(action, &payload))
            .await
    }

    async fn call_once(&self, action: &str, payload: &Value) -> Result<Value, ClientError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "action": action, "payload": payload }))
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.json::<ErrorResponse>().await.ok();
            let (message, raw) = match body {
                Some(ErrorResponse { error, raw }) => (
                    error.unwrap_or_else(|| format!("API request failed with status {code}")),
                    raw,
                ),
                None => (format!("API request failed with status {code}"), None),
            };
            return Err(ClientError {
                code,
                message,
                detail: None,
                raw,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            ClientError::new(status.as_u16(), format!("Invalid response from server: {e}"))
        })
    }

    /// Liveness check against the proxy.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.call("ping", json!({})).await.map(|_| ())
    }

    /// Free-form text for `prompt`.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, ClientError> {
        let value = self.call("generateText", json!({ "prompt": prompt })).await?;
        match value.get("text") {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(ClientError::new(200, "Response did not contain text")),
        }
    }

    /// JSON value shaped after `schema`. Accepts both `{data: …}` and bare
    /// response envelopes.
    pub async fn generate_structured(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Value, ClientError> {
        let value = self
            .call(
                "generateStructured",
                json!({ "prompt": prompt, "schema": schema }),
            )
            .await?;
        Ok(unwrap_envelope(value))
    }

    /// Catalog records of `kind` for `category`.
    ///
    /// Records with missing fields are coerced, never dropped. When the
    /// response decoded but holds no list at all, an empty list is returned.
    pub async fn fetch_catalog(
        &self,
        category: DisabilityCategory,
        kind: CatalogKind,
    ) -> Result<Vec<CatalogRecord>, ClientError> {
        let prompt = kind.prompt(category);
        let value = self
            .generate_structured(&prompt, &kind.envelope_schema())
            .await
            .map_err(|e| {
                tracing::error!(%category, %kind, "catalog fetch failed: {}", e);
                e.with_user_message(user_message(kind))
            })?;

        match normalize_catalog(&value, kind) {
            Some(records) => Ok(records),
            None => {
                tracing::warn!(%category, %kind, "no list found in structured response");
                Ok(Vec::new())
            }
        }
    }

    /// Illustrative image for `term` as a `data:` URL, or `""` when none
    /// could be produced. Never fails.
    pub async fn generate_image_for_term(&self, term: &str) -> String {
        match self
            .call("generateImageForTerm", json!({ "term": term }))
            .await
        {
            Ok(value) => value
                .get("imageUrl")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                tracing::warn!("Error generating image for term {:?}: {}", term, e);
                String::new()
            }
        }
    }

    /// Fill `image_url` of every record that has none.
    ///
    /// Requests go out one at a time, each awaited before the next, to stay
    /// under the provider's rate limit.
    pub async fn attach_images(&self, records: &mut [CatalogRecord]) {
        for record in records.iter_mut() {
            if !record.image_url().is_empty() {
                continue;
            }
            let term = record.nombre().to_string();
            let url = self.generate_image_for_term(&term).await;
            record.set_image_url(url);
        }
    }
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("data") => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn user_message(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Devices => {
            "No se pudieron obtener los datos de los dispositivos. Por favor, inténtelo de nuevo más tarde."
        }
        CatalogKind::Functionalities => {
            "No se pudieron obtener los datos de las funcionalidades. Por favor, inténtelo de nuevo más tarde."
        }
    }
}
