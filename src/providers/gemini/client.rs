//! Gemini Client Implementation
//!
//! `generateContent` for text and structured output, Imagen `predict` for
//! illustrative images.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::GatewayError;
use crate::providers::{GeneratedImage, GenerationRequest, GenerativeProvider};

use super::types::{
    Content, GeminiConfig, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleErrorEnvelope, OutputOptions, PredictInstance, PredictParameters, PredictRequest,
    PredictResponse,
};

/// Gemini client that implements [`GenerativeProvider`]
pub struct GeminiClient {
    /// HTTP client for making requests
    http_client: HttpClient,
    /// Gemini configuration
    config: GeminiConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("image_model", &self.config.image_model)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new Gemini client with the given configuration
    ///
    /// Fails with `ServerMisconfigured` when the API key is empty.
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(GatewayError::ServerMisconfigured(
                "API_KEY is not set".to_string(),
            ));
        }
        let timeout = Duration::from_secs(config.timeout.unwrap_or(30));

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                GatewayError::ServerMisconfigured(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self::with_http_client(config, http_client))
    }

    /// Create a new Gemini client with a custom HTTP client
    pub fn with_http_client(config: GeminiConfig, http_client: HttpClient) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Build the `generateContent` body for `request`.
    pub fn build_request_body(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let generation_config = request.response_schema.as_ref().map(|schema| GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema.as_value().clone()),
        });
        GenerateContentRequest {
            contents: vec![Content::user_text(request.prompt.clone())],
            generation_config,
        }
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    /// `Content-Type: application/json` plus `x-goog-api-key` when a key is set.
    fn headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = self.config.api_key.expose_secret();
        if !key.is_empty() {
            let mut value = HeaderValue::from_str(key).map_err(|_| {
                GatewayError::ServerMisconfigured("API key contains invalid characters".into())
            })?;
            value.set_sensitive(true);
            headers.insert("x-goog-api-key", value);
        }
        Ok(headers)
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamNetwork(format!("POST {url}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::UpstreamNetwork(format!("Reading provider body: {e}")))?;

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| GatewayError::UpstreamProvider {
            status: status.as_u16(),
            message: format!("Malformed provider response: {e}"),
            details: Some(serde_json::Value::String(text)),
        })
    }
}

/// Translate a non-2xx provider answer into `UpstreamProvider`, echoing the
/// provider's own message when the body follows the Google error envelope.
fn provider_error(status: u16, body: &str) -> GatewayError {
    let details = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = serde_json::from_str::<GoogleErrorEnvelope>(body)
        .map(|env| match env.error.status {
            Some(code) => format!("{code}: {}", env.error.message),
            None => env.error.message,
        })
        .unwrap_or_else(|_| body.chars().take(500).collect());
    tracing::warn!("Gemini returned {}: {}", status, message);
    GatewayError::UpstreamProvider {
        status,
        message,
        details: details.or_else(|| Some(serde_json::Value::String(body.to_string()))),
    }
}

/// Finish reasons under which a candidate carries no usable answer.
fn is_blocking_finish(reason: &str) -> bool {
    matches!(
        reason,
        "SAFETY"
            | "RECITATION"
            | "BLOCKLIST"
            | "PROHIBITED_CONTENT"
            | "SPII"
            | "IMAGE_SAFETY"
            | "MALFORMED_FUNCTION_CALL"
    )
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn supports_response_schema(&self) -> bool {
        true
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        let url = self.url(&self.config.model, "generateContent");
        let body = self.build_request_body(&request);
        tracing::debug!(
            model = %self.config.model,
            structured = request.response_schema.is_some(),
            prompt_len = request.prompt.len(),
            "gemini generateContent"
        );

        let response: GenerateContentResponse = self.post_json(&url, &body).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GatewayError::UpstreamProvider {
                status: 200,
                message: format!("Prompt blocked by provider: {reason}"),
                details: serde_json::to_value(&response.prompt_feedback).ok(),
            });
        }

        let finish_reason = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone());
        match response.text() {
            Some(text) if !finish_reason.as_deref().is_some_and(is_blocking_finish) => Ok(text),
            _ => Err(GatewayError::UpstreamProvider {
                status: 200,
                message: format!(
                    "No content returned by provider (finishReason: {})",
                    finish_reason.as_deref().unwrap_or("none")
                ),
                details: serde_json::to_value(&response.candidates).ok(),
            }),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, GatewayError> {
        let url = self.url(&self.config.image_model, "predict");
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "4:3".to_string(),
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        };
        tracing::debug!(model = %self.config.image_model, "imagen predict");

        let response: PredictResponse = self.post_json(&url, &body).await?;
        let image = response.predictions.into_iter().find_map(|p| {
            let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
            Some(GeneratedImage {
                mime_type: p.mime_type.unwrap_or_else(|| "image/jpeg".to_string()),
                base64_data: data,
            })
        });
        Ok(image)
    }
}
