//! Generative model providers
//!
//! The proxy talks to the outside world only through [`GenerativeProvider`].
//! The production implementation is [`gemini::GeminiClient`]; tests plug in
//! scripted providers.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::schema::SchemaDescriptor;

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

/// One text generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Natural-language instruction
    pub prompt: String,
    /// Output shape the provider should enforce, if it can
    pub response_schema: Option<SchemaDescriptor>,
}

impl GenerationRequest {
    /// Free-form text request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    /// JSON request constrained by `schema`.
    pub fn structured(prompt: impl Into<String>, schema: SchemaDescriptor) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }
}

/// An image returned by a provider, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub base64_data: String,
}

impl GeneratedImage {
    /// `data:` URL usable directly as an image source.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

/// A generative model backend.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Short provider identifier used in logs.
    fn provider_name(&self) -> &'static str;

    /// Whether `GenerationRequest::response_schema` is enforced natively.
    /// When false, callers embed the schema into the prompt instead.
    fn supports_response_schema(&self) -> bool {
        false
    }

    /// Generate text for `request` and return it verbatim.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError>;

    /// Generate one illustrative image; `Ok(None)` when the provider produced none.
    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, GatewayError> {
        let _ = prompt;
        Ok(None)
    }
}
