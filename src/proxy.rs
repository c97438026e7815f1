//! Generation Proxy
//!
//! Dispatches `{action, payload}` requests to a [`GenerativeProvider`] and
//! shapes the success envelopes. HTTP concerns (method, status codes) live in
//! [`crate::server`]; everything here works on `serde_json::Value`.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::Instrument;

use crate::catalog::{CatalogKind, DisabilityCategory, image_prompt};
use crate::decode::decode_structured;
use crate::error::GatewayError;
use crate::providers::{GeminiClient, GeminiConfig, GenerationRequest, GenerativeProvider};
use crate::schema::SchemaDescriptor;

/// A validated proxy request.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    GenerateText {
        prompt: String,
    },
    GenerateStructured {
        prompt: String,
        schema: SchemaDescriptor,
    },
    /// Legacy catalog actions; the schema is always the server-side one.
    FetchCatalog {
        kind: CatalogKind,
        prompt: String,
    },
    GenerateImageForTerm {
        term: String,
    },
    Ping,
}

impl Action {
    /// Wire name of the action.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GenerateText { .. } => "generateText",
            Self::GenerateStructured { .. } => "generateStructured",
            Self::FetchCatalog { kind, .. } => kind.legacy_action(),
            Self::GenerateImageForTerm { .. } => "generateImageForTerm",
            Self::Ping => "ping",
        }
    }

    /// Validate a request body.
    ///
    /// Checks run in order: `action` present, `action` known, payload fields
    /// present. The first failing check decides the error.
    pub fn from_body(body: &Value) -> Result<Self, GatewayError> {
        let obj = body
            .as_object()
            .ok_or_else(|| GatewayError::BadRequest("Request body must be a JSON object".into()))?;
        let action = match obj.get("action") {
            Some(Value::String(s)) if !s.is_empty() => s.as_str(),
            _ => return Err(GatewayError::BadRequest("Missing 'action' in request body".into())),
        };
        let empty = Map::new();
        let payload = obj
            .get("payload")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        match action {
            "generateText" => Ok(Self::GenerateText {
                prompt: required_str(payload, action, "prompt")?,
            }),
            "generateStructured" => {
                let prompt = required_str(payload, action, "prompt")?;
                let schema = match payload.get("schema") {
                    Some(v @ Value::Object(_)) => SchemaDescriptor::from_value(v.clone()),
                    _ => return Err(GatewayError::missing_field(action, "schema")),
                };
                Ok(Self::GenerateStructured { prompt, schema })
            }
            "fetchAssistiveDevices" => Self::catalog(CatalogKind::Devices, payload),
            "fetchAssistiveFunctionalities" => {
                Self::catalog(CatalogKind::Functionalities, payload)
            }
            "generateImageForTerm" => Ok(Self::GenerateImageForTerm {
                term: required_str(payload, action, "term")?,
            }),
            "ping" => Ok(Self::Ping),
            other => Err(GatewayError::unknown_action(other)),
        }
    }

    fn catalog(kind: CatalogKind, payload: &Map<String, Value>) -> Result<Self, GatewayError> {
        let action = kind.legacy_action();
        if let Ok(prompt) = required_str(payload, action, "prompt") {
            return Ok(Self::FetchCatalog { kind, prompt });
        }
        match payload.get("category").and_then(Value::as_str) {
            Some(raw) => {
                let category = raw
                    .parse::<DisabilityCategory>()
                    .map_err(|e| GatewayError::BadRequest(e.to_string()))?;
                Ok(Self::FetchCatalog {
                    kind,
                    prompt: kind.prompt(category),
                })
            }
            None => Err(GatewayError::missing_field(action, "prompt")),
        }
    }
}

fn required_str(
    payload: &Map<String, Value>,
    action: &str,
    field: &str,
) -> Result<String, GatewayError> {
    match payload.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(GatewayError::missing_field(action, field)),
    }
}

/// The server-side half of the bridge: owns the provider, never the HTTP layer.
#[derive(Clone)]
pub struct GenerationProxy {
    provider: Arc<dyn GenerativeProvider>,
}

impl std::fmt::Debug for GenerationProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationProxy")
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

impl GenerationProxy {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self { provider }
    }

    /// Proxy backed by Gemini.
    pub fn gemini(config: GeminiConfig) -> Result<Self, GatewayError> {
        Ok(Self::new(Arc::new(GeminiClient::new(config)?)))
    }

    /// Validate `body` and run it.
    pub async fn handle_body(&self, body: &Value) -> Result<Value, GatewayError> {
        let action = Action::from_body(body)?;
        self.handle(action).await
    }

    /// Run one action and return its success envelope.
    pub async fn handle(&self, action: Action) -> Result<Value, GatewayError> {
        let span = tracing::info_span!(
            "generate",
            request_id = %uuid::Uuid::new_v4(),
            action = action.name(),
            provider = self.provider.provider_name()
        );
        async move {
            let result = self.dispatch(action).await;
            match &result {
                Ok(_) => tracing::debug!("request completed"),
                Err(e) => tracing::debug!(status = e.status_code(), "request failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, action: Action) -> Result<Value, GatewayError> {
        match action {
            Action::Ping => Ok(json!({ "status": "ok" })),
            Action::GenerateText { prompt } => {
                let text = self.provider.generate(GenerationRequest::text(prompt)).await?;
                Ok(json!({ "text": text }))
            }
            Action::GenerateStructured { prompt, schema } => {
                let data = self.generate_structured(prompt, schema).await?;
                Ok(json!({ "data": data }))
            }
            Action::FetchCatalog { kind, prompt } => {
                let data = self.generate_structured(prompt, kind.envelope_schema()).await?;
                Ok(json!({ "data": data }))
            }
            Action::GenerateImageForTerm { term } => {
                let image = self.provider.generate_image(&image_prompt(&term)).await?;
                let url = image.map(|i| i.data_url()).unwrap_or_default();
                if url.is_empty() {
                    tracing::warn!(term = %term, "provider returned no image");
                }
                Ok(json!({ "imageUrl": url }))
            }
        }
    }

    /// Structured extraction: schema constraint (or prompt hint), then decode.
    pub async fn generate_structured(
        &self,
        prompt: String,
        schema: SchemaDescriptor,
    ) -> Result<Value, GatewayError> {
        let request = if self.provider.supports_response_schema() {
            GenerationRequest::structured(prompt, schema)
        } else {
            GenerationRequest::text(format!("{prompt}{}", schema.as_prompt_hint()))
        };
        let raw = self.provider.generate(request).await?;
        tracing::debug!(len = raw.len(), "received structured output");
        decode_structured(&raw).into_result()
    }
}
