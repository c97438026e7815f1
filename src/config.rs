//! Gateway configuration
//!
//! Settings are read once at startup. [`GatewayConfig::from_lookup`] takes any
//! `key -> value` function so configurations can be built in tests without
//! touching the process environment.

use std::net::SocketAddr;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use validator::Validate;

use crate::error::ConfigError;
use crate::providers::GeminiConfig;
use crate::providers::gemini::types::{DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_MODEL};
use crate::telemetry::{OutputFormat, SubscriberConfig, parse_level};

/// Credential variables, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process-wide settings for the gateway binary.
#[derive(Debug, Validate)]
pub struct GatewayConfig {
    /// Provider credential; never logged
    pub api_key: SecretString,
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(length(min = 1))]
    pub image_model: String,
    /// Upstream HTTP timeout
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
    /// Listen address
    pub bind: SocketAddr,
    pub log_level: tracing::Level,
    pub log_format: OutputFormat,
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|&key| get(key))
            .ok_or_else(|| ConfigError::Missing(API_KEY_VARS.join(" or ")))?;

        let timeout_secs = match get("GATEWAY_TIMEOUT_SECS") {
            Some(raw) => parse_var("GATEWAY_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let bind = parse_var(
            "GATEWAY_BIND",
            &get("GATEWAY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        )?;
        let log_level = match get("GATEWAY_LOG") {
            Some(raw) => parse_level(&raw).map_err(|e| invalid("GATEWAY_LOG", e))?,
            None => tracing::Level::INFO,
        };
        let log_format = match get("GATEWAY_LOG_FORMAT") {
            Some(raw) => OutputFormat::from_str(&raw).map_err(|e| invalid("GATEWAY_LOG_FORMAT", e))?,
            None => OutputFormat::Text,
        };

        let config = Self {
            api_key: SecretString::from(api_key),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            image_model: get("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            timeout_secs,
            bind,
            log_level,
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    /// Provider configuration derived from these settings.
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig::new(self.api_key.expose_secret())
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_image_model(&self.image_model)
            .with_timeout(self.timeout_secs)
    }

    /// Tracing subscriber settings.
    pub fn subscriber_config(&self) -> SubscriberConfig {
        SubscriberConfig::builder()
            .log_level(self.log_level)
            .output_format(self.log_format)
            .build()
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| invalid(key, e))
}

fn invalid(key: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
