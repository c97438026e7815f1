//! Structured output decoding.
//!
//! Turns the raw text a model returned into a JSON value, tolerating the two
//! artifacts providers add even when asked not to: markdown code fences and
//! prose around the JSON object. The ladder is:
//!
//! 1. strip surrounding code fences (with an optional language tag line)
//! 2. strict JSON parse of the cleaned text
//! 3. slice from the first `{` to the last `}` and parse that
//! 4. give up with [`GenerationResult::Failed`], carrying the raw text
//!
//! Nothing in here performs I/O; the proxy and the tests call it directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// Why a piece of model output could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The provider returned no text at all.
    EmptyOutput,
    /// No `{ ... }` region exists in the text.
    NoJsonFound,
    /// A `{ ... }` region exists but is not valid JSON.
    InvalidJson,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EmptyOutput => "empty output",
            Self::NoJsonFound => "no JSON object found",
            Self::InvalidJson => "invalid JSON",
        };
        f.write_str(s)
    }
}

/// Outcome of decoding one model response.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    /// The text decoded into a JSON value.
    Decoded(Value),
    /// The text could not be decoded; `raw` is the untouched provider text.
    Failed {
        /// Which step gave up
        kind: FailureKind,
        /// Provider text as received
        raw: String,
    },
}

impl GenerationResult {
    /// Returns true for [`GenerationResult::Decoded`].
    pub const fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    /// Convert into a `Result`, mapping failures to `NonDecodableOutput`.
    pub fn into_result(self) -> Result<Value, GatewayError> {
        match self {
            Self::Decoded(v) => Ok(v),
            Self::Failed { kind, raw } => Err(GatewayError::NonDecodableOutput { kind, raw }),
        }
    }
}

/// Run the full decode ladder over raw model text.
pub fn decode_structured(raw: &str) -> GenerationResult {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return GenerationResult::Failed {
            kind: FailureKind::EmptyOutput,
            raw: raw.to_string(),
        };
    }

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return GenerationResult::Decoded(value);
    }

    let Some(slice) = extract_brace_slice(cleaned) else {
        tracing::debug!("No JSON object in model output ({} bytes)", raw.len());
        return GenerationResult::Failed {
            kind: FailureKind::NoJsonFound,
            raw: raw.to_string(),
        };
    };

    match serde_json::from_str::<Value>(slice) {
        Ok(value) => {
            tracing::warn!(
                "Recovered JSON object from surrounding prose ({} of {} bytes kept)",
                slice.len(),
                raw.len()
            );
            GenerationResult::Decoded(value)
        }
        Err(e) => {
            tracing::debug!("Brace-slice recovery failed: {}", e);
            GenerationResult::Failed {
                kind: FailureKind::InvalidJson,
                raw: raw.to_string(),
            }
        }
    }
}

/// Remove a leading ```` ``` ```` fence (and its language tag line) and a
/// trailing ```` ``` ```` fence. Text without fences is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            // one-line fence: ```json{...}```
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Slice from the first `{` to the last `}` (inclusive), if both exist in
/// that order.
pub fn extract_brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}
