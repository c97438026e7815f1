//! Google Gemini provider (Generative Language REST API).

mod client;
pub mod types;

pub use client::GeminiClient;
pub use types::GeminiConfig;
