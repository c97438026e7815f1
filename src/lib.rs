//! # Assistive Gateway
//!
//! Prompt-to-structured-data bridge for an accessibility portal. Natural
//! language instructions go to a generative model and come back as typed
//! catalog records (assistive devices, software functionalities) or as
//! illustrative images.
//!
#![deny(unsafe_code)]

//! ## Components
//!
//! - **Generation Proxy** ([`proxy`], [`server`]): `POST /generate` accepting
//!   `{action, payload}`. Holds the provider credential; callers never see it.
//! - **Structured Generation Client** ([`client`]): typed wrapper over the
//!   proxy, with client-side retries for transient failures.
//! - **Catalog Record Normalizer** ([`normalize`]): turns loosely shaped model
//!   output into [`catalog::CatalogRecord`]s without dropping entries.
//!
//! Model output is decoded by one ladder ([`decode`]): strip code fences,
//! strict parse, `{`..`}` slice, then fail with the raw text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assistive_gateway::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let proxy = GenerationProxy::gemini(GeminiConfig::new("your-api-key"))?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     assistive_gateway::server::serve(listener, router(proxy)).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod providers;
pub mod proxy;
pub mod retry;
pub mod schema;
pub mod server;
pub mod telemetry;

/// Commonly used types.
pub mod prelude {
    pub use crate::catalog::{CatalogKind, CatalogRecord, DisabilityCategory, Device, Functionality};
    pub use crate::client::{ClientError, GenerationClient};
    pub use crate::config::GatewayConfig;
    pub use crate::decode::{FailureKind, GenerationResult, decode_structured};
    pub use crate::error::{ConfigError, GatewayError};
    pub use crate::normalize::normalize_catalog;
    pub use crate::providers::{
        GeminiClient, GeminiConfig, GeneratedImage, GenerationRequest, GenerativeProvider,
    };
    pub use crate::proxy::{Action, GenerationProxy};
    pub use crate::retry::RetryPolicy;
    pub use crate::schema::SchemaDescriptor;
    pub use crate::server::router;
}

pub use error::{ConfigError, GatewayError};
