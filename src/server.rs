//! Axum server adapter
//!
//! Mounts the [`GenerationProxy`] at `POST /generate` (and `POST /api/generate`)
//! and maps [`GatewayError`] to HTTP responses.
//!
//! ## Example
//!
//! ```rust,ignore
//! use assistive_gateway::server::{router, serve};
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! serve(listener, router(proxy)).await?;
//! ```

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::error::GatewayError;
use crate::proxy::GenerationProxy;

/// Paths the proxy answers on.
pub const GENERATE_PATHS: [&str; 2] = ["/generate", "/api/generate"];

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }
        let mut response = (status, Json(self.to_body())).into_response();
        if matches!(self, Self::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

/// Router with the generate endpoint mounted on every path in [`GENERATE_PATHS`].
pub fn router(proxy: GenerationProxy) -> Router {
    GENERATE_PATHS
        .iter()
        .fold(Router::new(), |router, path| router.route(path, any(generate)))
        .with_state(proxy)
}

/// Accepts any method so a non-POST request is rejected before the body is
/// looked at.
async fn generate(
    State(proxy): State<GenerationProxy>,
    method: Method,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    if method != Method::POST {
        return Err(GatewayError::MethodNotAllowed(method.to_string()));
    }
    let body: Value = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let envelope = proxy.handle_body(&body).await?;
    Ok(Json(envelope))
}

/// Serve `app` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Generation proxy listening on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
