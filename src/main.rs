use assistive_gateway::config::GatewayConfig;
use assistive_gateway::proxy::GenerationProxy;
use assistive_gateway::server::{router, serve};
use assistive_gateway::telemetry::init_subscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig::from_env()?;
    let _guard = init_subscriber(config.subscriber_config())?;

    let proxy = GenerationProxy::gemini(config.gemini_config())?;
    tracing::info!(model = %config.model, image_model = %config.image_model, "provider ready");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    serve(listener, router(proxy)).await?;
    Ok(())
}
