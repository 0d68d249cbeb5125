use pyme_risk_console::{
    api::{start_server, ApiState},
    ConsoleConfig, HttpAnalysisGateway,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ConsoleConfig::from_env()?;

    info!("🚀 PyME Risk Console - API Server");
    info!("📍 Port: {}", config.api_port);
    info!("🔗 Analysis backend: {}", config.api_base_url);

    let gateway = Arc::new(HttpAnalysisGateway::from_config(&config)?);
    let port = config.api_port;
    let state = ApiState::new(gateway, config);

    info!("📡 Starting API server...");

    start_server(state, port).await?;

    Ok(())
}
