use finance_workflow_orchestrator::{api::start_server, config::Settings, Orchestrator};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    info!("Finance Workflow Orchestrator - API Server");
    info!("Port: {}", settings.port);

    let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);

    info!("Orchestrator initialized");
    info!("Starting API server...");

    start_server(orchestrator, settings.port).await?;

    Ok(())
}
