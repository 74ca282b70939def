use anyhow::Result;
use tracing::info;
use videoproc_auth::{config::Config, server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!("Starting VideoProc Auth Service");
    info!(hosting = ?server::Hosting::from_env(), "Selected hosting mode");

    server::run(config, prometheus_handle).await
}
