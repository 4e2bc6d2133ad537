use anyhow::{Context, Result};
use tracing::info;

use api::config::AppConfig;
use api::{build_planner, build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init(&config.logging)?;

    let planner = build_planner(&config).await?;
    let app = build_router(AppState::new(planner));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
