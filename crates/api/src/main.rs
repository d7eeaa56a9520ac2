use std::net::SocketAddr;

use anyhow::{Context, Result};
use hervival_api::{build_app, ApiConfig};
use hervival_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("hervival_api");

    let config = ApiConfig::from_env()?;
    let app = build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, origins = ?config.allowed_origins, "hervival support api started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
