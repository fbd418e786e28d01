//! EV Charging Analytics API server entrypoint

use evcharge_api::websocket::maintenance::spawn_maintenance_tasks;
use evcharge_api::{routes, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(config.clone());

    spawn_maintenance_tasks(state.ws_state.clone(), &config);

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "EV Charging Analytics API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
