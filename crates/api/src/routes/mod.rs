//! API routes

pub mod health;
pub mod realtime;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{state::AppState, websocket::ws_handler};

/// Root endpoint: service banner
async fn root() -> Json<Value> {
    Json(json!({
        "message": "EV Charging Analytics Platform API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Realtime introspection + internal publish endpoints - under /api/v1
    let api_v1_routes = Router::new()
        .route("/realtime/stats", get(realtime::get_stats))
        .route("/realtime/metrics", post(realtime::publish_metrics))
        .route("/realtime/data-updates", post(realtime::publish_data_update))
        .route("/realtime/model-updates", post(realtime::publish_model_update))
        .route("/realtime/alerts", post(realtime::publish_alert));

    // WebSocket route (no auth; see non-goals)
    let websocket_routes = Router::new().route("/ws", get(ws_handler));

    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .merge(health_routes)
        .merge(websocket_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
