//! Realtime publish and introspection endpoints
//!
//! Internal surface through which collaborator services (analytics
//! aggregation, CSV ingestion, ML training) hand already-computed payloads
//! to the fan-out engine. Delivery is best effort: a 200 means the payload
//! was accepted for fan-out, not that any client received it.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::websocket::registry::{
    CHANNEL_DATA_UPDATES, CHANNEL_MODEL_UPDATES, CHANNEL_REALTIME_METRICS,
};
use crate::websocket::WebSocketStats;

/// Accepted alert severities, lowest to highest
const ALERT_SEVERITIES: &[&str] = &["info", "warning", "error", "critical"];

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct DataUpdateRequest {
    pub update_type: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct ModelUpdateRequest {
    pub model_name: String,
    pub status: String,
    pub details: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub alert_type: String,
    pub message: String,
    pub severity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
    pub channel: Option<&'static str>,
}

impl PublishResponse {
    fn accepted(channel: Option<&'static str>) -> Self {
        Self {
            status: "accepted",
            channel,
        }
    }
}

/// Registry introspection snapshot
pub async fn get_stats(State(state): State<AppState>) -> Json<WebSocketStats> {
    Json(state.ws_state.get_stats().await)
}

/// Push aggregated metrics to `realtime_metrics` subscribers
pub async fn publish_metrics(
    State(state): State<AppState>,
    Json(req): Json<MetricsRequest>,
) -> ApiResult<Json<PublishResponse>> {
    if !req.data.is_object() {
        return Err(ApiError::Validation("data must be a JSON object".to_string()));
    }

    state.ws_state.send_realtime_metrics(req.data).await;
    Ok(Json(PublishResponse::accepted(Some(CHANNEL_REALTIME_METRICS))))
}

/// Push an ingestion notification to `data_updates` subscribers
pub async fn publish_data_update(
    State(state): State<AppState>,
    Json(req): Json<DataUpdateRequest>,
) -> ApiResult<Json<PublishResponse>> {
    if req.update_type.trim().is_empty() {
        return Err(ApiError::Validation("update_type must not be empty".to_string()));
    }

    state
        .ws_state
        .send_data_update(&req.update_type, req.data)
        .await;
    Ok(Json(PublishResponse::accepted(Some(CHANNEL_DATA_UPDATES))))
}

/// Push a model training/deployment status change to `model_updates`
/// subscribers
pub async fn publish_model_update(
    State(state): State<AppState>,
    Json(req): Json<ModelUpdateRequest>,
) -> ApiResult<Json<PublishResponse>> {
    if req.model_name.trim().is_empty() {
        return Err(ApiError::Validation("model_name must not be empty".to_string()));
    }
    if req.status.trim().is_empty() {
        return Err(ApiError::Validation("status must not be empty".to_string()));
    }

    let details = req.details.unwrap_or_else(|| Value::Object(Default::default()));
    state
        .ws_state
        .send_model_update(&req.model_name, &req.status, details)
        .await;
    Ok(Json(PublishResponse::accepted(Some(CHANNEL_MODEL_UPDATES))))
}

/// Broadcast an alert to every connected client
pub async fn publish_alert(
    State(state): State<AppState>,
    Json(req): Json<AlertRequest>,
) -> ApiResult<Json<PublishResponse>> {
    let severity = req.severity.as_deref().unwrap_or("info");
    if !ALERT_SEVERITIES.contains(&severity) {
        return Err(ApiError::Validation(format!(
            "Invalid severity. Must be one of: {}",
            ALERT_SEVERITIES.join(", ")
        )));
    }

    state
        .ws_state
        .send_alert(&req.alert_type, &req.message, severity)
        .await;
    Ok(Json(PublishResponse::accepted(None)))
}
