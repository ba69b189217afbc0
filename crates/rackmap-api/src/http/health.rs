//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::header};
use rackmap_telemetry::build_sha;
use serde::Serialize;
use tracing::{error, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: String,
    pub(crate) degraded: Vec<String>,
    pub(crate) contexts: i64,
    pub(crate) devices: i64,
}

pub(crate) async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    match state.inventory.ping().await {
        Ok(()) => {
            state.remove_degraded_component("database");
            state.refresh_inventory_gauges().await;
            let snapshot = state.telemetry.snapshot();
            let degraded = state.current_health_degraded();
            let status = if degraded.is_empty() { "ok" } else { "degraded" };
            Ok(Json(HealthResponse {
                status,
                build: build_sha().to_string(),
                degraded,
                contexts: snapshot.active_contexts,
                devices: snapshot.active_devices,
            }))
        }
        Err(err) => {
            state.add_degraded_component("database");
            warn!(error = %err, "health check failed to reach database");
            Err(ApiError::service_unavailable(
                "database is currently unavailable",
            ))
        }
    }
}

pub(crate) async fn metrics(
    State(state): State<Arc<ApiState>>,
) -> Result<([(header::HeaderName, &'static str); 1], String), ApiError> {
    let body = state.telemetry.render().map_err(|err| {
        error!(error = %err, "failed to render metrics");
        ApiError::internal("failed to render metrics")
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
