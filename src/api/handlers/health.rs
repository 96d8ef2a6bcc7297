//! Health check and metrics handlers.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::state::AppState;

/// Liveness check - always returns 200 if the service is running.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "code": 0,
        "message": "success",
        "data": {
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "backing": state.config.server.backing.to_string(),
            "backend": state.store.backend_name()
        }
    }))
}

/// Prometheus metrics endpoint.
///
/// Empty when metrics are disabled.
pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .unwrap_or_default()
}
