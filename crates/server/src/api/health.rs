use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::schemas::{HealthResponse, MetricsResponse};

/// `GET /health` -- service status for probes and operators.
///
/// `status` is `degraded` when the most recent rule reload failed (the
/// previous snapshot is still being served). `loaded_rules: 0` on a healthy
/// service means the snapshot is empty and every evaluation will allow; that
/// is the operator's signal, not an error.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.gateway.rules().last_error().is_some() {
        "degraded"
    } else {
        "ok"
    };
    let body = HealthResponse {
        status: status.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        loaded_rules: state.gateway.loaded_rules(),
        shadow_mode: state.gateway.shadow_mode(),
    };
    (StatusCode::OK, Json(body))
}

/// `GET /v1/metrics` -- evaluation counters as JSON.
#[utoipa::path(
    get,
    path = "/v1/metrics",
    tag = "Health",
    summary = "Evaluation metrics",
    responses(
        (status = 200, description = "Current counters", body = MetricsResponse)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.gateway.telemetry().snapshot();
    let body = MetricsResponse {
        shadow_mode: state.gateway.shadow_mode(),
        loaded_rules: state.gateway.loaded_rules(),
        totals: snap.totals,
        by_rule: snap.by_rule,
        classifier_errors: snap.classifier_errors,
    };
    (StatusCode::OK, Json(body))
}
