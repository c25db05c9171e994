use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::schemas::BreakerStateResponse;

/// `GET /admin/circuit-breakers` -- current state of every sink breaker.
#[utoipa::path(
    get,
    path = "/admin/circuit-breakers",
    tag = "Forwarder",
    summary = "List circuit breaker states",
    responses(
        (status = 200, description = "Breaker states keyed by sink name")
    )
)]
pub async fn list_circuit_breakers(State(state): State<AppState>) -> impl IntoResponse {
    let states: BTreeMap<String, BreakerStateResponse> = state
        .gateway
        .forwarder()
        .breaker_states()
        .into_iter()
        .map(|(name, metrics)| (name, metrics.into()))
        .collect();
    (StatusCode::OK, Json(states))
}
