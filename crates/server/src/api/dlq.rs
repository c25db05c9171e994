use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::schemas::DlqStatsResponse;

/// `GET /v1/dlq/stats` -- dead-letter queue statistics per target sink.
#[utoipa::path(
    get,
    path = "/v1/dlq/stats",
    tag = "Forwarder",
    summary = "Dead-letter queue statistics",
    responses(
        (status = 200, description = "Queue statistics", body = DlqStatsResponse)
    )
)]
pub async fn dlq_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.gateway.forwarder().dlq().stats();
    (StatusCode::OK, Json(DlqStatsResponse::from(stats)))
}

/// `POST /v1/dlq/replay` -- run one replay pass immediately instead of
/// waiting for the periodic replayer, then report the remaining queue.
///
/// Targets whose breaker is not closed are left untouched.
#[utoipa::path(
    post,
    path = "/v1/dlq/replay",
    tag = "Forwarder",
    summary = "Replay the dead-letter queue now",
    responses(
        (status = 200, description = "Queue statistics after the pass", body = DlqStatsResponse)
    )
)]
pub async fn dlq_replay(State(state): State<AppState>) -> impl IntoResponse {
    state.gateway.forwarder().replay_now().await;
    let stats = state.gateway.forwarder().dlq().stats();
    (StatusCode::OK, Json(DlqStatsResponse::from(stats)))
}
