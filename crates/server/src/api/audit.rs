use axum::Json;
use axum::extract::State;

use super::AppState;
use super::schemas::VerifyResponse;
use crate::error::ServerError;

/// `GET /v1/audit/verify` -- replay the chain and report the first
/// inconsistency, if any.
///
/// A corrupt chain is a 200 with `ok: false`; the service keeps running.
#[utoipa::path(
    get,
    path = "/v1/audit/verify",
    tag = "Audit",
    summary = "Verify audit chain integrity",
    responses(
        (status = 200, description = "Verification outcome", body = VerifyResponse),
        (status = 500, description = "Chain file unreadable"),
    )
)]
pub async fn verify(State(state): State<AppState>) -> Result<Json<VerifyResponse>, ServerError> {
    let report = jimini_audit::verify_chain(state.gateway.chain().path())?;
    Ok(Json(report.into()))
}

/// `GET /v1/audit/sarif` -- non-allow records as a SARIF 2.1.0 document.
#[utoipa::path(
    get,
    path = "/v1/audit/sarif",
    tag = "Audit",
    summary = "Export audit decisions as SARIF",
    responses(
        (status = 200, description = "SARIF 2.1.0 document"),
        (status = 500, description = "Chain file unreadable"),
    )
)]
pub async fn sarif(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let doc = jimini_audit::export_sarif(state.gateway.chain().path())?;
    Ok(Json(doc))
}
