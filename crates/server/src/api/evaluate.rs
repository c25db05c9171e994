use axum::Json;
use axum::extract::State;
use subtle::ConstantTimeEq;

use jimini_core::{Direction, EvaluateRequest};

use super::AppState;
use super::schemas::EvaluateResponse;
use crate::error::ServerError;

/// `POST /v1/evaluate` -- evaluate one message against the rule set.
///
/// Validation failures return 400 and authentication failures 401; neither
/// produces an audit record. Unknown body fields are ignored.
#[utoipa::path(
    post,
    path = "/v1/evaluate",
    tag = "Evaluate",
    summary = "Evaluate a message",
    description = "Evaluates the message against the current rule snapshot, durably appends \
                   the audit record, and returns the decision.",
    responses(
        (status = 200, description = "Decision", body = EvaluateResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "API key mismatch"),
        (status = 500, description = "Audit append failure"),
    )
)]
pub async fn evaluate(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<EvaluateResponse>, ServerError> {
    let api_key = required_str(&body, "api_key")?;
    let authorized: bool = api_key
        .as_bytes()
        .ct_eq(state.api_key.as_bytes())
        .into();
    if !authorized {
        return Err(ServerError::Unauthorized);
    }

    let direction: Direction = required_str(&body, "direction")?
        .parse()
        .map_err(ServerError::BadRequest)?;

    let request = EvaluateRequest::new(
        required_str(&body, "agent_id")?,
        required_str(&body, "text")?,
        direction,
        required_str(&body, "endpoint")?,
        body.get("request_id")
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned),
    );

    let decision = state.gateway.evaluate(&request).await?;
    Ok(Json(EvaluateResponse {
        action: decision.action,
        rule_ids: decision.rule_ids,
        message: decision.message,
        request_id: decision.request_id,
        shadow_mode: decision.shadow_mode,
    }))
}

fn required_str(body: &serde_json::Value, field: &'static str) -> Result<String, ServerError> {
    body.get(field)
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ServerError::BadRequest(format!("missing field: {field}")))
}
