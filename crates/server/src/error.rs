use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur when serving the Jimini API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body is malformed (missing field, bad enum value).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// API key mismatch.
    #[error("unauthorized")]
    Unauthorized,

    /// The evaluation pipeline failed (audit append, most likely).
    #[error("gateway error: {0}")]
    Gateway(#[from] jimini_gateway::GatewayError),

    /// The audit plane failed outside an evaluation (verify, SARIF export).
    #[error("audit error: {0}")]
    Audit(#[from] jimini_audit::AuditError),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
            Self::Gateway(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Audit(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
