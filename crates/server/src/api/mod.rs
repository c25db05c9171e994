pub mod audit;
pub mod circuit_breakers;
pub mod dlq;
pub mod evaluate;
pub mod health;
pub mod openapi;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jimini_gateway::Gateway;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The assembled evaluation pipeline.
    pub gateway: Arc<Gateway>,
    /// Shared secret required on `/v1/evaluate`.
    pub api_key: Arc<String>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/evaluate", post(evaluate::evaluate))
        .route("/v1/metrics", get(health::metrics))
        .route("/v1/audit/verify", get(audit::verify))
        .route("/v1/audit/sarif", get(audit::sarif))
        .route("/v1/dlq/stats", get(dlq::dlq_stats))
        .route("/v1/dlq/replay", post(dlq::dlq_replay))
        .route(
            "/admin/circuit-breakers",
            get(circuit_breakers::list_circuit_breakers),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
