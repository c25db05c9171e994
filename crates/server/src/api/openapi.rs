use utoipa::OpenApi;

use super::schemas;

/// OpenAPI document for the Jimini gateway API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jimini Policy Gateway",
        description = "Inline policy enforcement with a hash-chained audit trail.",
    ),
    paths(
        super::evaluate::evaluate,
        super::health::health,
        super::health::metrics,
        super::audit::verify,
        super::audit::sarif,
        super::dlq::dlq_stats,
        super::dlq::dlq_replay,
        super::circuit_breakers::list_circuit_breakers,
    ),
    components(schemas(
        schemas::EvaluateResponse,
        schemas::HealthResponse,
        schemas::MetricsResponse,
        schemas::VerifyResponse,
        schemas::DlqStatsResponse,
        schemas::BreakerStateResponse,
    ))
)]
pub struct ApiDoc;
