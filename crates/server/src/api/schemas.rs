use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use jimini_core::Action;

/// Evaluate response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluateResponse {
    /// Final action reported to the caller.
    #[schema(example = "block")]
    pub action: Action,
    /// Firing rule ids after suppression, sorted.
    pub rule_ids: Vec<String>,
    /// Human-readable decision summary.
    #[schema(example = "Blocked by policy: OPENAI-KEY-1.0")]
    pub message: String,
    /// Correlation id (echoed or generated).
    #[schema(example = "req_1a2b3c4d5e6f")]
    pub request_id: String,
    /// True when shadow mode downgraded the action.
    pub shadow_mode: bool,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Server version.
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Rules in the currently served snapshot.
    #[schema(example = 12)]
    pub loaded_rules: usize,
    /// Whether the global shadow switch is on.
    pub shadow_mode: bool,
}

/// Metrics response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Whether the global shadow switch is on.
    pub shadow_mode: bool,
    /// Rules in the currently served snapshot.
    #[schema(example = 12)]
    pub loaded_rules: usize,
    /// Final decision counts by action.
    pub totals: BTreeMap<String, u64>,
    /// Firing counts by rule id.
    pub by_rule: BTreeMap<String, u64>,
    /// External classifier failures (treated as did-not-fire).
    #[schema(example = 0)]
    pub classifier_errors: u64,
}

/// Chain verification response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// True when the whole chain re-hashes and links correctly.
    pub ok: bool,
    /// Index of the first inconsistent record, when not ok.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_bad_index: Option<usize>,
    /// Description of the inconsistency, when not ok.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Records checked (up to and including the first bad one).
    pub records_checked: usize,
}

impl From<jimini_audit::VerifyReport> for VerifyResponse {
    fn from(report: jimini_audit::VerifyReport) -> Self {
        Self {
            ok: report.ok,
            first_bad_index: report.first_bad_index,
            reason: report.reason,
            records_checked: report.records_checked,
        }
    }
}

/// Dead-letter queue statistics response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DlqStatsResponse {
    /// Total entries across all targets.
    pub total_events: usize,
    /// Entry counts per target sink.
    pub targets: BTreeMap<String, usize>,
    /// Timestamp of the oldest entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_event: Option<String>,
    /// Timestamp of the newest entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_event: Option<String>,
}

impl From<jimini_forwarder::DlqStats> for DlqStatsResponse {
    fn from(stats: jimini_forwarder::DlqStats) -> Self {
        Self {
            total_events: stats.total_events,
            targets: stats.targets,
            oldest_event: stats.oldest_event,
            newest_event: stats.newest_event,
        }
    }
}

/// One circuit breaker's state, for the admin surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BreakerStateResponse {
    /// `closed`, `open`, or `half_open`.
    #[schema(example = "closed")]
    pub state: String,
    /// Consecutive failures observed.
    pub failure_count: u32,
    /// Consecutive successes observed (half-open probes).
    pub success_count: u32,
    /// ISO-8601 time of the last failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_time: Option<String>,
}

impl From<jimini_forwarder::CircuitMetrics> for BreakerStateResponse {
    fn from(m: jimini_forwarder::CircuitMetrics) -> Self {
        Self {
            state: m.state.to_string(),
            failure_count: m.failure_count,
            success_count: m.success_count,
            last_failure_time: m.last_failure_time,
        }
    }
}
