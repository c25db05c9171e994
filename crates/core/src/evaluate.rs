use serde::{Deserialize, Serialize};

use crate::action::{Action, Direction};

/// A single message submitted for policy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// Identity of the agent on whose behalf the message crosses the boundary.
    pub agent_id: String,
    /// The message text to evaluate.
    pub text: String,
    /// Whether this is an inbound prompt or an outbound completion.
    pub direction: Direction,
    /// The caller endpoint the message belongs to (e.g. `/v1/chat`).
    pub endpoint: String,
    /// Caller-supplied correlation id; generated when absent.
    pub request_id: String,
}

impl EvaluateRequest {
    /// Create a request, generating a `request_id` when none is supplied.
    pub fn new(
        agent_id: impl Into<String>,
        text: impl Into<String>,
        direction: Direction,
        endpoint: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            text: text.into(),
            direction,
            endpoint: endpoint.into(),
            request_id: request_id.unwrap_or_else(crate::time::gen_request_id),
        }
    }
}

/// The combined outcome of an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The action reported to the caller (post shadow downgrade).
    pub action: Action,
    /// Ids of the rules that fired, after suppression, sorted lexicographically.
    pub rule_ids: Vec<String>,
    /// Human-readable summary of the decision.
    pub message: String,
    /// Correlation id echoed back to the caller.
    pub request_id: String,
    /// True when shadow mode downgraded the reported action to `allow`.
    pub shadow_mode: bool,
}
