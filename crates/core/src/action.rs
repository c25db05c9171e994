use serde::{Deserialize, Serialize};

/// The enforcement action a rule contributes, and the final outcome of an
/// evaluation.
///
/// Ordering is by precedence: `Block > Flag > Allow`. The decision engine
/// reduces a firing set to its action-maximum, so deriving `Ord` on the
/// variant order below is load-bearing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Let the message through.
    Allow,
    /// Let the message through but mark it for review.
    Flag,
    /// Reject the message.
    Block,
}

impl Action {
    /// The stable string form used in audit records and telemetry keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Flag => "flag",
            Self::Block => "block",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a rule, used only for risk scoring and SARIF export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Which way a message is crossing the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Inbound prompt from the caller to the counterparty.
    Request,
    /// Outbound completion from the counterparty to the caller.
    Response,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(Self::Request),
            "response" => Ok(Self::Response),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Per-rule override of the global shadow switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowOverride {
    /// The rule always enforces, even when the global switch is on.
    Enforce,
    /// The rule is always shadowed, even when the global switch is off.
    Shadow,
    /// Follow the global switch.
    #[default]
    Inherit,
}
