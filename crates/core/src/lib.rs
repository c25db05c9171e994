pub mod action;
pub mod config;
pub mod evaluate;
pub mod family;
pub mod risk;
pub mod time;

pub use action::{Action, Direction, Severity, ShadowOverride};
pub use config::GatewayConfig;
pub use evaluate::{Decision, EvaluateRequest};
pub use family::{
    GENERIC_PREFIX, SECRET_PREFIXES, is_generic_rule, is_secret_rule, suppress_generic,
};
pub use risk::{RiskLevel, risk_level, risk_score};
pub use time::{gen_request_id, now_iso};
