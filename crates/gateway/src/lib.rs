pub mod builder;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use builder::GatewayBuilder;
pub use engine::Gateway;
pub use error::GatewayError;
pub use telemetry::{Telemetry, TelemetrySnapshot};
