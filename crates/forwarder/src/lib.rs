pub mod circuit_breaker;
pub mod dlq;
pub mod error;
pub mod forwarder;
pub mod sink;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerManager, CircuitMetrics, CircuitState,
};
pub use dlq::{DeadLetterEntry, DeadLetterQueue, DlqStats};
pub use error::{CircuitOpenError, SinkError};
pub use forwarder::{Forwarder, ForwarderConfig};
pub use sink::{AuditSink, ElasticSink, SplunkHecSink, WebhookSink};
