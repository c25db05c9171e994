//! Per-sink circuit breakers.
//!
//! Tracks sink health and automatically transitions between states:
//! - `Closed` (normal) -> `Open` (failing) when consecutive failures reach
//!   the threshold
//! - `Open` -> `HalfOpen` (probing) after the recovery timeout elapses
//! - `HalfOpen` -> `Closed` after enough consecutive probe successes
//! - `HalfOpen` -> `Open` on any failure
//!
//! Every transition happens under the breaker's single mutex; the manager
//! holds its own mutex solely for map lookup and creation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CircuitOpenError;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation -- deliveries flow through.
    Closed,
    /// Sink is failing -- deliveries are rejected immediately.
    Open,
    /// Recovery probing -- a limited number of deliveries test sink health.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Configuration for a per-sink circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// How long to wait in `Open` before probing.
    pub recovery_timeout: Duration,
    /// Probes admitted in `HalfOpen`; that many consecutive successes close
    /// the circuit.
    pub test_requests_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            test_requests_threshold: 3,
        }
    }
}

/// Point-in-time view of a breaker, for the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    /// ISO-8601 time of the last recorded failure.
    pub last_failure_time: Option<String>,
}

#[derive(Debug)]
struct CircuitData {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure_time_ms: Option<i64>,
}

impl Default for CircuitData {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure_time_ms: None,
        }
    }
}

/// Circuit breaker for a single sink.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    data: Mutex<CircuitData>,
}

impl CircuitBreaker {
    fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            data: Mutex::new(CircuitData::default()),
        }
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Acquire permission to attempt a delivery.
    ///
    /// May transition `Open` -> `HalfOpen` when the recovery timeout has
    /// elapsed. The caller must follow up with
    /// [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub fn try_acquire_permit(&self) -> Result<(), CircuitOpenError> {
        let mut data = self.data.lock();
        match data.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed_ms = data
                    .last_failure_time_ms
                    .map_or(i64::MAX, |t| (Self::now_ms() - t).max(0));
                #[allow(clippy::cast_possible_truncation)]
                let timeout_ms = self.config.recovery_timeout.as_millis() as i64;

                if elapsed_ms >= timeout_ms {
                    debug!(
                        sink = %self.name,
                        "circuit breaker transitioning from open to half-open"
                    );
                    data.state = CircuitState::HalfOpen;
                    data.consecutive_successes = 0;
                    Ok(())
                } else {
                    Err(CircuitOpenError(self.name.clone()))
                }
            }
            CircuitState::HalfOpen => {
                if data.consecutive_successes < self.config.test_requests_threshold {
                    Ok(())
                } else {
                    Err(CircuitOpenError(self.name.clone()))
                }
            }
        }
    }

    /// Record a successful delivery.
    ///
    /// Returns `Some((from, to))` when a state transition occurred.
    pub fn record_success(&self) -> Option<(CircuitState, CircuitState)> {
        let mut data = self.data.lock();
        match data.state {
            CircuitState::HalfOpen => {
                data.consecutive_successes += 1;
                if data.consecutive_successes >= self.config.test_requests_threshold {
                    info!(
                        sink = %self.name,
                        successes = data.consecutive_successes,
                        "circuit breaker closing after successful probes"
                    );
                    data.state = CircuitState::Closed;
                    data.consecutive_failures = 0;
                    data.consecutive_successes = 0;
                    Some((CircuitState::HalfOpen, CircuitState::Closed))
                } else {
                    None
                }
            }
            CircuitState::Closed => {
                data.consecutive_failures = 0;
                None
            }
            CircuitState::Open => None,
        }
    }

    /// Record a failed delivery.
    ///
    /// Returns `Some((from, to))` when a state transition occurred.
    pub fn record_failure(&self) -> Option<(CircuitState, CircuitState)> {
        let mut data = self.data.lock();
        let now = Self::now_ms();
        match data.state {
            CircuitState::Closed => {
                data.consecutive_failures += 1;
                data.last_failure_time_ms = Some(now);
                if data.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        sink = %self.name,
                        failures = data.consecutive_failures,
                        threshold = self.config.failure_threshold,
                        "circuit breaker opening"
                    );
                    data.state = CircuitState::Open;
                    Some((CircuitState::Closed, CircuitState::Open))
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    sink = %self.name,
                    "circuit breaker re-opening after half-open probe failure"
                );
                data.state = CircuitState::Open;
                data.last_failure_time_ms = Some(now);
                data.consecutive_successes = 0;
                Some((CircuitState::HalfOpen, CircuitState::Open))
            }
            CircuitState::Open => {
                data.last_failure_time_ms = Some(now);
                None
            }
        }
    }

    /// Current state without triggering transitions.
    pub fn state(&self) -> CircuitState {
        self.data.lock().state
    }

    /// True when the breaker is closed (healthy).
    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// Point-in-time metrics for the admin surface.
    pub fn snapshot(&self) -> CircuitMetrics {
        let data = self.data.lock();
        CircuitMetrics {
            state: data.state,
            failure_count: data.consecutive_failures,
            success_count: data.consecutive_successes,
            last_failure_time: data.last_failure_time_ms.and_then(|ms| {
                chrono::DateTime::from_timestamp_millis(ms)
                    .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            }),
        }
    }

    /// Manually open the circuit (operator/testing escape hatch).
    pub fn force_open(&self) {
        let mut data = self.data.lock();
        data.state = CircuitState::Open;
        data.last_failure_time_ms = Some(Self::now_ms());
        data.consecutive_successes = 0;
    }
}

/// Keyed collection of breakers, one per sink.
pub struct CircuitBreakerManager {
    config: CircuitBreakerConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerManager {
    /// Create a manager applying `config` to every new breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Return the breaker for `name`, creating it on first use.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock();
        Arc::clone(
            breakers
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone()))),
        )
    }

    /// Snapshot of every known breaker, keyed by sink name.
    pub fn all_states(&self) -> BTreeMap<String, CircuitMetrics> {
        self.breakers
            .lock()
            .iter()
            .map(|(name, b)| (name.clone(), b.snapshot()))
            .collect()
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(recovery: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "splunk",
            CircuitBreakerConfig {
                failure_threshold: 5,
                recovery_timeout: recovery,
                test_requests_threshold: 3,
            },
        )
    }

    #[test]
    fn opens_after_five_consecutive_failures() {
        let b = breaker(Duration::from_secs(60));
        for _ in 0..4 {
            assert!(b.record_failure().is_none());
        }
        assert_eq!(
            b.record_failure(),
            Some((CircuitState::Closed, CircuitState::Open))
        );
        assert!(b.try_acquire_permit().is_err());
    }

    #[test]
    fn success_resets_the_failure_streak() {
        let b = breaker(Duration::from_secs(60));
        for _ in 0..4 {
            b.record_failure();
        }
        b.record_success();
        for _ in 0..4 {
            assert!(b.record_failure().is_none());
        }
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn recovers_through_half_open_probes() {
        let b = breaker(Duration::ZERO);
        for _ in 0..5 {
            b.record_failure();
        }
        assert_eq!(b.state(), CircuitState::Open);

        // Zero recovery timeout: the next permit moves to half-open.
        assert!(b.try_acquire_permit().is_ok());
        assert_eq!(b.state(), CircuitState::HalfOpen);

        b.record_success();
        assert!(b.try_acquire_permit().is_ok());
        b.record_success();
        assert!(b.try_acquire_permit().is_ok());
        assert_eq!(
            b.record_success(),
            Some((CircuitState::HalfOpen, CircuitState::Closed))
        );
        assert!(b.is_closed());
    }

    #[test]
    fn half_open_failure_reopens() {
        let b = breaker(Duration::ZERO);
        for _ in 0..5 {
            b.record_failure();
        }
        assert!(b.try_acquire_permit().is_ok());
        assert_eq!(
            b.record_failure(),
            Some((CircuitState::HalfOpen, CircuitState::Open))
        );
    }

    #[test]
    fn open_rejects_until_timeout() {
        let b = breaker(Duration::from_secs(3600));
        b.force_open();
        assert!(b.try_acquire_permit().is_err());
        assert_eq!(b.snapshot().state, CircuitState::Open);
    }

    #[test]
    fn manager_returns_same_breaker_per_name() {
        let mgr = CircuitBreakerManager::default();
        let a = mgr.get("splunk");
        let b = mgr.get("splunk");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(mgr.all_states().len(), 1);

        mgr.get("elastic");
        assert_eq!(mgr.all_states().len(), 2);
    }
}
