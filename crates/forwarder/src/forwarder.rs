//! The forwarder: fans audit records out to sinks through circuit breakers,
//! dead-letters what cannot be delivered, and replays the dead-letter queue
//! once a sink recovers.
//!
//! Forwarding is asynchronous relative to the evaluate path: the engine
//! enqueues onto a bounded channel and returns as soon as the audit record
//! is durably appended to the chain. A full channel falls through directly
//! to the dead-letter queue rather than blocking an evaluation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use jimini_audit::AuditRecord;

use crate::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerManager, CircuitMetrics};
use crate::dlq::DeadLetterQueue;
use crate::sink::AuditSink;

/// Reason recorded when the breaker rejected the delivery outright.
const REASON_CIRCUIT_OPEN: &str = "circuit_open";
/// Reason recorded when the sink accepted the attempt and failed.
const REASON_DELIVERY_FAILURE: &str = "delivery_failure";
/// Reason recorded when the work channel was full.
const REASON_QUEUE_FULL: &str = "queue_full";

/// Tuning knobs for the forwarder.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Capacity of the work channel between evaluations and delivery.
    pub queue_capacity: usize,
    /// How often the replayer scans the dead-letter queue.
    pub replay_interval: Duration,
    /// Circuit breaker settings applied to every sink.
    pub breaker: CircuitBreakerConfig,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            replay_interval: Duration::from_secs(30),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

struct Inner {
    sinks: HashMap<String, Arc<dyn AuditSink>>,
    breakers: CircuitBreakerManager,
    dlq: Arc<DeadLetterQueue>,
}

/// Handle used by the decision engine to hand off audit records.
///
/// Cloneable; all clones share the same delivery worker and replayer.
#[derive(Clone)]
pub struct Forwarder {
    inner: Arc<Inner>,
    tx: mpsc::Sender<AuditRecord>,
}

impl Forwarder {
    /// Build a forwarder and spawn its delivery worker and replayer tasks.
    ///
    /// With no sinks configured the forwarder is a no-op; records are
    /// dropped after the chain append, which is the complete audit trail.
    pub fn spawn(
        sinks: Vec<Arc<dyn AuditSink>>,
        dlq: Arc<DeadLetterQueue>,
        config: ForwarderConfig,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditRecord>(config.queue_capacity);

        let inner = Arc::new(Inner {
            sinks: sinks
                .into_iter()
                .map(|s| (s.name().to_owned(), s))
                .collect(),
            breakers: CircuitBreakerManager::new(config.breaker),
            dlq,
        });

        let worker = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                worker.fan_out(&record).await;
            }
            debug!("forwarder channel closed, delivery worker exiting");
        });

        let replayer = Arc::clone(&inner);
        let interval = config.replay_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                replayer.replay_once().await;
            }
        });

        Self { inner, tx }
    }

    /// Hand a record to the delivery worker without blocking.
    ///
    /// A full (or closed) channel dead-letters the record for every sink
    /// instead of slowing down the evaluate path.
    pub fn enqueue(&self, record: AuditRecord) {
        if self.inner.sinks.is_empty() {
            return;
        }
        if let Err(e) = self.tx.try_send(record) {
            let record = match &e {
                mpsc::error::TrySendError::Full(r) | mpsc::error::TrySendError::Closed(r) => r,
            };
            warn!(request_id = %record.request_id, "forwarder queue full, dead-lettering");
            let event = serde_json::to_value(record).unwrap_or_default();
            for name in self.inner.sinks.keys() {
                self.inner.dlq.write(name, event.clone(), REASON_QUEUE_FULL, 0);
            }
        }
    }

    /// Deliver a record to every sink immediately (the worker's path,
    /// exposed for tests and the drain endpoint).
    pub async fn forward_now(&self, record: &AuditRecord) {
        self.inner.fan_out(record).await;
    }

    /// Run one replay pass over the dead-letter queue.
    pub async fn replay_now(&self) {
        self.inner.replay_once().await;
    }

    /// Current breaker metrics keyed by sink name.
    pub fn breaker_states(&self) -> std::collections::BTreeMap<String, CircuitMetrics> {
        self.inner.breakers.all_states()
    }

    /// The shared dead-letter queue.
    pub fn dlq(&self) -> &Arc<DeadLetterQueue> {
        &self.inner.dlq
    }
}

impl Inner {
    /// Deliver one record to every sink, breaker-guarded.
    async fn fan_out(&self, record: &AuditRecord) {
        for (name, sink) in &self.sinks {
            let breaker = self.breakers.get(name);

            if breaker.try_acquire_permit().is_err() {
                debug!(sink = %name, request_id = %record.request_id, "breaker open, dead-lettering");
                let event = serde_json::to_value(record).unwrap_or_default();
                self.dlq.write(name, event, REASON_CIRCUIT_OPEN, 0);
                continue;
            }

            match sink.deliver(record).await {
                Ok(()) => {
                    breaker.record_success();
                }
                Err(e) => {
                    warn!(sink = %name, error = %e, "delivery failed, dead-lettering");
                    breaker.record_failure();
                    let event = serde_json::to_value(record).unwrap_or_default();
                    self.dlq.write(name, event, REASON_DELIVERY_FAILURE, 0);
                }
            }
        }
    }

    /// Replay dead letters for every sink whose breaker is closed.
    ///
    /// Entries are retried in FIFO order; only a fully drained target is
    /// cleared, so a mid-replay failure leaves the queue intact for the
    /// next pass.
    async fn replay_once(&self) {
        for (name, sink) in &self.sinks {
            let breaker = self.breakers.get(name);
            if !breaker.is_closed() {
                continue;
            }

            let entries = self.dlq.read(Some(name));
            if entries.is_empty() {
                continue;
            }

            info!(sink = %name, entries = entries.len(), "replaying dead letters");
            let mut drained = true;
            for entry in entries {
                let record: AuditRecord = match serde_json::from_value(entry.original_event) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(sink = %name, error = %e, "dropping undecodable dead letter");
                        continue;
                    }
                };
                if let Err(e) = sink.deliver(&record).await {
                    warn!(sink = %name, error = %e, "replay delivery failed, keeping queue");
                    breaker.record_failure();
                    drained = false;
                    break;
                }
                breaker.record_success();
            }

            if drained {
                self.dlq.clear_target(name);
                info!(sink = %name, "dead-letter queue drained");
            }
        }
    }
}
