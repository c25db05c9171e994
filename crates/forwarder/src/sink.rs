//! Downstream sinks for audit records.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use jimini_audit::AuditRecord;

use crate::error::SinkError;

/// A destination for audit records (SIEM, webhook).
///
/// Implementations must be `Send + Sync`; delivery runs on the forwarder's
/// background task, never on the evaluate path.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Stable sink name; keys the circuit breaker and the dead-letter queue.
    fn name(&self) -> &str;

    /// Deliver one record.
    async fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

async fn check_status(response: reqwest::Response) -> Result<(), SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Generic JSON webhook sink: POSTs the record as the request body.
pub struct WebhookSink {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    /// Create a webhook sink with the given name and URL.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuditSink for WebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
        debug!(sink = %self.name, request_id = %record.request_id, "delivering to webhook");
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;
        check_status(response).await
    }
}

/// Splunk HTTP Event Collector sink.
pub struct SplunkHecSink {
    url: String,
    token: String,
    client: reqwest::Client,
}

impl SplunkHecSink {
    /// Create a Splunk sink posting to the HEC endpoint at `url`.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuditSink for SplunkHecSink {
    fn name(&self) -> &str {
        "splunk"
    }

    async fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let payload = json!({
            "event": record,
            "sourcetype": "jimini:audit",
        });
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Splunk {}", self.token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;
        check_status(response).await
    }
}

/// Elasticsearch sink indexing records into a daily index.
pub struct ElasticSink {
    base_url: String,
    client: reqwest::Client,
}

impl ElasticSink {
    /// Create an Elasticsearch sink against the cluster at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn index_for(timestamp: &str) -> String {
        // jimini-audit-YYYY.MM.DD, derived from the record's own timestamp.
        let day = timestamp.get(..10).unwrap_or("unknown").replace('-', ".");
        format!("jimini-audit-{day}")
    }
}

#[async_trait]
impl AuditSink for ElasticSink {
    fn name(&self) -> &str {
        "elastic"
    }

    async fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let url = format!(
            "{}/{}/_doc",
            self.base_url.trim_end_matches('/'),
            Self::index_for(&record.timestamp),
        );
        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;
        check_status(response).await
    }
}
