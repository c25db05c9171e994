//! Server configuration captured from the environment at startup.

use jimini_core::GatewayConfig;

/// Splunk HTTP Event Collector settings.
#[derive(Debug, Clone)]
pub struct SplunkConfig {
    pub hec_url: String,
    pub hec_token: String,
}

/// External classifier settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub url: String,
    pub model: String,
    pub api_key: String,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Shared secret for `/v1/evaluate`.
    pub api_key: String,
    /// Engine and audit-plane settings.
    pub gateway: GatewayConfig,
    /// Generic webhook sink, when configured.
    pub webhook_url: Option<String>,
    /// Splunk sink, when configured.
    pub splunk: Option<SplunkConfig>,
    /// Elasticsearch sink, when configured.
    pub elastic_url: Option<String>,
    /// External classifier, when configured.
    pub llm: Option<LlmConfig>,
}

impl ServerConfig {
    /// Capture the full configuration from the process environment.
    pub fn from_env() -> Self {
        let splunk = match (env("SPLUNK_HEC_URL"), env("SPLUNK_HEC_TOKEN")) {
            (Some(hec_url), Some(hec_token)) => Some(SplunkConfig { hec_url, hec_token }),
            _ => None,
        };

        let llm = match (env("JIMINI_LLM_URL"), env("JIMINI_LLM_MODEL")) {
            (Some(url), Some(model)) => Some(LlmConfig {
                url,
                model,
                api_key: env("JIMINI_LLM_API_KEY").unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            host: env("JIMINI_HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: env("JIMINI_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            api_key: env("JIMINI_API_KEY").unwrap_or_else(|| "changeme".to_owned()),
            gateway: GatewayConfig::from_env(),
            webhook_url: env("WEBHOOK_URL"),
            splunk,
            elastic_url: env("ELASTIC_URL"),
            llm,
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
