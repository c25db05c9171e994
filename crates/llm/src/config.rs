/// Configuration for the HTTP-based classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// OpenAI-compatible API endpoint (e.g., `https://api.openai.com/v1/chat/completions`).
    pub endpoint: String,
    /// Model to use (e.g., `gpt-4o-mini`).
    pub model: String,
    /// API key for authentication.
    pub api_key: String,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Temperature for sampling (0.0 = deterministic).
    pub temperature: f64,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
}

impl ClassifierConfig {
    /// Create a new config with the given endpoint, model, and API key.
    ///
    /// Defaults: 2 s timeout, temperature 0.0, max 8 tokens (the answer is a
    /// single word).
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_seconds: 2,
            temperature: 0.0,
            max_tokens: 8,
        }
    }

    /// Set the per-call timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum response tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ClassifierConfig::new("http://localhost/v1/chat/completions", "gpt-4o-mini", "k");
        assert_eq!(cfg.timeout_seconds, 2);
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.max_tokens, 8);
    }

    #[test]
    fn builder_overrides() {
        let cfg = ClassifierConfig::new("e", "m", "k")
            .with_timeout(5)
            .with_temperature(0.3)
            .with_max_tokens(32);
        assert_eq!(cfg.timeout_seconds, 5);
        assert_eq!(cfg.temperature, 0.3);
        assert_eq!(cfg.max_tokens, 32);
    }
}
