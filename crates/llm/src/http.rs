use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::classifier::TextClassifier;
use crate::config::ClassifierConfig;
use crate::error::ClassifierError;

/// HTTP-based classifier using an OpenAI-compatible chat completions API.
///
/// The rule's `llm_prompt` is sent as the system message; the message text
/// under evaluation is the user message. The model is instructed to answer
/// with the single word `true` or `false`.
#[derive(Debug)]
pub struct HttpClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    /// Create a new HTTP classifier with the given configuration.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClassifierError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Frame the rule prompt as a strict true/false question.
    fn build_system_prompt(prompt: &str) -> String {
        format!("{prompt}\n\nAnswer with exactly one word: true or false.")
    }

    /// Parse the model's answer, stripping markdown code fences if present.
    fn parse_response(content: &str) -> Result<bool, ClassifierError> {
        let trimmed = content.trim();
        let answer = if trimmed.starts_with("```") {
            trimmed
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
        } else {
            trimmed
        };

        match answer.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ClassifierError::Parse(format!(
                "expected true or false, got: {other}"
            ))),
        }
    }
}

#[async_trait]
impl TextClassifier for HttpClassifier {
    async fn classify(&self, prompt: &str, text: &str) -> Result<bool, ClassifierError> {
        let request_body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "system",
                    "content": Self::build_system_prompt(prompt),
                },
                {
                    "role": "user",
                    "content": text,
                }
            ]
        });

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "sending classifier request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.config.timeout_seconds)
                } else {
                    ClassifierError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "classifier API returned error");
            return Err(ClassifierError::Api(format!("HTTP {status}: {body}")));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(format!("failed to parse API response: {e}")))?;

        let content = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ClassifierError::Parse(format!("unexpected response format: {response_json}"))
            })?;

        Self::parse_response(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_true_and_false() {
        assert!(HttpClassifier::parse_response("true").unwrap());
        assert!(!HttpClassifier::parse_response("False").unwrap());
        assert!(HttpClassifier::parse_response("  TRUE\n").unwrap());
    }

    #[test]
    fn parse_fenced_answer() {
        assert!(HttpClassifier::parse_response("```\ntrue\n```").unwrap());
    }

    #[test]
    fn parse_anything_else_is_an_error() {
        assert!(HttpClassifier::parse_response("maybe").is_err());
        assert!(HttpClassifier::parse_response("").is_err());
    }

    #[test]
    fn system_prompt_appends_answer_contract() {
        let p = HttpClassifier::build_system_prompt("Does this text discuss violence?");
        assert!(p.starts_with("Does this text discuss violence?"));
        assert!(p.ends_with("true or false."));
    }
}
