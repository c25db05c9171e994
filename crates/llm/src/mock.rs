use async_trait::async_trait;

use crate::classifier::TextClassifier;
use crate::error::ClassifierError;

/// A mock classifier that returns a fixed answer.
#[derive(Debug, Clone)]
pub struct MockClassifier {
    answer: bool,
}

impl MockClassifier {
    /// A classifier that always answers `true` (the rule fires).
    pub fn firing() -> Self {
        Self { answer: true }
    }

    /// A classifier that always answers `false`.
    pub fn silent() -> Self {
        Self { answer: false }
    }
}

#[async_trait]
impl TextClassifier for MockClassifier {
    async fn classify(&self, _prompt: &str, _text: &str) -> Result<bool, ClassifierError> {
        Ok(self.answer)
    }
}

/// A mock classifier that always returns an error.
#[derive(Debug, Clone)]
pub struct FailingClassifier {
    error_message: String,
}

impl FailingClassifier {
    /// Create a failing classifier with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
        }
    }
}

#[async_trait]
impl TextClassifier for FailingClassifier {
    async fn classify(&self, _prompt: &str, _text: &str) -> Result<bool, ClassifierError> {
        Err(ClassifierError::Api(self.error_message.clone()))
    }
}
