use async_trait::async_trait;

use crate::error::ClassifierError;

/// Trait for the optional external text classifier.
///
/// The decision engine treats every error from this trait as did-not-fire:
/// a failure can only ever make the gateway more permissive for the one
/// rule that delegated to it, never break the evaluation.
#[async_trait]
pub trait TextClassifier: Send + Sync + std::fmt::Debug {
    /// Ask whether `text` matches the policy described by `prompt`.
    async fn classify(&self, prompt: &str, text: &str) -> Result<bool, ClassifierError>;
}
