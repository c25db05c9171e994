pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use classifier::TextClassifier;
pub use config::ClassifierConfig;
pub use error::ClassifierError;
pub use http::HttpClassifier;
pub use mock::{FailingClassifier, MockClassifier};
