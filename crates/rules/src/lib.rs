pub mod error;
pub mod frontend;
pub mod matcher;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod watcher;

pub use error::RuleError;
pub use matcher::EndpointMatcher;
pub use model::{AppliesTo, Rule};
pub use snapshot::{CompiledRule, RuleSnapshot};
pub use store::RuleStore;
pub use watcher::RuleWatcher;
