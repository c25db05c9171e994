pub mod chain;
pub mod error;
pub mod record;
pub mod redact;
pub mod sarif;
pub mod verify;

pub use chain::AuditChain;
pub use error::AuditError;
pub use record::{AlgoLabels, AuditRecord, RecordDraft};
pub use redact::{REDACTED, excerpt, redact_with};
pub use sarif::export_sarif;
pub use verify::{VerifyReport, verify_chain, verify_signatures};
