pub mod error;
pub mod hash;
pub mod sign;

pub use error::CryptoError;
pub use hash::{HashAlgo, ZERO_HASH};
pub use sign::{RecordSigner, RecordVerifier, SIG_NONE, generate_keypair};
