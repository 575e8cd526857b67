pub mod encryption;
pub mod hashing;
pub mod key_provider;
pub mod ledger;
pub mod log_redact;
pub mod logging;
pub mod password;
pub mod pbkdf2;

pub use encryption::{AesGcmPasswordCipher, PasswordCipher};
pub use key_provider::{Ed25519KeyProvider, KeyMaterial, KeyProvider};
pub use ledger::{InMemoryLedger, LedgerOracle};
