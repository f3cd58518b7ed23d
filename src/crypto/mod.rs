pub mod encryption;
pub mod keys;
pub mod password;
pub mod session;

pub use encryption::*;
pub use keys::*;
pub use password::*;
pub use session::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Corrupted ciphertext")]
    CorruptedCiphertext,

    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Invalid session token")]
    InvalidSession,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session lifetime out of range")]
    SessionLifetime,

    #[error("Signing key rejected")]
    SigningKey,

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
