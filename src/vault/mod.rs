//! Standalone local vault: per-user encrypted intake records kept on disk,
//! with their own credentials and no network access.

pub mod store;
pub mod view;

pub use store::*;
pub use view::*;

use thiserror::Error;

use crate::crypto::CryptoError;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Username must be at least 3 characters")]
    UsernameTooShort,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("No form is open")]
    NotEditing,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Vault data corrupted: {0}")]
    Corrupted(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Vault I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vault serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
