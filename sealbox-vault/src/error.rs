//! Vault error taxonomy.
//!
//! Display strings are what callers may show to end users. They stay
//! deliberately generic: `Decryption` never says which envelope component
//! failed, and `InvalidMasterPassword` reads the same whether the user had
//! no credential record or supplied the wrong password. Raw detail goes to
//! audit metadata only.

use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Secret absent or owned by someone else. A normal request outcome,
    /// not a security event.
    #[error("secret not found")]
    NotFound,

    /// A Secret Record is missing required envelope fields. Detected before
    /// any cryptographic operation is attempted.
    #[error("secret record is corrupt")]
    CorruptRecord { missing: Vec<&'static str> },

    #[error("invalid master password")]
    InvalidMasterPassword,

    #[error("failed to decrypt secret")]
    Decryption,

    #[error("failed to encrypt secret")]
    Encryption,

    #[error("master password too short (min 8 characters)")]
    PasswordTooShort,

    #[error("master password hashing failed")]
    Hashing,

    #[error("storage error: {0}")]
    Storage(String),
}
