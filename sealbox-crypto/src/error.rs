//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from envelope encryption and key derivation.
///
/// `Decryption` deliberately does not distinguish tag mismatch, IV
/// corruption, wrong key, or malformed hex — callers must not learn which
/// envelope component an attacker tampered with.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
