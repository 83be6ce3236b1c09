//! Envelope encryption layer for Sealbox.
//!
//! Provides per-secret authenticated encryption using:
//! - scrypt for key derivation from caller-supplied secret material
//! - AES-256-GCM (16-byte IV) for authenticated encryption
//! - Secure key handling with zeroization
//!
//! # Architecture
//!
//! Each encryption derives a fresh 32-byte key from `(secret_material, salt)`
//! with a random per-call salt, then encrypts under a random per-call IV. The
//! result is a four-field [`Envelope`] — ciphertext, IV, auth tag, salt — all
//! hex-encoded for storage. Nothing but the envelope and the original secret
//! material is needed to decrypt; derived keys are never persisted, never
//! cached, and are zeroized when the call completes.
//!
//! The pure [`seal`]/[`open`] functions do the work; [`EnvelopeCipher`] wraps
//! them with blocking-pool offload, a KDF timeout, and audit instrumentation.

mod envelope;
mod error;
mod key;

pub use envelope::{open, seal, CipherConfig, Envelope, EnvelopeCipher};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, DerivedKey, KdfCost, Salt, IV_SIZE, KEY_SIZE, SALT_SIZE, TAG_SIZE};
