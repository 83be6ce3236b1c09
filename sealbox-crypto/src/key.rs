//! Key derivation: scrypt over `(secret_material, salt)`.

use crate::error::{CryptoError, CryptoResult};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Derived key length in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// KDF salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// AES-GCM IV length in bytes. The persisted format uses a 128-bit IV.
pub const IV_SIZE: usize = 16;

/// GCM authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// scrypt cost parameters.
///
/// Fields are public so tests can substitute cheap parameters; production
/// code should use [`KdfCost::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfCost {
    /// log2 of the CPU/memory cost (N = 2^log_n).
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl Default for KdfCost {
    /// N=16384, r=8, p=1 — the cost the stored envelopes were produced with.
    fn default() -> Self {
        Self { log_n: 14, r: 8, p: 1 }
    }
}

impl KdfCost {
    /// Deliberately weak parameters for tests. Never use for real secrets.
    pub fn fast() -> Self {
        Self { log_n: 4, r: 8, p: 1 }
    }

    fn params(&self) -> CryptoResult<scrypt::Params> {
        scrypt::Params::new(self.log_n, self.r, self.p, KEY_SIZE)
            .map_err(|e| CryptoError::KeyDerivation(format!("invalid scrypt params: {e}")))
    }
}

/// Random per-encryption KDF salt. Not secret itself, but never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A derived 32-byte key. Zeroized on drop; exists only for the duration of
/// one encrypt/decrypt call.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Derives a 32-byte key from secret material and a salt via scrypt.
pub fn derive_key(secret_material: &str, salt: &Salt, cost: &KdfCost) -> CryptoResult<DerivedKey> {
    let params = cost.params()?;
    let mut out = [0u8; KEY_SIZE];
    scrypt::scrypt(secret_material.as_bytes(), salt.as_bytes(), &params, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(format!("scrypt failed: {e}")))?;
    Ok(DerivedKey(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_material_and_salt_derive_same_key() {
        let salt = Salt::random();
        let a = derive_key("user-42", &salt, &KdfCost::fast()).unwrap();
        let b = derive_key("user-42", &salt, &KdfCost::fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salt_derives_different_key() {
        let a = derive_key("user-42", &Salt::random(), &KdfCost::fast()).unwrap();
        let b = derive_key("user-42", &Salt::random(), &KdfCost::fast()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_material_derives_different_key() {
        let salt = Salt::random();
        let a = derive_key("user-42", &salt, &KdfCost::fast()).unwrap();
        let b = derive_key("user-43", &salt, &KdfCost::fast()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn random_salts_differ() {
        assert_ne!(Salt::random().as_bytes(), Salt::random().as_bytes());
    }
}
