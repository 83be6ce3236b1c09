//! The four-field envelope and the audited cipher around it.
//!
//! `seal`/`open` are pure: given the same inputs, `open` always produces the
//! same output, with no hidden state and no key caching. [`EnvelopeCipher`]
//! adds what a request path needs — blocking-pool offload for the
//! intentionally slow KDF, a bounded timeout, and one audit event per call.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, KdfCost, Salt, IV_SIZE, SALT_SIZE, TAG_SIZE};
use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Key, Nonce};
use sealbox_audit::{AuditEvent, AuditSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// AES-256-GCM with a 128-bit nonce, matching the persisted 16-byte IV.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Hex-encoded envelope as persisted by the storage layer.
///
/// The four fields are always written and read together; an envelope with
/// any field empty is corrupt and must never reach [`open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// AEAD output excluding the tag, hex.
    pub encrypted_value: String,
    /// 16 bytes, hex. Fresh per encryption.
    pub iv: String,
    /// 16-byte GCM tag, hex.
    pub auth_tag: String,
    /// 16-byte KDF salt, hex. Fresh per encryption.
    pub salt: String,
}

/// Encrypts a plaintext under a key derived from `secret_material`.
///
/// IV and salt are independently random per call, so two seals of the same
/// plaintext under the same material never repeat an IV, salt, or ciphertext.
pub fn seal(plaintext: &str, secret_material: &str, cost: &KdfCost) -> CryptoResult<Envelope> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    let salt = Salt::random();

    let key = derive_key(secret_material, &salt, cost)?;
    let cipher = Aes256Gcm16::new(Key::<Aes256Gcm16>::from_slice(key.as_bytes()));

    let mut combined = cipher
        .encrypt(Nonce::<U16>::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("cipher failed: {e}")))?;
    let tag = combined.split_off(combined.len() - TAG_SIZE);

    Ok(Envelope {
        encrypted_value: hex::encode(&combined),
        iv: hex::encode(iv),
        auth_tag: hex::encode(&tag),
        salt: hex::encode(salt.as_bytes()),
    })
}

/// Decrypts an envelope, verifying the tag in the same pass.
///
/// Every failure — malformed hex, wrong material, any corruption of the
/// ciphertext, IV, or tag — surfaces as the same `Decryption` error. Never
/// returns partial or garbage plaintext.
pub fn open(envelope: &Envelope, secret_material: &str, cost: &KdfCost) -> CryptoResult<String> {
    let mut combined = decode_hex("encrypted_value", &envelope.encrypted_value)?;
    let iv = decode_fixed::<IV_SIZE>("iv", &envelope.iv)?;
    let tag = decode_fixed::<TAG_SIZE>("auth_tag", &envelope.auth_tag)?;
    let salt = Salt::from_bytes(decode_fixed::<SALT_SIZE>("salt", &envelope.salt)?);

    let key = derive_key(secret_material, &salt, cost)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;
    let cipher = Aes256Gcm16::new(Key::<Aes256Gcm16>::from_slice(key.as_bytes()));

    // GCM expects ciphertext || tag in one buffer.
    combined.extend_from_slice(&tag);
    let plaintext = cipher
        .decrypt(Nonce::<U16>::from_slice(&iv), combined.as_slice())
        .map_err(|_| {
            CryptoError::Decryption("authentication failed (wrong key or tampered envelope)".into())
        })?;

    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".into()))
}

fn decode_hex(field: &str, value: &str) -> CryptoResult<Vec<u8>> {
    hex::decode(value).map_err(|_| CryptoError::Decryption(format!("malformed hex in {field}")))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> CryptoResult<[u8; N]> {
    let bytes = decode_hex(field, value)?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::Decryption(format!("unexpected length for {field}")))
}

/// Immutable cipher configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct CipherConfig {
    pub kdf_cost: KdfCost,
    /// Bound on one key-derivation offload. scrypt is intentionally slow;
    /// without a cap a flood of reveals could pin the blocking pool.
    pub kdf_timeout: Duration,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            kdf_cost: KdfCost::default(),
            kdf_timeout: Duration::from_secs(5),
        }
    }
}

/// Audited envelope cipher.
///
/// Emits exactly one audit event per `encrypt`/`decrypt` call with the
/// action, outcome, and duration. Holds only the [`AuditSink`] capability,
/// never a concrete store.
pub struct EnvelopeCipher {
    config: CipherConfig,
    audit: Arc<dyn AuditSink>,
}

impl EnvelopeCipher {
    pub fn new(config: CipherConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self { config, audit }
    }

    /// Encrypts `plaintext` under `secret_material`, returning the envelope.
    pub async fn encrypt(&self, plaintext: &str, secret_material: &str) -> CryptoResult<Envelope> {
        let started = Instant::now();
        let cost = self.config.kdf_cost;
        let plaintext = plaintext.to_string();
        let material = secret_material.to_string();

        let result = self
            .run_bounded(move || seal(&plaintext, &material, &cost))
            .await;

        match result {
            Ok(envelope) => {
                self.audit
                    .record(AuditEvent::new("encrypt", true, started.elapsed()));
                Ok(envelope)
            }
            Err(e) => {
                self.audit.record(
                    AuditEvent::new("encrypt", false, started.elapsed())
                        .meta("error", e.to_string()),
                );
                Err(CryptoError::Encryption(e.to_string()))
            }
        }
    }

    /// Decrypts an envelope, returning the original plaintext.
    pub async fn decrypt(&self, envelope: &Envelope, secret_material: &str) -> CryptoResult<String> {
        let started = Instant::now();
        let cost = self.config.kdf_cost;
        let envelope = envelope.clone();
        let material = secret_material.to_string();

        let result = self
            .run_bounded(move || open(&envelope, &material, &cost))
            .await;

        match result {
            Ok(plaintext) => {
                self.audit
                    .record(AuditEvent::new("decrypt", true, started.elapsed()));
                Ok(plaintext)
            }
            Err(e) => {
                self.audit.record(
                    AuditEvent::new("decrypt", false, started.elapsed())
                        .meta("error", e.to_string()),
                );
                Err(CryptoError::Decryption(e.to_string()))
            }
        }
    }

    /// Runs a KDF-bearing closure on the blocking pool under the configured
    /// timeout. On timeout the blocking task keeps running to completion;
    /// only the waiter gives up.
    async fn run_bounded<T: Send + 'static>(
        &self,
        f: impl FnOnce() -> CryptoResult<T> + Send + 'static,
    ) -> CryptoResult<T> {
        let handle = tokio::task::spawn_blocking(f);
        match tokio::time::timeout(self.config.kdf_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                warn!("key derivation task panicked: {join_err}");
                Err(CryptoError::KeyDerivation(
                    "key derivation task panicked".into(),
                ))
            }
            Err(_) => Err(CryptoError::KeyDerivation(format!(
                "key derivation timed out after {:?}",
                self.config.kdf_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost() -> KdfCost {
        KdfCost::fast()
    }

    #[test]
    fn envelope_serde_uses_persisted_field_names() {
        let envelope = seal("pw", "user-1", &cost()).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        for field in ["encrypted_value", "iv", "auth_tag", "salt"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn decoded_field_lengths_are_fixed() {
        let envelope = seal("some plaintext", "user-1", &cost()).unwrap();
        assert_eq!(hex::decode(&envelope.iv).unwrap().len(), IV_SIZE);
        assert_eq!(hex::decode(&envelope.auth_tag).unwrap().len(), TAG_SIZE);
        assert_eq!(hex::decode(&envelope.salt).unwrap().len(), SALT_SIZE);
    }
}
