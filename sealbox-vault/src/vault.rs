//! The vault: write path, reveal orchestration, audit composition.

use crate::error::{VaultError, VaultResult};
use crate::gate::{hash_master_password, MasterPasswordGate};
use sealbox_audit::{AuditEvent, AuditSink};
use sealbox_crypto::{CipherConfig, Envelope, EnvelopeCipher};
use sealbox_storage::{CredentialRecord, CredentialStore, SecretRecord, SecretStore};
use sealbox_types::{RequestContext, SecretId, SecretMetadata, UserId};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// One reveal attempt: which secret, on whose behalf, with what second
/// factor, and the best-effort requester attribution for the audit trail.
#[derive(Clone)]
pub struct RevealRequest {
    pub secret_id: SecretId,
    pub user_id: UserId,
    pub master_password: String,
    pub context: RequestContext,
}

impl std::fmt::Debug for RevealRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealRequest")
            .field("secret_id", &self.secret_id)
            .field("user_id", &self.user_id)
            .field("master_password", &"<redacted>")
            .field("context", &self.context)
            .finish()
    }
}

/// Orchestrates secret operations over the gate, the cipher, and the stores.
///
/// Owns all I/O ordering. Within one reveal the gate check strictly precedes
/// decryption; the cipher is never invoked when the gate fails. The owner's
/// stable user id is the secret material for the envelope KDF — this is the
/// only layer that makes that decision.
pub struct SecretVault {
    secrets: Arc<dyn SecretStore>,
    credentials: Arc<dyn CredentialStore>,
    gate: MasterPasswordGate,
    cipher: EnvelopeCipher,
    audit: Arc<dyn AuditSink>,
}

impl SecretVault {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        credentials: Arc<dyn CredentialStore>,
        cipher_config: CipherConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            secrets,
            gate: MasterPasswordGate::new(credentials.clone()),
            credentials,
            cipher: EnvelopeCipher::new(cipher_config, audit.clone()),
            audit,
        }
    }

    /// Creates a secret. No master-password check — writing requires only a
    /// logged-in owner.
    pub async fn create_secret(
        &self,
        user_id: &str,
        metadata: SecretMetadata,
        plaintext: &str,
        context: &RequestContext,
    ) -> VaultResult<SecretRecord> {
        let started = Instant::now();
        let envelope = self
            .cipher
            .encrypt(plaintext, user_id)
            .await
            .map_err(|_| VaultError::Encryption)?;

        let now = now_millis();
        let record = SecretRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            metadata,
            envelope,
            last_accessed_at: None,
            access_count: 0,
            created_at: now,
            modified_at: now,
        };

        self.put_record(record.clone()).await?;
        self.audit.record(
            AuditEvent::new("create_key", true, started.elapsed())
                .user(user_id)
                .resource(record.metadata.kind.to_string(), record.id.clone())
                .requester(context.ip_address.clone(), context.user_agent.clone()),
        );
        Ok(record)
    }

    /// Updates a secret. The envelope is fully replaced — never a partial
    /// re-encryption.
    pub async fn update_secret(
        &self,
        secret_id: &str,
        user_id: &str,
        metadata: SecretMetadata,
        plaintext: &str,
        context: &RequestContext,
    ) -> VaultResult<SecretRecord> {
        let started = Instant::now();
        let existing = self.fetch_record(secret_id, user_id).await?;

        let envelope = self
            .cipher
            .encrypt(plaintext, user_id)
            .await
            .map_err(|_| VaultError::Encryption)?;

        let record = SecretRecord {
            metadata,
            envelope,
            modified_at: now_millis(),
            ..existing
        };

        self.put_record(record.clone()).await?;
        self.audit.record(
            AuditEvent::new("update_key", true, started.elapsed())
                .user(user_id)
                .resource(record.metadata.kind.to_string(), record.id.clone())
                .requester(context.ip_address.clone(), context.user_agent.clone()),
        );
        Ok(record)
    }

    /// Reveals a secret's plaintext.
    ///
    /// Fetch → validate envelope fields → gate check → decrypt → bookkeeping.
    /// Plaintext is returned on exactly this one path; every failure exit
    /// maps to a distinct [`VaultError`] kind and (except `NotFound`) emits a
    /// `reveal_key_failed` audit event.
    pub async fn reveal(&self, req: RevealRequest) -> VaultResult<String> {
        let started = Instant::now();

        // FetchRecord — absence is a normal outcome, no audit event.
        let record = self.fetch_record(&req.secret_id, &req.user_id).await?;

        // ValidateEnvelopeFields — before any cryptographic work.
        let missing = missing_envelope_fields(&record.envelope);
        if !missing.is_empty() {
            self.audit.record(
                self.reveal_failure_event(&req, &record, started)
                    .meta("reason", "corrupt_record")
                    .meta(
                        "missing",
                        missing.iter().map(|f| (*f).into()).collect::<Vec<serde_json::Value>>(),
                    ),
            );
            return Err(VaultError::CorruptRecord { missing });
        }

        // CheckMasterPassword — strictly precedes decryption.
        if !self.gate.validate(&req.user_id, &req.master_password).await {
            self.audit.record(
                self.reveal_failure_event(&req, &record, started)
                    .meta("reason", "invalid_master_password"),
            );
            return Err(VaultError::InvalidMasterPassword);
        }

        // Decrypt — the owner's stable id is the secret material.
        let plaintext = match self.cipher.decrypt(&record.envelope, &req.user_id).await {
            Ok(plaintext) => plaintext,
            Err(e) => {
                self.audit.record(
                    self.reveal_failure_event(&req, &record, started)
                        .meta("reason", "decryption_error")
                        .meta("error", e.to_string()),
                );
                return Err(VaultError::Decryption);
            }
        };

        // UpdateAccessBookkeeping — advisory; the plaintext has already been
        // computed and is returned regardless.
        let secrets = self.secrets.clone();
        let id = record.id.clone();
        match tokio::task::spawn_blocking(move || secrets.touch_access(&id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("access bookkeeping update failed for {}: {e}", record.id),
            Err(e) => warn!("access bookkeeping task panicked: {e}"),
        }

        self.audit.record(
            AuditEvent::new("reveal_key", true, started.elapsed())
                .user(&req.user_id)
                .resource(record.metadata.kind.to_string(), record.id.clone())
                .requester(req.context.ip_address.clone(), req.context.user_agent.clone()),
        );
        Ok(plaintext)
    }

    /// Deletes a secret, scoped to its owner.
    pub async fn delete_secret(
        &self,
        secret_id: &str,
        user_id: &str,
        context: &RequestContext,
    ) -> VaultResult<()> {
        let started = Instant::now();
        let secrets = self.secrets.clone();
        let id = secret_id.to_string();
        let owner = user_id.to_string();
        let deleted = run_store(move || secrets.delete(&id, &owner)).await?;
        if !deleted {
            return Err(VaultError::NotFound);
        }
        self.audit.record(
            AuditEvent::new("delete_key", true, started.elapsed())
                .user(user_id)
                .resource("secret", secret_id)
                .requester(context.ip_address.clone(), context.user_agent.clone()),
        );
        Ok(())
    }

    /// Sets (or resets) the user's master password. Replaces the credential
    /// record wholesale.
    pub async fn set_master_password(&self, user_id: &str, password: &str) -> VaultResult<()> {
        if password.len() < 8 {
            return Err(VaultError::PasswordTooShort);
        }
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_master_password(&password))
            .await
            .map_err(|e| VaultError::Storage(format!("hashing task panicked: {e}")))??;

        let credentials = self.credentials.clone();
        let record = CredentialRecord {
            user_id: user_id.to_string(),
            master_password_hash: Some(hash),
            updated_at: now_millis(),
        };
        run_store(move || credentials.put_credential(&record)).await
    }

    async fn fetch_record(&self, secret_id: &str, user_id: &str) -> VaultResult<SecretRecord> {
        let secrets = self.secrets.clone();
        let id = secret_id.to_string();
        let owner = user_id.to_string();
        run_store(move || secrets.get(&id, &owner))
            .await?
            .ok_or(VaultError::NotFound)
    }

    async fn put_record(&self, record: SecretRecord) -> VaultResult<()> {
        let secrets = self.secrets.clone();
        run_store(move || secrets.put(&record)).await
    }

    fn reveal_failure_event(
        &self,
        req: &RevealRequest,
        record: &SecretRecord,
        started: Instant,
    ) -> AuditEvent {
        AuditEvent::new("reveal_key_failed", false, started.elapsed())
            .user(&req.user_id)
            .resource(record.metadata.kind.to_string(), record.id.clone())
            .requester(req.context.ip_address.clone(), req.context.user_agent.clone())
    }
}

/// Names of envelope fields that are absent or empty. All four are required;
/// legacy rows without a salt are treated as corrupt rather than guessed at.
fn missing_envelope_fields(envelope: &Envelope) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if envelope.encrypted_value.is_empty() {
        missing.push("encrypted_value");
    }
    if envelope.iv.is_empty() {
        missing.push("iv");
    }
    if envelope.auth_tag.is_empty() {
        missing.push("auth_tag");
    }
    if envelope.salt.is_empty() {
        missing.push("salt");
    }
    missing
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Runs a blocking store call off the async path, folding task failures into
/// the storage error kind.
async fn run_store<T: Send + 'static>(
    f: impl FnOnce() -> sealbox_storage::StorageResult<T> + Send + 'static,
) -> VaultResult<T> {
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(VaultError::Storage(e.to_string())),
        Err(e) => Err(VaultError::Storage(format!("storage task panicked: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: &str, iv: &str, tag: &str, salt: &str) -> Envelope {
        Envelope {
            encrypted_value: value.into(),
            iv: iv.into(),
            auth_tag: tag.into(),
            salt: salt.into(),
        }
    }

    #[test]
    fn complete_envelope_has_no_missing_fields() {
        let env = envelope("aa", "bb", "cc", "dd");
        assert!(missing_envelope_fields(&env).is_empty());
    }

    #[test]
    fn empty_fields_are_reported_by_name() {
        let env = envelope("aa", "", "", "dd");
        assert_eq!(missing_envelope_fields(&env), vec!["iv", "auth_tag"]);
    }

    #[test]
    fn empty_ciphertext_is_treated_as_corrupt() {
        // The cipher itself round-trips empty plaintexts, but a persisted
        // record with an empty ciphertext column is refused before any
        // cryptographic work.
        let env = envelope("", "bb", "cc", "dd");
        assert_eq!(missing_envelope_fields(&env), vec!["encrypted_value"]);
    }
}
