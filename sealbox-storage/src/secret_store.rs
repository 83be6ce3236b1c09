//! Secret Records and the store contract the vault consumes.

use crate::error::StorageResult;
use sealbox_crypto::Envelope;
use sealbox_types::{SecretId, SecretMetadata, UserId};
use serde::{Deserialize, Serialize};

/// One persisted secret: envelope, descriptive metadata, access bookkeeping.
///
/// The four envelope fields are a unit — a record with any of them empty is
/// corrupt and must never be decrypted. Updates replace the envelope
/// wholesale; there is no partial re-encryption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: SecretId,
    pub user_id: UserId,
    pub metadata: SecretMetadata,
    pub envelope: Envelope,
    /// Epoch millis of the last successful reveal, if any.
    pub last_accessed_at: Option<i64>,
    pub access_count: i64,
    pub created_at: i64,
    pub modified_at: i64,
}

/// Store contract for Secret Records.
///
/// Reads and deletes are ownership-scoped: a record owned by a different
/// user is indistinguishable from an absent one.
pub trait SecretStore: Send + Sync {
    fn get(&self, id: &str, owner_id: &str) -> StorageResult<Option<SecretRecord>>;

    /// Creates or fully replaces a record. `created_at` of an existing row
    /// is preserved.
    fn put(&self, record: &SecretRecord) -> StorageResult<()>;

    /// Best-effort access bookkeeping: bumps `last_accessed_at` and
    /// increments `access_count`. Advisory only; last write wins under
    /// concurrent reveals.
    fn touch_access(&self, id: &str) -> StorageResult<()>;

    /// Deletes a record scoped to its owner. Returns whether a row existed.
    fn delete(&self, id: &str, owner_id: &str) -> StorageResult<bool>;
}
