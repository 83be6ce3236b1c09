//! Credential Records: the per-user master-password hash.

use crate::error::StorageResult;
use sealbox_types::UserId;
use serde::{Deserialize, Serialize};

/// Per-user second-factor credential. Created at registration, replaced
/// wholesale on password reset, read-only otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: UserId,
    /// Argon2id PHC string. `None` means the user never set a master
    /// password; the gate treats that the same as a wrong password.
    pub master_password_hash: Option<String>,
    pub updated_at: i64,
}

/// Store contract for Credential Records.
pub trait CredentialStore: Send + Sync {
    fn get_credential(&self, user_id: &str) -> StorageResult<Option<CredentialRecord>>;

    fn put_credential(&self, record: &CredentialRecord) -> StorageResult<()>;
}
