//! DuckDB storage layer for Sealbox.
//!
//! Persists Secret Records (envelope + metadata + access bookkeeping),
//! Credential Records (per-user master-password hash), and the append-only
//! audit log. The vault consumes the [`SecretStore`] and [`CredentialStore`]
//! traits; [`DuckdbStore`] is the concrete backing for all of them.
//!
//! Envelope columns are stored exactly as the cipher produced them — four
//! hex text fields written and read as a unit.

mod credential_store;
mod duckdb_store;
mod error;
mod secret_store;

pub use credential_store::{CredentialRecord, CredentialStore};
pub use duckdb_store::DuckdbStore;
pub use error::{StorageError, StorageResult};
pub use secret_store::{SecretRecord, SecretStore};

/// Current time as epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
