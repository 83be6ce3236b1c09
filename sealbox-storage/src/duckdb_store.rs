//! DuckDB-backed store for secrets, credentials, and the audit log.

use crate::credential_store::{CredentialRecord, CredentialStore};
use crate::error::{StorageError, StorageResult};
use crate::secret_store::{SecretRecord, SecretStore};
use crate::now_millis;
use chrono::TimeZone;
use duckdb::{params, Connection};
use sealbox_audit::{AuditEvent, AuditStore, AuditStoreError};
use sealbox_crypto::Envelope;
use sealbox_types::{SecretKind, SecretMetadata};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Single-connection DuckDB store shared behind a mutex.
#[derive(Clone)]
pub struct DuckdbStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        // Cap memory/threads — DuckDB defaults to ~80% RAM per connection
        conn.execute_batch("PRAGMA memory_limit='64MB'; PRAGMA threads=1;")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS secrets (
                id VARCHAR PRIMARY KEY,
                user_id VARCHAR NOT NULL,
                name VARCHAR NOT NULL,
                kind VARCHAR NOT NULL,
                description VARCHAR,
                expires_at BIGINT,
                encrypted_value VARCHAR NOT NULL,
                iv VARCHAR NOT NULL,
                auth_tag VARCHAR NOT NULL,
                salt VARCHAR NOT NULL,
                last_accessed_at BIGINT,
                access_count BIGINT NOT NULL DEFAULT 0,
                created_at BIGINT NOT NULL,
                modified_at BIGINT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS credentials (
                user_id VARCHAR PRIMARY KEY,
                master_password_hash VARCHAR,
                updated_at BIGINT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS audit_log (
                action VARCHAR NOT NULL,
                success BOOLEAN NOT NULL,
                duration_ms BIGINT NOT NULL,
                user_id VARCHAR,
                resource_type VARCHAR,
                resource_id VARCHAR,
                ip_address VARCHAR,
                user_agent VARCHAR,
                metadata VARCHAR NOT NULL,
                timestamp BIGINT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Most recent audit events, newest first. Inspection helper for tests
    /// and diagnostics; the write contract is [`AuditStore`].
    pub fn recent_audit_events(&self, limit: usize) -> StorageResult<Vec<AuditEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT action, success, duration_ms, user_id, resource_type, resource_id,
                    ip_address, user_agent, metadata, timestamp
             FROM audit_log ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )?;

        let events = stmt
            .query_map(params![limit as i64], |row| {
                let metadata_json: String = row.get(8)?;
                let timestamp_ms: i64 = row.get(9)?;
                Ok(AuditEvent {
                    action: row.get(0)?,
                    success: row.get(1)?,
                    duration_ms: row.get::<_, i64>(2)? as u64,
                    user_id: row.get(3)?,
                    resource_type: row.get(4)?,
                    resource_id: row.get(5)?,
                    ip_address: row.get(6)?,
                    user_agent: row.get(7)?,
                    metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
                    timestamp: chrono::Utc
                        .timestamp_millis_opt(timestamp_ms)
                        .single()
                        .unwrap_or_else(chrono::Utc::now),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(events)
    }
}

impl SecretStore for DuckdbStore {
    fn get(&self, id: &str, owner_id: &str) -> StorageResult<Option<SecretRecord>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT id, user_id, name, kind, description, expires_at,
                    encrypted_value, iv, auth_tag, salt,
                    last_accessed_at, access_count, created_at, modified_at
             FROM secrets WHERE id = ? AND user_id = ?",
            params![id, owner_id],
            |row| {
                let kind: String = row.get(3)?;
                Ok(SecretRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    metadata: SecretMetadata {
                        name: row.get(2)?,
                        kind: kind.parse().unwrap_or(SecretKind::Other),
                        description: row.get(4)?,
                        expires_at: row.get(5)?,
                    },
                    envelope: Envelope {
                        encrypted_value: row.get(6)?,
                        iv: row.get(7)?,
                        auth_tag: row.get(8)?,
                        salt: row.get(9)?,
                    },
                    last_accessed_at: row.get(10)?,
                    access_count: row.get(11)?,
                    created_at: row.get(12)?,
                    modified_at: row.get(13)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, record: &SecretRecord) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO secrets (
                id, user_id, name, kind, description, expires_at,
                encrypted_value, iv, auth_tag, salt,
                last_accessed_at, access_count, created_at, modified_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                COALESCE((SELECT created_at FROM secrets WHERE id = ?), ?), ?)",
            params![
                record.id,
                record.user_id,
                record.metadata.name,
                record.metadata.kind.to_string(),
                record.metadata.description,
                record.metadata.expires_at,
                record.envelope.encrypted_value,
                record.envelope.iv,
                record.envelope.auth_tag,
                record.envelope.salt,
                record.last_accessed_at,
                record.access_count,
                record.id,
                record.created_at,
                record.modified_at,
            ],
        )?;
        Ok(())
    }

    fn touch_access(&self, id: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE secrets
             SET last_accessed_at = ?, access_count = access_count + 1
             WHERE id = ?",
            params![now_millis(), id],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str, owner_id: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM secrets WHERE id = ? AND user_id = ?",
            params![id, owner_id],
        )?;
        Ok(affected > 0)
    }
}

impl CredentialStore for DuckdbStore {
    fn get_credential(&self, user_id: &str) -> StorageResult<Option<CredentialRecord>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT user_id, master_password_hash, updated_at
             FROM credentials WHERE user_id = ?",
            params![user_id],
            |row| {
                Ok(CredentialRecord {
                    user_id: row.get(0)?,
                    master_password_hash: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_credential(&self, record: &CredentialRecord) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO credentials (user_id, master_password_hash, updated_at)
             VALUES (?, ?, ?)",
            params![record.user_id, record.master_password_hash, record.updated_at],
        )?;
        Ok(())
    }
}

impl AuditStore for DuckdbStore {
    fn append(&self, event: &AuditEvent) -> Result<(), AuditStoreError> {
        let metadata = serde_json::to_string(&event.metadata)
            .map_err(|e| AuditStoreError(e.to_string()))?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| AuditStoreError("connection lock poisoned".into()))?;
        conn.execute(
            "INSERT INTO audit_log (
                action, success, duration_ms, user_id, resource_type, resource_id,
                ip_address, user_agent, metadata, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                event.action,
                event.success,
                event.duration_ms as i64,
                event.user_id,
                event.resource_type,
                event.resource_id,
                event.ip_address,
                event.user_agent,
                metadata,
                event.timestamp.timestamp_millis(),
            ],
        )
        .map_err(|e| AuditStoreError(e.to_string()))?;
        Ok(())
    }
}
