//! Test doubles: in-memory stores with call counters.

use sealbox_storage::{
    CredentialRecord, CredentialStore, SecretRecord, SecretStore, StorageError, StorageResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory secret store that counts calls and can be told to fail
/// bookkeeping updates.
#[derive(Default)]
pub struct CountingSecretStore {
    records: Mutex<HashMap<String, SecretRecord>>,
    pub get_calls: AtomicUsize,
    pub touch_calls: AtomicUsize,
    pub fail_touch: AtomicBool,
}

impl CountingSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: SecretRecord) {
        self.records.lock().unwrap().insert(record.id.clone(), record);
    }

    pub fn record(&self, id: &str) -> Option<SecretRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }
}

impl SecretStore for CountingSecretStore {
    fn get(&self, id: &str, owner_id: &str) -> StorageResult<Option<SecretRecord>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(id)
            .filter(|r| r.user_id == owner_id)
            .cloned())
    }

    fn put(&self, record: &SecretRecord) -> StorageResult<()> {
        self.insert(record.clone());
        Ok(())
    }

    fn touch_access(&self, id: &str) -> StorageResult<()> {
        self.touch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(StorageError::LockPoisoned);
        }
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(id) {
            record.access_count += 1;
            record.last_accessed_at = Some(1);
        }
        Ok(())
    }

    fn delete(&self, id: &str, owner_id: &str) -> StorageResult<bool> {
        let mut records = self.records.lock().unwrap();
        let owned = records.get(id).is_some_and(|r| r.user_id == owner_id);
        if owned {
            records.remove(id);
        }
        Ok(owned)
    }
}

/// In-memory credential store that counts lookups.
#[derive(Default)]
pub struct CountingCredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
    pub lookups: AtomicUsize,
}

impl CountingCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for CountingCredentialStore {
    fn get_credential(&self, user_id: &str) -> StorageResult<Option<CredentialRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(user_id).cloned())
    }

    fn put_credential(&self, record: &CredentialRecord) -> StorageResult<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.user_id.clone(), record.clone());
        Ok(())
    }
}
