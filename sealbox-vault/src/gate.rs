//! Master-password gate: the second factor for data access.
//!
//! Independent of the login credential — a session cookie gets a user into
//! the app, but only this gate lets them decrypt stored secrets.

use crate::error::{VaultError, VaultResult};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use sealbox_storage::CredentialStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hashes a master password for storage (argon2id PHC string).
pub fn hash_master_password(password: &str) -> VaultResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            warn!("master password hashing failed: {e}");
            VaultError::Hashing
        })
}

/// Verifies a candidate master password against the stored credential.
pub struct MasterPasswordGate {
    credentials: Arc<dyn CredentialStore>,
}

impl MasterPasswordGate {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Returns whether `candidate` matches the user's stored hash.
    ///
    /// Missing user, absent hash, unparsable hash, and lookup errors all
    /// return plain `false` — to a caller, "no such profile" is
    /// indistinguishable from "wrong password". The candidate is never
    /// logged.
    ///
    /// Known limitation: the lookup-miss path performs no hash computation,
    /// so it returns faster than a hash mismatch. This matches the observed
    /// behavior of the system the stored hashes come from and is not
    /// mitigated here.
    pub async fn validate(&self, user_id: &str, candidate: &str) -> bool {
        let credentials = self.credentials.clone();
        let lookup_id = user_id.to_string();
        let looked_up =
            tokio::task::spawn_blocking(move || credentials.get_credential(&lookup_id)).await;

        let record = match looked_up {
            Ok(Ok(Some(record))) => record,
            Ok(Ok(None)) => return false,
            Ok(Err(e)) => {
                debug!("credential lookup failed for gate check: {e}");
                return false;
            }
            Err(e) => {
                warn!("credential lookup task panicked: {e}");
                return false;
            }
        };

        let Some(stored_hash) = record.master_password_hash else {
            return false;
        };

        let candidate = candidate.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            match PasswordHash::new(&stored_hash) {
                // verify_password does its own constant-time comparison.
                Ok(parsed) => Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok(),
                Err(e) => {
                    debug!("stored master-password hash unparsable: {e}");
                    false
                }
            }
        })
        .await;

        verified.unwrap_or(false)
    }
}
