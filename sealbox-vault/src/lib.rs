//! Secret vault for Sealbox.
//!
//! Composes the master-password gate and the envelope cipher into the
//! externally visible secret operations. The write path (create/update)
//! encrypts directly; the reveal path verifies the master password first and
//! only then decrypts. The vault owns all I/O ordering and produces the full
//! audit trail; plaintext is returned on exactly one path.

mod error;
mod gate;
mod vault;

pub use error::{VaultError, VaultResult};
pub use gate::{hash_master_password, MasterPasswordGate};
pub use vault::{RevealRequest, SecretVault};
