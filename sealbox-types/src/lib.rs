//! Shared types for Sealbox.
//!
//! Identifiers, secret metadata, and the best-effort request context that
//! flows into audit events. Kept dependency-light so every crate can use it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a stored secret (UUID v4 as string).
pub type SecretId = String;

/// Stable identifier of a user. Doubles as the secret material for the
/// envelope KDF — callers never pass passwords here.
pub type UserId = String;

/// Category of a stored secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKind {
    Password,
    ApiKey,
    Note,
    Certificate,
    Other,
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SecretKind::Password => "password",
            SecretKind::ApiKey => "api_key",
            SecretKind::Note => "note",
            SecretKind::Certificate => "certificate",
            SecretKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for SecretKind {
    type Err = std::convert::Infallible;

    /// Unknown kinds map to `Other` so legacy rows always load.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "password" => SecretKind::Password,
            "api_key" => SecretKind::ApiKey,
            "note" => SecretKind::Note,
            "certificate" => SecretKind::Certificate,
            _ => SecretKind::Other,
        })
    }
}

/// Descriptive metadata attached to a secret (never encrypted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub name: String,
    pub kind: SecretKind,
    pub description: Option<String>,
    /// Expiry as epoch milliseconds, if the secret expires.
    pub expires_at: Option<i64>,
}

impl SecretMetadata {
    pub fn new(name: impl Into<String>, kind: SecretKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            expires_at: None,
        }
    }
}

/// Best-effort requester attribution for audit events.
///
/// `None` means "unknown" — attribution must never block an operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn unknown() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_kind_roundtrips_through_display() {
        for kind in [
            SecretKind::Password,
            SecretKind::ApiKey,
            SecretKind::Note,
            SecretKind::Certificate,
            SecretKind::Other,
        ] {
            let parsed: SecretKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_kind_parses_as_other() {
        let parsed: SecretKind = "ssh_key".parse().unwrap();
        assert_eq!(parsed, SecretKind::Other);
    }

    #[test]
    fn secret_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&SecretKind::ApiKey).unwrap();
        assert_eq!(json, "\"api_key\"");
    }
}
