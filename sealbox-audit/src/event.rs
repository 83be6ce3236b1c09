//! Audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// One append-only audit record.
///
/// `user_id` is nullable because some failures happen before identity
/// resolution. `ip_address`/`user_agent` are best-effort attribution.
/// `metadata` always carries a derived `risk_score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: String,
    pub success: bool,
    pub duration_ms: u64,
    pub user_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped with the current time and a risk score
    /// derived from the action/outcome pair.
    pub fn new(action: impl Into<String>, success: bool, duration: Duration) -> Self {
        let action = action.into();
        let mut metadata = Map::new();
        metadata.insert(
            "risk_score".to_string(),
            Value::from(risk_score(&action, success)),
        );
        Self {
            action,
            success,
            duration_ms: duration.as_millis() as u64,
            user_id: None,
            resource_type: None,
            resource_id: None,
            ip_address: None,
            user_agent: None,
            metadata,
            timestamp: Utc::now(),
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn requester(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Adds a free-form metadata entry. Raw error detail belongs here, never
    /// in user-facing responses.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Fixed risk heuristic for an action/outcome pair.
///
/// Failed reveals score highest (someone is probing secrets they cannot
/// open), failed decrypts next, routine successful reads lowest.
pub fn risk_score(action: &str, success: bool) -> u8 {
    match (action, success) {
        ("reveal_key_failed", _) => 75,
        ("decrypt", false) => 60,
        ("encrypt", false) => 45,
        ("delete_key", _) => 30,
        ("reveal_key", true) => 25,
        ("update_key", _) => 15,
        (_, false) => 40,
        _ => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_event_carries_risk_score_in_metadata() {
        let event = AuditEvent::new("reveal_key_failed", false, Duration::from_millis(12));
        assert_eq!(
            event.metadata.get("risk_score").and_then(Value::as_u64),
            Some(75)
        );
        assert_eq!(event.duration_ms, 12);
        assert!(event.user_id.is_none());
    }

    #[test]
    fn failed_operations_score_higher_than_successes() {
        assert!(risk_score("decrypt", false) > risk_score("decrypt", true));
        assert!(risk_score("encrypt", false) > risk_score("encrypt", true));
    }

    #[test]
    fn builder_setters_populate_attribution() {
        let event = AuditEvent::new("encrypt", true, Duration::ZERO)
            .user("user-1")
            .resource("api_key", "secret-9")
            .requester(Some("10.0.0.1".into()), None)
            .meta("error", "boom");
        assert_eq!(event.user_id.as_deref(), Some("user-1"));
        assert_eq!(event.resource_type.as_deref(), Some("api_key"));
        assert_eq!(event.resource_id.as_deref(), Some("secret-9"));
        assert_eq!(event.ip_address.as_deref(), Some("10.0.0.1"));
        assert!(event.user_agent.is_none());
        assert_eq!(event.metadata.get("error").and_then(Value::as_str), Some("boom"));
    }
}
