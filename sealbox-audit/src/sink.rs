//! Sink and store interfaces.

use crate::event::AuditEvent;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Write-only audit capability held by core components.
///
/// `record` never fails and never blocks the caller's primary operation.
/// Implementations must swallow their own errors — a broken audit pipe must
/// not stop secret operations.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Fallible persistence contract implemented by a storage layer.
pub trait AuditStore: Send + Sync {
    fn append(&self, event: &AuditEvent) -> Result<(), AuditStoreError>;
}

#[derive(Debug, thiserror::Error)]
#[error("audit store write failed: {0}")]
pub struct AuditStoreError(pub String);

/// Adapts an [`AuditStore`] into an [`AuditSink`] by catching every append
/// error and logging it locally.
pub struct StoreAuditSink {
    store: Arc<dyn AuditStore>,
}

impl StoreAuditSink {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }
}

impl AuditSink for StoreAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Err(e) = self.store.append(&event) {
            warn!(action = %event.action, "audit event dropped: {e}");
        }
    }
}

/// Sink that only writes structured logs. Useful for embedding Sealbox
/// without an audit table.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        debug!(
            action = %event.action,
            success = event.success,
            duration_ms = event.duration_ms,
            user_id = event.user_id.as_deref().unwrap_or("unknown"),
            resource_id = event.resource_id.as_deref().unwrap_or("-"),
            "audit"
        );
    }
}

/// In-process buffering sink for tests.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in emission order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of recorded events with the given action.
    pub fn count(&self, action: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FailingStore;

    impl AuditStore for FailingStore {
        fn append(&self, _event: &AuditEvent) -> Result<(), AuditStoreError> {
            Err(AuditStoreError("disk full".into()))
        }
    }

    #[test]
    fn store_sink_swallows_append_failures() {
        let sink = StoreAuditSink::new(Arc::new(FailingStore));
        // Must not panic or propagate anything.
        sink.record(AuditEvent::new("encrypt", true, Duration::ZERO));
    }

    #[test]
    fn memory_sink_counts_by_action() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::new("encrypt", true, Duration::ZERO));
        sink.record(AuditEvent::new("decrypt", false, Duration::ZERO));
        sink.record(AuditEvent::new("encrypt", true, Duration::ZERO));
        assert_eq!(sink.count("encrypt"), 2);
        assert_eq!(sink.count("decrypt"), 1);
        assert_eq!(sink.events().len(), 3);
    }
}
