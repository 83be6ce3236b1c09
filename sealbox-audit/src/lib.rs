//! Audit event side-channel for Sealbox.
//!
//! Every cryptographic operation and every master-password check emits one
//! audit event, regardless of outcome. Emission is fire-and-forget: a sink
//! must never fail, block, or otherwise interfere with the operation that
//! produced the event. Persistence failures are logged locally and swallowed.
//!
//! Core components hold only the [`AuditSink`] capability, never a concrete
//! store. A storage layer implements the fallible [`AuditStore`] contract and
//! is wrapped in [`StoreAuditSink`], which does the swallowing.

mod event;
mod sink;

pub use event::{risk_score, AuditEvent};
pub use sink::{
    AuditSink, AuditStore, AuditStoreError, MemoryAuditSink, StoreAuditSink, TracingAuditSink,
};
