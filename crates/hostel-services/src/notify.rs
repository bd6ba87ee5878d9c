//! Log-only collaborator implementations
//!
//! Defaults for deployments without an audit store, push channel, or
//! coaching ledger. Real adapters live in the outer application; these keep
//! the engine runnable and observable on their own.

use async_trait::async_trait;
use hostel_core::{
    models::AuditEvent,
    traits::{AuditSink, CoachingLedger, Notification, Notifier},
    AppResult,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Audit sink that writes events to the tracing log
#[derive(Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(target: "audit", "{}", payload),
            Err(e) => warn!("Failed to serialize audit event: {}", e),
        }
    }
}

/// Notifier that writes payloads to the tracing log
#[derive(Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn publish_payment_update(&self, payload: Value) {
        debug!(target: "push", "payment update: {}", payload);
    }

    async fn publish_dashboard_update(&self, payload: Value) {
        debug!(target: "push", "dashboard update: {}", payload);
    }

    async fn publish_due_status_update(&self, student_id: Uuid, payload: Value) {
        debug!(target: "push", "due status update for {}: {}", student_id, payload);
    }

    async fn publish_notification(&self, notification: Notification) {
        debug!(
            target: "push",
            "notification [{}] {}: {}",
            notification.kind, notification.title, notification.message
        );
    }
}

/// Coaching ledger stub reporting zero due
#[derive(Default)]
pub struct NullCoachingLedger;

#[async_trait]
impl CoachingLedger for NullCoachingLedger {
    async fn admission_due_total(&self) -> AppResult<Decimal> {
        Ok(Decimal::ZERO)
    }
}
