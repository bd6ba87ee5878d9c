//! Billing engine facade
//!
//! `ResidentialLedger` owns the repositories and collaborators and exposes
//! every billing operation. The operation bodies live in sibling modules
//! (`payments`, `due_status`, `deposits`, `checkout`, `students`,
//! `dashboard`); this module holds the wiring and the shared helpers.

use crate::locks::LockRegistry;
use hostel_core::{
    config::BillingConfig,
    models::{AuditEvent, Student},
    traits::{
        AdvanceApplicationRepository, AuditSink, CoachingLedger, DepositTransactionRepository,
        LedgerRepository, Notification, Notifier, RoomRepository, StudentRepository,
    },
    AppError, AppResult, Clock,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Repository and collaborator bundle for the engine
#[derive(Clone)]
pub struct Stores {
    pub students: Arc<dyn StudentRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub advances: Arc<dyn AdvanceApplicationRepository>,
    pub deposits: Arc<dyn DepositTransactionRepository>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn Notifier>,
    pub coaching: Arc<dyn CoachingLedger>,
}

/// The residential billing ledger engine
///
/// All mutating operations serialize per student (and per room for bed
/// allocation) through the lock registry. Time is only read through the
/// injected clock.
pub struct ResidentialLedger {
    pub(crate) students: Arc<dyn StudentRepository>,
    pub(crate) rooms: Arc<dyn RoomRepository>,
    pub(crate) ledger: Arc<dyn LedgerRepository>,
    pub(crate) advances: Arc<dyn AdvanceApplicationRepository>,
    pub(crate) deposits: Arc<dyn DepositTransactionRepository>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) coaching: Arc<dyn CoachingLedger>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: BillingConfig,
    pub(crate) locks: LockRegistry,
}

impl ResidentialLedger {
    /// Create a new engine over the given stores
    pub fn new(stores: Stores, clock: Arc<dyn Clock>, config: BillingConfig) -> Self {
        Self {
            students: stores.students,
            rooms: stores.rooms,
            ledger: stores.ledger,
            advances: stores.advances,
            deposits: stores.deposits,
            audit: stores.audit,
            notifier: stores.notifier,
            coaching: stores.coaching,
            clock,
            config,
            locks: LockRegistry::new(),
        }
    }

    /// Load a non-deleted student or fail with `StudentNotFound`
    pub(crate) async fn load_student(&self, student_id: Uuid) -> AppResult<Student> {
        self.students
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| AppError::StudentNotFound(student_id.to_string()))
    }

    /// Record an audit event (best-effort, never fails the caller)
    pub(crate) async fn emit_audit(&self, event: AuditEvent) {
        self.audit.record(event).await;
    }

    /// Push a payment/due-status/dashboard refresh for a student
    ///
    /// All three channels are fire-and-forget.
    pub(crate) async fn republish(&self, student_id: Uuid, payload: Value) {
        self.notifier.publish_payment_update(payload.clone()).await;
        self.notifier
            .publish_due_status_update(student_id, payload)
            .await;
        self.notifier
            .publish_dashboard_update(serde_json::json!({ "refresh": true }))
            .await;
        debug!("Republished updates for student {}", student_id);
    }

    /// Push a human-readable notification (best-effort)
    pub(crate) async fn emit_notification(
        &self,
        kind: &str,
        title: &str,
        message: String,
        link: Option<String>,
    ) {
        self.notifier
            .publish_notification(Notification {
                id: Uuid::new_v4().to_string(),
                kind: kind.to_string(),
                title: title.to_string(),
                message,
                link,
                timestamp: self.clock.now(),
            })
            .await;
    }

    /// Currency label for notification texts
    pub(crate) fn currency(&self) -> &str {
        &self.config.currency
    }
}
