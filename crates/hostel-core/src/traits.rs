//! Common traits for repositories and external collaborators
//!
//! Repositories abstract the ledger store so the engine runs unchanged
//! against PostgreSQL or the in-memory stores. Collaborator traits are the
//! fire-and-forget interfaces to audit logging, real-time push, and the
//! parallel coaching ledger.

use crate::error::AppError;
use crate::models::{
    AdvanceApplication, AuditEvent, BillingMonth, BillingPeriod, LedgerEntry, Room,
    SecurityDepositTransaction, Student,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Student storage
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Find a non-deleted student by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, AppError>;

    /// Persist a new student
    async fn create(&self, student: &Student) -> Result<Student, AppError>;

    /// Persist changes to an existing student
    async fn update(&self, student: &Student) -> Result<Student, AppError>;

    /// All active, non-deleted students
    async fn list_active(&self) -> Result<Vec<Student>, AppError>;

    /// Count active, non-deleted students
    async fn count_active(&self) -> Result<i64, AppError>;

    /// Highest existing student code with the given prefix, for sequencing
    async fn last_code_with_prefix(&self, prefix: &str) -> Result<Option<String>, AppError>;

    /// The active student occupying a given bed, if any
    async fn find_active_by_bed(
        &self,
        room_id: Uuid,
        bed_number: u32,
    ) -> Result<Option<Student>, AppError>;
}

/// Room storage (allocation surface only; inventory CRUD is external)
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find a non-deleted room by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Room>, AppError>;

    /// Persist occupancy changes
    async fn update(&self, room: &Room) -> Result<Room, AppError>;

    /// Count non-deleted rooms
    async fn count(&self) -> Result<i64, AppError>;
}

/// Ledger entry storage
///
/// Append-style: entries accumulate for the student's lifetime and are only
/// ever soft-deleted.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Find an entry by id, deleted or not
    async fn find_by_id(&self, id: Uuid) -> Result<Option<LedgerEntry>, AppError>;

    /// Append a new entry
    async fn create(&self, entry: &LedgerEntry) -> Result<LedgerEntry, AppError>;

    /// Persist changes to an existing entry
    async fn update(&self, entry: &LedgerEntry) -> Result<LedgerEntry, AppError>;

    /// Non-deleted entries for a student, oldest first
    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<LedgerEntry>, AppError>;

    /// Non-deleted entries for one `(student, billing month)` pair
    async fn list_for_month(
        &self,
        student_id: Uuid,
        month: BillingMonth,
    ) -> Result<Vec<LedgerEntry>, AppError>;

    /// The student's active sentinel advance entry, if any
    async fn find_advance_entry(&self, student_id: Uuid) -> Result<Option<LedgerEntry>, AppError>;

    /// All students' non-deleted entries for a calendar month (chart data)
    async fn list_all_for_period(
        &self,
        period: BillingPeriod,
    ) -> Result<Vec<LedgerEntry>, AppError>;
}

/// Advance application log storage
#[async_trait]
pub trait AdvanceApplicationRepository: Send + Sync {
    /// Persist a new application record
    async fn create(&self, application: &AdvanceApplication)
        -> Result<AdvanceApplication, AppError>;

    /// The active record for `(student, period)`, if any
    async fn find_active(
        &self,
        student_id: Uuid,
        period: BillingPeriod,
    ) -> Result<Option<AdvanceApplication>, AppError>;

    /// Active records for a student, oldest first
    async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AdvanceApplication>, AppError>;

    /// Count active records referencing an advance payment entry
    async fn count_active_by_payment(&self, advance_payment_id: Uuid)
        -> Result<i64, AppError>;

    /// Soft-delete every active record for a student (reversal cascade)
    ///
    /// Returns the number of records invalidated.
    async fn soft_delete_for_student(
        &self,
        student_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<u64, AppError>;
}

/// Security deposit transaction storage (append-only)
#[async_trait]
pub trait DepositTransactionRepository: Send + Sync {
    /// Append a new deposit transaction
    async fn create(
        &self,
        transaction: &SecurityDepositTransaction,
    ) -> Result<SecurityDepositTransaction, AppError>;

    /// Non-deleted transactions for a student, newest first
    async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<SecurityDepositTransaction>, AppError>;
}

// ==================== Collaborators ====================

/// Real-time notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// Category label, e.g. "payment", "due", "student"
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Best-effort audit log
///
/// Implementations must swallow their own failures; a lost audit record
/// never aborts the billing operation that produced it.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Best-effort real-time push
///
/// All methods are fire-and-forget; implementations must not block or fail
/// the calling operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish_payment_update(&self, payload: Value);
    async fn publish_dashboard_update(&self, payload: Value);
    async fn publish_due_status_update(&self, student_id: Uuid, payload: Value);
    async fn publish_notification(&self, notification: Notification);
}

/// The parallel coaching-admission ledger, consumed only by the combined
/// dashboard aggregate
#[async_trait]
pub trait CoachingLedger: Send + Sync {
    async fn admission_due_total(&self) -> Result<Decimal, AppError>;
}
