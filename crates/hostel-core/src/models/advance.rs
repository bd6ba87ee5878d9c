//! Advance application records
//!
//! One row per `(student, billing period)` the first time advance credit is
//! applied to that period. Purely an idempotence guard and audit trail: the
//! due-status calculator rebuilds the actual figures from the ledger on
//! every pass and only consults these rows to avoid inserting duplicates.

use crate::models::BillingPeriod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of advance credit applied to a billing period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceApplication {
    /// Unique identifier
    pub id: Uuid,

    /// Owning student
    pub student_id: Uuid,

    /// The period the credit was applied to
    pub billing_month: BillingPeriod,

    /// How much credit was applied
    pub advance_amount_applied: Decimal,

    /// Due amount before application
    pub due_amount_before: Decimal,

    /// Due amount after application
    pub due_amount_after: Decimal,

    /// Credit remaining after this application
    pub remaining_advance: Decimal,

    /// The sentinel advance entry the credit originated from, if any
    pub advance_payment_id: Option<Uuid>,

    /// Free-form notes
    pub notes: Option<String>,

    /// Soft-delete flag (set when the originating credit is reversed)
    pub is_deleted: bool,

    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AdvanceApplication {
    /// Create a new application record with a fresh id
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        student_id: Uuid,
        billing_month: BillingPeriod,
        advance_amount_applied: Decimal,
        due_amount_before: Decimal,
        remaining_advance: Decimal,
        advance_payment_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            billing_month,
            advance_amount_applied,
            due_amount_before,
            due_amount_after: due_amount_before - advance_amount_applied,
            remaining_advance,
            advance_payment_id,
            notes: Some(format!(
                "Advance automatically applied to {}",
                billing_month
            )),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
        }
    }
}
