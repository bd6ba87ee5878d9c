//! Security deposit sub-ledger
//!
//! Append-only transaction log for a student's refundable deposit balance.
//! Every balance change writes one of these alongside a mirrored ledger
//! entry, so the student-facing transaction list and the accounting ledger
//! stay in sync.

use crate::models::BillingPeriod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of deposit balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositTransactionKind {
    /// Balance consumed to pay monthly dues
    UseForDues,
    /// Balance returned to the student
    Return,
    /// Balance increased (initial or additional deposit)
    Adjustment,
}

impl fmt::Display for DepositTransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositTransactionKind::UseForDues => write!(f, "use_for_dues"),
            DepositTransactionKind::Return => write!(f, "return"),
            DepositTransactionKind::Adjustment => write!(f, "adjustment"),
        }
    }
}

impl DepositTransactionKind {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "use_for_dues" => Some(DepositTransactionKind::UseForDues),
            "return" => Some(DepositTransactionKind::Return),
            "adjustment" => Some(DepositTransactionKind::Adjustment),
            _ => None,
        }
    }
}

/// One movement of a student's security-deposit balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityDepositTransaction {
    /// Unique identifier
    pub id: Uuid,

    /// Owning student
    pub student_id: Uuid,

    /// Movement kind
    pub kind: DepositTransactionKind,

    /// Amount moved, always non-negative
    pub amount: Decimal,

    /// If used for dues, which period
    pub billing_month: Option<BillingPeriod>,

    /// Mirrored ledger entry, if any
    pub payment_id: Option<Uuid>,

    /// Free-form notes
    pub notes: Option<String>,

    /// Actor who processed the movement
    pub processed_by: Option<Uuid>,

    /// Soft-delete flag
    pub is_deleted: bool,

    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl SecurityDepositTransaction {
    /// Create a new transaction with a fresh id
    pub fn new(
        student_id: Uuid,
        kind: DepositTransactionKind,
        amount: Decimal,
        processed_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            kind,
            amount,
            billing_month: None,
            payment_id: None,
            notes: None,
            processed_by,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
        }
    }
}
