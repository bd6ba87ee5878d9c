//! Student model
//!
//! Represents a resident of the hostel: bed assignment, rent snapshot,
//! and the running security-deposit and union-fee balances.

use crate::models::BillingPeriod;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Student occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    /// Currently occupying a bed
    #[default]
    Active,
    /// Checked out (terminal unless explicitly reactivated)
    Left,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "active"),
            StudentStatus::Left => write!(f, "left"),
        }
    }
}

impl StudentStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(StudentStatus::Active),
            "left" => Some(StudentStatus::Left),
            _ => None,
        }
    }
}

/// Student entity
///
/// `monthly_rent` is a snapshot taken at bed assignment, not a live
/// reference to the room price. `security_deposit` is a running balance
/// mutated only through the deposit sub-ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable code, generated as `STU<year><seq3>`
    pub student_code: String,

    /// Full name
    pub name: String,

    /// Contact phone
    pub phone: String,

    /// Guardian name
    pub guardian_name: Option<String>,

    /// Guardian phone
    pub guardian_phone: Option<String>,

    /// Occupied room
    pub room_id: Uuid,

    /// Occupied bed (1-based index into the room's beds)
    pub bed_number: u32,

    /// Date the current occupancy started
    pub joining_date: NaiveDate,

    /// Rent obligation per billing period (snapshot at assignment)
    pub monthly_rent: Decimal,

    /// Refundable deposit balance, never negative
    pub security_deposit: Decimal,

    /// Cumulative one-time union fees paid
    pub union_fee: Decimal,

    /// Occupancy status
    pub status: StudentStatus,

    /// Soft-delete flag
    pub is_deleted: bool,

    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Check if the student currently occupies a bed
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active && !self.is_deleted
    }

    /// The first billing period the student owes for
    pub fn joining_period(&self) -> BillingPeriod {
        BillingPeriod::from_date(self.joining_date)
    }

    /// Check whether a billing period is payable for this student
    pub fn owes_period(&self, period: BillingPeriod) -> bool {
        period >= self.joining_period()
    }
}
