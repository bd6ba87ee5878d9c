//! Ledger entry model
//!
//! One entry per recorded money movement. The entry is a tagged union over
//! its type so each variant only carries the fields meaningful to it:
//! rent and adjustment rows carry the period obligation snapshot and the
//! write-time due/advance caches, one-time fees and refunds carry a bare
//! amount, and advance rows carry unattached credit.
//!
//! The cached `due_amount`/`advance_amount` fields are a convenience for
//! listings only. The due-status calculator always rebuilds aggregates from
//! paid amounts and types, so historical inconsistency in the caches cannot
//! corrupt balances.

use crate::models::BillingMonth;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment method label (opaque to the engine, no gateway integration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Bkash,
    Bank,
    /// System-generated rows: auto-dues, deposit applications, refunds
    Adjustment,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Bkash => write!(f, "bkash"),
            PaymentMethod::Bank => write!(f, "bank"),
            PaymentMethod::Adjustment => write!(f, "adjustment"),
        }
    }
}

impl PaymentMethod {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "bkash" => Some(PaymentMethod::Bkash),
            "bank" => Some(PaymentMethod::Bank),
            "adjustment" => Some(PaymentMethod::Adjustment),
            _ => None,
        }
    }
}

/// Discriminant of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Rent,
    Advance,
    Security,
    UnionFee,
    Refund,
    Adjustment,
    Other,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Rent => write!(f, "rent"),
            EntryType::Advance => write!(f, "advance"),
            EntryType::Security => write!(f, "security"),
            EntryType::UnionFee => write!(f, "union_fee"),
            EntryType::Refund => write!(f, "refund"),
            EntryType::Adjustment => write!(f, "adjustment"),
            EntryType::Other => write!(f, "other"),
        }
    }
}

impl EntryType {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rent" => Some(EntryType::Rent),
            "advance" => Some(EntryType::Advance),
            "security" => Some(EntryType::Security),
            "union_fee" => Some(EntryType::UnionFee),
            "refund" => Some(EntryType::Refund),
            "adjustment" => Some(EntryType::Adjustment),
            "other" => Some(EntryType::Other),
        _ => None,
        }
    }
}

/// Typed payload of a ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryDetail {
    /// Money received against a period's rent obligation
    Rent {
        /// Obligation snapshot for the period
        rent_amount: Decimal,
        /// Money received in this single transaction
        paid_amount: Decimal,
        /// Write-time cache: max(0, remaining obligation - paid)
        due_amount: Decimal,
        /// Write-time cache: max(0, paid - remaining obligation)
        advance_amount: Decimal,
    },
    /// Security deposit applied against a period's rent obligation
    Adjustment {
        rent_amount: Decimal,
        paid_amount: Decimal,
        due_amount: Decimal,
        advance_amount: Decimal,
    },
    /// Credit not tied to any period, keyed at the ADVANCE sentinel
    Advance { amount: Decimal },
    /// Security deposit received (raises the student's deposit balance)
    Security { amount: Decimal },
    /// One-time union fee (raises the student's union-fee balance)
    UnionFee { amount: Decimal },
    /// One-time fee with no balance side effect
    Other { amount: Decimal },
    /// Money paid out to the student
    Refund { amount: Decimal },
}

impl EntryDetail {
    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryDetail::Rent { .. } => EntryType::Rent,
            EntryDetail::Adjustment { .. } => EntryType::Adjustment,
            EntryDetail::Advance { .. } => EntryType::Advance,
            EntryDetail::Security { .. } => EntryType::Security,
            EntryDetail::UnionFee { .. } => EntryType::UnionFee,
            EntryDetail::Other { .. } => EntryType::Other,
            EntryDetail::Refund { .. } => EntryType::Refund,
        }
    }

    /// Money received in this transaction (refunds report the outgoing amount)
    pub fn paid_amount(&self) -> Decimal {
        match self {
            EntryDetail::Rent { paid_amount, .. } | EntryDetail::Adjustment { paid_amount, .. } => {
                *paid_amount
            }
            EntryDetail::Advance { amount }
            | EntryDetail::Security { amount }
            | EntryDetail::UnionFee { amount }
            | EntryDetail::Other { amount }
            | EntryDetail::Refund { amount } => *amount,
        }
    }

    /// Obligation snapshot (0 for non-rent types)
    pub fn rent_amount(&self) -> Decimal {
        match self {
            EntryDetail::Rent { rent_amount, .. } | EntryDetail::Adjustment { rent_amount, .. } => {
                *rent_amount
            }
            _ => Decimal::ZERO,
        }
    }

    /// Write-time due cache (0 for non-period types)
    pub fn cached_due(&self) -> Decimal {
        match self {
            EntryDetail::Rent { due_amount, .. } | EntryDetail::Adjustment { due_amount, .. } => {
                *due_amount
            }
            _ => Decimal::ZERO,
        }
    }

    /// Advance credit this entry carries: unattached credit for advance
    /// rows, the overpayment cache for period rows
    pub fn advance_amount(&self) -> Decimal {
        match self {
            EntryDetail::Advance { amount } => *amount,
            EntryDetail::Rent { advance_amount, .. }
            | EntryDetail::Adjustment { advance_amount, .. } => *advance_amount,
            _ => Decimal::ZERO,
        }
    }

    /// Whether this entry counts toward a period's true paid total
    pub fn counts_toward_period(&self) -> bool {
        matches!(
            self,
            EntryDetail::Rent { .. } | EntryDetail::Adjustment { .. }
        )
    }

    /// Rebuild the typed payload from flat storage columns
    pub fn from_parts(
        entry_type: EntryType,
        rent_amount: Decimal,
        paid_amount: Decimal,
        due_amount: Decimal,
        advance_amount: Decimal,
    ) -> Self {
        match entry_type {
            EntryType::Rent => EntryDetail::Rent {
                rent_amount,
                paid_amount,
                due_amount,
                advance_amount,
            },
            EntryType::Adjustment => EntryDetail::Adjustment {
                rent_amount,
                paid_amount,
                due_amount,
                advance_amount,
            },
            EntryType::Advance => EntryDetail::Advance {
                amount: paid_amount,
            },
            EntryType::Security => EntryDetail::Security {
                amount: paid_amount,
            },
            EntryType::UnionFee => EntryDetail::UnionFee {
                amount: paid_amount,
            },
            EntryType::Other => EntryDetail::Other {
                amount: paid_amount,
            },
            EntryType::Refund => EntryDetail::Refund {
                amount: paid_amount,
            },
        }
    }

    /// Flatten to storage columns: (type, rent, paid, due, advance)
    pub fn to_parts(&self) -> (EntryType, Decimal, Decimal, Decimal, Decimal) {
        (
            self.entry_type(),
            self.rent_amount(),
            self.paid_amount(),
            self.cached_due(),
            self.advance_amount(),
        )
    }
}

/// One recorded money movement in a student's ledger
///
/// Entries are append-style: a period's history is a sequence of discrete
/// transactions, never a single mutated running total. Entries are never
/// hard-deleted, only soft-deleted with reversal semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier
    pub id: Uuid,

    /// Owning student
    pub student_id: Uuid,

    /// Billing period this entry belongs to, or the ADVANCE sentinel
    pub billing_month: BillingMonth,

    /// Typed payload
    #[serde(flatten)]
    pub detail: EntryDetail,

    /// Opaque payment method label
    pub payment_method: PaymentMethod,

    /// External transaction reference
    pub transaction_id: Option<String>,

    /// Free-form notes
    pub notes: Option<String>,

    /// Actor who recorded the entry (absent for system-generated rows)
    pub recorded_by: Option<Uuid>,

    /// Soft-delete flag
    pub is_deleted: bool,

    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry with a fresh id
    pub fn new(
        student_id: Uuid,
        billing_month: BillingMonth,
        detail: EntryDetail,
        payment_method: PaymentMethod,
        recorded_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            billing_month,
            detail,
            payment_method,
            transaction_id: None,
            notes: None,
            recorded_by,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.detail.entry_type()
    }

    pub fn paid_amount(&self) -> Decimal {
        self.detail.paid_amount()
    }

    pub fn advance_amount(&self) -> Decimal {
        self.detail.advance_amount()
    }

    /// Whether soft-deleting this entry invalidates advance applications
    pub fn generates_advance(&self) -> bool {
        self.detail.advance_amount() > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_type_roundtrip() {
        for t in [
            EntryType::Rent,
            EntryType::Advance,
            EntryType::Security,
            EntryType::UnionFee,
            EntryType::Refund,
            EntryType::Adjustment,
            EntryType::Other,
        ] {
            assert_eq!(EntryType::from_str(&t.to_string()), Some(t));
        }
        assert_eq!(EntryType::from_str("rebate"), None);
    }

    #[test]
    fn test_rent_detail_accessors() {
        let detail = EntryDetail::Rent {
            rent_amount: dec!(5000),
            paid_amount: dec!(3000),
            due_amount: dec!(2000),
            advance_amount: dec!(0),
        };
        assert_eq!(detail.paid_amount(), dec!(3000));
        assert_eq!(detail.rent_amount(), dec!(5000));
        assert_eq!(detail.cached_due(), dec!(2000));
        assert!(detail.counts_toward_period());
    }

    #[test]
    fn test_advance_detail_carries_credit() {
        let detail = EntryDetail::Advance { amount: dec!(10000) };
        assert_eq!(detail.advance_amount(), dec!(10000));
        assert_eq!(detail.paid_amount(), dec!(10000));
        assert_eq!(detail.cached_due(), dec!(0));
        assert!(!detail.counts_toward_period());
    }

    #[test]
    fn test_parts_roundtrip() {
        let detail = EntryDetail::Adjustment {
            rent_amount: dec!(4000),
            paid_amount: dec!(1500),
            due_amount: dec!(2500),
            advance_amount: dec!(0),
        };
        let (t, rent, paid, due, adv) = detail.to_parts();
        let rebuilt = EntryDetail::from_parts(t, rent, paid, due, adv);
        assert_eq!(rebuilt.to_parts(), detail.to_parts());

        let fee = EntryDetail::UnionFee { amount: dec!(500) };
        let (t, rent, paid, due, adv) = fee.to_parts();
        assert_eq!(rent, dec!(0));
        let rebuilt = EntryDetail::from_parts(t, rent, paid, due, adv);
        assert_eq!(rebuilt.paid_amount(), dec!(500));
    }
}
