//! Request payloads for the billing engine
//!
//! Validation runs before any write; amount fields must be strictly
//! positive and are checked with Decimal-aware custom validators.

use chrono::NaiveDate;
use hostel_core::models::{BillingPeriod, EntryType, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Custom validator: amount must be strictly positive
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_not_positive"))
    }
}

/// Custom validator: amount must be non-negative
pub fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount >= Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_negative"))
    }
}

/// Single payment to record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentRequest {
    pub student_id: Uuid,

    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,

    /// Explicit one-time fee type (security / union_fee / other).
    /// `None` means a rent payment.
    #[serde(default)]
    pub payment_type: Option<EntryType>,

    /// Record the amount as unattached advance credit
    #[serde(default)]
    pub is_advance: bool,

    /// Rent month; defaults to the current period
    #[serde(default)]
    pub billing_month: Option<BillingPeriod>,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub transaction_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,

    #[serde(default)]
    pub recorded_by: Option<Uuid>,
}

impl PaymentRequest {
    /// Plain rent payment for the given month
    pub fn rent(student_id: Uuid, amount: Decimal, billing_month: Option<BillingPeriod>) -> Self {
        Self {
            student_id,
            amount,
            payment_type: None,
            is_advance: false,
            billing_month,
            payment_method: PaymentMethod::default(),
            transaction_id: None,
            notes: None,
            recorded_by: None,
        }
    }

    /// Unattached advance credit
    pub fn advance(student_id: Uuid, amount: Decimal) -> Self {
        Self {
            is_advance: true,
            ..Self::rent(student_id, amount, None)
        }
    }

    /// One-time fee of the given type
    pub fn fee(student_id: Uuid, amount: Decimal, payment_type: EntryType) -> Self {
        Self {
            payment_type: Some(payment_type),
            ..Self::rent(student_id, amount, None)
        }
    }
}

/// Combined admission-day payment: up to four sub-payments recorded
/// sequentially (rent, security, union fee, other)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkPaymentRequest {
    pub student_id: Uuid,

    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub rent_amount: Option<Decimal>,

    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub security_amount: Option<Decimal>,

    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub union_fee_amount: Option<Decimal>,

    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub other_amount: Option<Decimal>,

    /// Month for the rent component; defaults to the current period
    #[serde(default)]
    pub billing_month: Option<BillingPeriod>,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub transaction_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,

    #[serde(default)]
    pub recorded_by: Option<Uuid>,
}

impl BulkPaymentRequest {
    /// Whether any component carries money
    pub fn has_components(&self) -> bool {
        self.rent_amount.is_some()
            || self.security_amount.is_some()
            || self.union_fee_amount.is_some()
            || self.other_amount.is_some()
    }
}

/// Checkout settlement parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Burn the deposit into outstanding dues before settling
    #[serde(default)]
    pub use_security_deposit: bool,

    /// Amount to actually pay out; defaults to the full refundable balance
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative_amount"))]
    pub refund_amount: Option<Decimal>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,

    #[serde(default)]
    pub processed_by: Option<Uuid>,
}

/// New resident admission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdmitRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,

    #[validate(length(min = 1, max = 30))]
    pub phone: String,

    #[serde(default)]
    pub guardian_name: Option<String>,

    #[serde(default)]
    pub guardian_phone: Option<String>,

    pub room_id: Uuid,

    /// Bed selected by 1-based number
    #[serde(default)]
    pub bed_number: Option<u32>,

    /// Bed selected by display name; takes precedence over `bed_number`
    #[serde(default)]
    pub bed_name: Option<String>,

    pub joining_date: NaiveDate,

    /// Override the bed-price rent snapshot
    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub monthly_rent: Option<Decimal>,

    /// Security deposit collected at admission
    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub security_deposit: Option<Decimal>,

    /// Union fee collected at admission
    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub union_fee: Option<Decimal>,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub recorded_by: Option<Uuid>,
}

/// Re-admission of a student who previously left
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReactivateRequest {
    pub room_id: Uuid,

    #[serde(default)]
    pub bed_number: Option<u32>,

    #[serde(default)]
    pub bed_name: Option<String>,

    pub joining_date: NaiveDate,

    #[serde(default)]
    #[validate(custom(function = "validate_positive_amount"))]
    pub monthly_rent: Option<Decimal>,

    #[serde(default)]
    pub recorded_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_non_positive_amount() {
        let request = PaymentRequest::rent(Uuid::new_v4(), dec!(0), None);
        assert!(request.validate().is_err());

        let request = PaymentRequest::rent(Uuid::new_v4(), dec!(-50), None);
        assert!(request.validate().is_err());

        let request = PaymentRequest::rent(Uuid::new_v4(), dec!(0.01), None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn bulk_component_detection() {
        let empty = BulkPaymentRequest {
            student_id: Uuid::new_v4(),
            rent_amount: None,
            security_amount: None,
            union_fee_amount: None,
            other_amount: None,
            billing_month: None,
            payment_method: PaymentMethod::Cash,
            transaction_id: None,
            notes: None,
            recorded_by: None,
        };
        assert!(!empty.has_components());

        let with_rent = BulkPaymentRequest {
            rent_amount: Some(dec!(3500)),
            ..empty
        };
        assert!(with_rent.has_components());
        assert!(with_rent.validate().is_ok());
    }
}
