//! Checkout settlement and reactivation
//!
//! Settlement is computed, not stored: the statement is reproducible from
//! the ledger alone. Checkout refuses to complete while dues remain, frees
//! the bed, and transitions the student to Left.

use crate::constants::CHECKOUT_REFUND_NOTE;
use crate::due_status::PeriodDueStatus;
use crate::engine::ResidentialLedger;
use crate::requests::CheckoutRequest;
use chrono::{DateTime, Utc};
use hostel_core::{
    models::{
        AuditEvent, BillingMonth, DepositTransactionKind, EntryDetail, LedgerEntry, PaymentMethod,
        SecurityDepositTransaction, StudentStatus,
    },
    AppError, AppResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Final settlement produced at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementStatement {
    pub student_id: Uuid,
    pub student_code: String,
    pub name: String,

    /// Full recomputed per-period history
    pub periods: Vec<PeriodDueStatus>,

    /// Sum of rent/adjustment payments over the stay
    pub total_paid: Decimal,

    /// Deposit burned into dues during this checkout
    pub deposit_used: Decimal,

    /// Deposit portion of the payout
    pub deposit_returned: Decimal,

    /// Deposit written off when the caller pays out less than the balance
    pub deposit_forfeited: Decimal,

    /// Advance-credit portion of the payout
    pub advance_returned: Decimal,

    /// Amount actually paid out
    pub refund_amount: Decimal,

    /// Balance that was available to pay out
    pub refundable: Decimal,

    pub checked_out_at: DateTime<Utc>,
}

impl ResidentialLedger {
    /// Settle and check out a student
    ///
    /// Optionally burns the deposit into outstanding dues first; fails with
    /// `OutstandingDues` if any due survives. The refundable balance is the
    /// remaining deposit plus unconsumed advance credit.
    #[instrument(skip(self, request))]
    pub async fn checkout_student(
        &self,
        student_id: Uuid,
        request: CheckoutRequest,
    ) -> AppResult<SettlementStatement> {
        request.validate()?;
        let _guard = self.locks.acquire(student_id).await;

        let student = self.load_student(student_id).await?;
        if student.status == StudentStatus::Left {
            return Err(AppError::AlreadyLeft);
        }

        let mut report = self.due_status_locked(student_id).await?;
        let mut deposit_used = Decimal::ZERO;

        if request.use_security_deposit
            && report.total_due > Decimal::ZERO
            && student.security_deposit > Decimal::ZERO
        {
            let mut budget = report.total_due.min(student.security_deposit);
            let due_months: Vec<_> = report
                .due_periods()
                .map(|p| (p.month, p.due_amount))
                .collect();
            for (month, due) in due_months {
                if budget == Decimal::ZERO {
                    break;
                }
                let portion = due.min(budget);
                self.apply_deposit_to_month(student_id, month, portion, request.processed_by)
                    .await?;
                budget -= portion;
                deposit_used += portion;
            }
            report = self.due_status_locked(student_id).await?;
        }

        if report.total_due > Decimal::ZERO {
            warn!(
                "Checkout refused for student {}: {} {} still due",
                student.student_code,
                self.currency(),
                report.total_due
            );
            return Err(AppError::OutstandingDues {
                remaining: report.total_due.to_string(),
            });
        }

        // Reload: burning the deposit changed the balance.
        let mut student = self.load_student(student_id).await?;
        let now = self.clock.now();

        let refundable = student.security_deposit + report.total_advance;
        let refund = request.refund_amount.unwrap_or(refundable);
        if refund > refundable {
            return Err(AppError::RefundExceedsBalance {
                refundable: refundable.to_string(),
                requested: refund.to_string(),
            });
        }

        let deposit_returned = refund.min(student.security_deposit);
        let advance_returned = refund - deposit_returned;
        let deposit_forfeited = student.security_deposit - deposit_returned;

        if refund > Decimal::ZERO {
            let mut entry = LedgerEntry::new(
                student_id,
                BillingMonth::Month(self.clock.current_period()),
                EntryDetail::Refund { amount: refund },
                PaymentMethod::Adjustment,
                request.processed_by,
                now,
            );
            entry.notes = Some(CHECKOUT_REFUND_NOTE.to_string());
            let entry = self.ledger.create(&entry).await?;

            if deposit_returned > Decimal::ZERO {
                let mut transaction = SecurityDepositTransaction::new(
                    student_id,
                    DepositTransactionKind::Return,
                    deposit_returned,
                    request.processed_by,
                    now,
                );
                transaction.payment_id = Some(entry.id);
                transaction.notes = Some("Deposit returned at checkout".to_string());
                self.deposits.create(&transaction).await?;
            }
        }

        // The balance is zeroed below, so any unclaimed remainder gets its
        // own sub-ledger record before it disappears.
        if deposit_forfeited > Decimal::ZERO {
            let mut transaction = SecurityDepositTransaction::new(
                student_id,
                DepositTransactionKind::Adjustment,
                deposit_forfeited,
                request.processed_by,
                now,
            );
            transaction.notes = Some("Deposit forfeited at checkout".to_string());
            self.deposits.create(&transaction).await?;
        }

        self.release_bed(student.room_id, student.bed_number).await?;

        student.status = StudentStatus::Left;
        student.security_deposit = Decimal::ZERO;
        student.updated_at = now;
        self.students.update(&student).await?;

        let total_paid: Decimal = report.periods.iter().map(|p| p.paid_amount).sum();

        let statement = SettlementStatement {
            student_id,
            student_code: student.student_code.clone(),
            name: student.name.clone(),
            periods: report.periods,
            total_paid,
            deposit_used,
            deposit_returned,
            deposit_forfeited,
            advance_returned,
            refund_amount: refund,
            refundable,
            checked_out_at: now,
        };

        info!(
            "Checked out student {}: refunded {} {} (deposit {}, advance {})",
            student.student_code,
            self.currency(),
            refund,
            deposit_returned,
            advance_returned
        );

        self.emit_audit(
            AuditEvent::new(
                "checkout",
                "Student",
                student_id.to_string(),
                request.processed_by,
                now,
            )
            .with_after(serde_json::to_value(&statement)?),
        )
        .await;
        self.emit_notification(
            "student",
            "Student checked out",
            format!(
                "{} checked out, {} {} refunded",
                student.name,
                self.currency(),
                refund
            ),
            None,
        )
        .await;
        self.republish(student_id, serde_json::to_value(&statement)?)
            .await;

        Ok(statement)
    }

    /// Free a bed and refresh the room's occupancy state
    pub(crate) async fn release_bed(&self, room_id: Uuid, bed_number: u32) -> AppResult<()> {
        let _guard = self.locks.acquire(room_id).await;
        let Some(mut room) = self.rooms.find_by_id(room_id).await? else {
            // Room deleted from inventory after assignment; nothing to free.
            warn!("Room {} not found while releasing bed {}", room_id, bed_number);
            return Ok(());
        };

        if let Some(bed) = room.bed_mut(bed_number) {
            bed.is_occupied = false;
        }
        room.occupied_beds = room.occupied_beds.saturating_sub(1);
        room.refresh_status();
        room.updated_at = self.clock.now();
        self.rooms.update(&room).await?;
        Ok(())
    }
}
