//! Security deposit sub-ledger
//!
//! The deposit balance lives on the student row and only moves through
//! these operations. Every movement writes an append-only
//! `SecurityDepositTransaction` plus a mirrored ledger entry, keeping the
//! student-facing transaction list and the accounting ledger in agreement.
//! The balance never goes negative.

use crate::constants::DEPOSIT_APPLIED_NOTE;
use crate::engine::ResidentialLedger;
use hostel_core::{
    models::{
        AuditEvent, BillingMonth, BillingPeriod, DepositTransactionKind, EntryDetail, LedgerEntry,
        PaymentMethod, SecurityDepositTransaction,
    },
    AppError, AppResult,
};
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

impl ResidentialLedger {
    /// Pay part of a month's dues out of the security deposit
    ///
    /// Appends an adjustment ledger row computed exactly like a rent
    /// payment, decrements the balance, and links a `UseForDues`
    /// transaction to the row.
    #[instrument(skip(self))]
    pub async fn use_security_deposit_for_dues(
        &self,
        student_id: Uuid,
        month: BillingPeriod,
        amount: Decimal,
        processed_by: Option<Uuid>,
    ) -> AppResult<LedgerEntry> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "Deposit amount must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(student_id).await;
        let entry = self
            .apply_deposit_to_month(student_id, month, amount, processed_by)
            .await?;

        self.emit_audit(
            AuditEvent::new(
                "use_security_deposit",
                "Payment",
                entry.id.to_string(),
                processed_by,
                self.clock.now(),
            )
            .with_after(serde_json::to_value(&entry)?),
        )
        .await;
        self.republish(student_id, serde_json::to_value(&entry)?)
            .await;

        Ok(entry)
    }

    /// Lock-free deposit application shared with checkout
    pub(crate) async fn apply_deposit_to_month(
        &self,
        student_id: Uuid,
        month: BillingPeriod,
        amount: Decimal,
        processed_by: Option<Uuid>,
    ) -> AppResult<LedgerEntry> {
        let mut student = self.load_student(student_id).await?;
        let now = self.clock.now();

        if amount > student.security_deposit {
            return Err(AppError::InsufficientDeposit {
                available: student.security_deposit.to_string(),
                requested: amount.to_string(),
            });
        }
        if !student.owes_period(month) {
            return Err(AppError::MonthBeforeJoining {
                month: month.to_string(),
                joined: student.joining_period().to_string(),
            });
        }

        let billing_month = BillingMonth::Month(month);
        let already_paid: Decimal = self
            .ledger
            .list_for_month(student_id, billing_month)
            .await?
            .iter()
            .filter(|e| e.detail.counts_toward_period())
            .map(|e| e.paid_amount())
            .sum();
        let remaining = (student.monthly_rent - already_paid).max(Decimal::ZERO);
        let due = (remaining - amount).max(Decimal::ZERO);
        let advance = (amount - remaining).max(Decimal::ZERO);

        let mut entry = LedgerEntry::new(
            student_id,
            billing_month,
            EntryDetail::Adjustment {
                rent_amount: student.monthly_rent,
                paid_amount: amount,
                due_amount: due,
                advance_amount: advance,
            },
            PaymentMethod::Adjustment,
            processed_by,
            now,
        );
        entry.notes = Some(DEPOSIT_APPLIED_NOTE.to_string());
        let entry = self.ledger.create(&entry).await?;

        student.security_deposit -= amount;
        student.updated_at = now;
        self.students.update(&student).await?;

        let mut transaction = SecurityDepositTransaction::new(
            student_id,
            DepositTransactionKind::UseForDues,
            amount,
            processed_by,
            now,
        );
        transaction.billing_month = Some(month);
        transaction.payment_id = Some(entry.id);
        transaction.notes = Some(format!("Deposit applied to {}", month));
        self.deposits.create(&transaction).await?;

        info!(
            "Applied {} {} of deposit to {} for student {}",
            self.currency(),
            amount,
            month,
            student.student_code
        );

        Ok(entry)
    }

    /// Pay part of the deposit balance back to the student
    #[instrument(skip(self))]
    pub async fn return_security_deposit(
        &self,
        student_id: Uuid,
        amount: Decimal,
        processed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> AppResult<SecurityDepositTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "Return amount must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.load_student(student_id).await?;
        let now = self.clock.now();

        if amount > student.security_deposit {
            return Err(AppError::InsufficientDeposit {
                available: student.security_deposit.to_string(),
                requested: amount.to_string(),
            });
        }

        let mut entry = LedgerEntry::new(
            student_id,
            BillingMonth::Month(self.clock.current_period()),
            EntryDetail::Refund { amount },
            PaymentMethod::Adjustment,
            processed_by,
            now,
        );
        entry.notes = Some("Security deposit returned".to_string());
        let entry = self.ledger.create(&entry).await?;

        student.security_deposit -= amount;
        student.updated_at = now;
        self.students.update(&student).await?;

        let mut transaction = SecurityDepositTransaction::new(
            student_id,
            DepositTransactionKind::Return,
            amount,
            processed_by,
            now,
        );
        transaction.payment_id = Some(entry.id);
        transaction.notes = notes.or_else(|| Some("Deposit returned to student".to_string()));
        let transaction = self.deposits.create(&transaction).await?;

        info!(
            "Returned {} {} of deposit to student {}",
            self.currency(),
            amount,
            student.student_code
        );

        self.emit_audit(
            AuditEvent::new(
                "return_security_deposit",
                "Student",
                student_id.to_string(),
                processed_by,
                now,
            )
            .with_after(serde_json::to_value(&transaction)?),
        )
        .await;
        self.republish(student_id, serde_json::to_value(&entry)?)
            .await;

        Ok(transaction)
    }

    /// The student's deposit transaction history, newest first
    pub async fn deposit_transactions(
        &self,
        student_id: Uuid,
    ) -> AppResult<Vec<SecurityDepositTransaction>> {
        self.load_student(student_id).await?;
        self.deposits.list_for_student(student_id).await
    }
}
