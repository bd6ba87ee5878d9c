//! Payment recording and reversal
//!
//! Rent payments are append-style: each transaction is a new ledger row and
//! the period's paid total is always a sum over surviving rows. Nothing here
//! ever upserts into an existing row.

use crate::engine::ResidentialLedger;
use crate::requests::{BulkPaymentRequest, PaymentRequest};
use hostel_core::{
    models::{
        AuditEvent, BillingMonth, DepositTransactionKind, EntryDetail, EntryType, LedgerEntry,
        SecurityDepositTransaction, Student,
    },
    AppError, AppResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Outcome of a bulk payment: the sub-entries that were committed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPaymentResult {
    pub count: usize,
    pub entries: Vec<LedgerEntry>,
}

impl ResidentialLedger {
    /// Record a single payment
    ///
    /// Branches in priority order: advance credit, explicit one-time fee,
    /// rent. Returns the persisted ledger entry.
    #[instrument(skip(self, request), fields(student_id = %request.student_id))]
    pub async fn record_payment(&self, request: PaymentRequest) -> AppResult<LedgerEntry> {
        request.validate()?;
        let _guard = self.locks.acquire(request.student_id).await;
        self.record_payment_locked(request).await
    }

    pub(crate) async fn record_payment_locked(
        &self,
        request: PaymentRequest,
    ) -> AppResult<LedgerEntry> {
        let mut student = self.load_student(request.student_id).await?;
        let now = self.clock.now();

        let entry = if request.is_advance {
            self.record_advance(&student, &request).await?
        } else {
            match request.payment_type {
                Some(EntryType::Security) | Some(EntryType::UnionFee) | Some(EntryType::Other) => {
                    self.record_one_time_fee(&mut student, &request).await?
                }
                None | Some(EntryType::Rent) => self.record_rent(&student, &request).await?,
                Some(other) => {
                    return Err(AppError::InvalidInput(format!(
                        "Payment type {} cannot be submitted directly",
                        other
                    )))
                }
            }
        };

        info!(
            "Recorded {} payment of {} {} for student {}",
            entry.entry_type(),
            self.currency(),
            request.amount,
            student.student_code
        );

        self.emit_audit(
            AuditEvent::new(
                "payment",
                "Payment",
                entry.id.to_string(),
                request.recorded_by,
                now,
            )
            .with_after(serde_json::to_value(&entry)?),
        )
        .await;
        self.republish(student.id, serde_json::to_value(&entry)?)
            .await;
        self.emit_notification(
            "payment",
            "Payment received",
            format!(
                "{} paid {} {} ({})",
                student.name,
                self.currency(),
                request.amount,
                entry.entry_type()
            ),
            None,
        )
        .await;

        Ok(entry)
    }

    /// Accumulate unattached advance credit at the sentinel month
    async fn record_advance(
        &self,
        student: &Student,
        request: &PaymentRequest,
    ) -> AppResult<LedgerEntry> {
        if let Some(mut existing) = self.ledger.find_advance_entry(student.id).await? {
            let balance = existing.advance_amount() + request.amount;
            existing.detail = EntryDetail::Advance { amount: balance };
            if request.notes.is_some() {
                existing.notes = request.notes.clone();
            }
            return self.ledger.update(&existing).await;
        }

        let mut entry = LedgerEntry::new(
            student.id,
            BillingMonth::Advance,
            EntryDetail::Advance {
                amount: request.amount,
            },
            request.payment_method,
            request.recorded_by,
            self.clock.now(),
        );
        entry.transaction_id = request.transaction_id.clone();
        entry.notes = request.notes.clone();
        self.ledger.create(&entry).await
    }

    /// One-time fee with a balance side effect for security and union fees
    async fn record_one_time_fee(
        &self,
        student: &mut Student,
        request: &PaymentRequest,
    ) -> AppResult<LedgerEntry> {
        let now = self.clock.now();
        let month = BillingMonth::Month(
            request
                .billing_month
                .unwrap_or_else(|| self.clock.current_period()),
        );

        let detail = match request.payment_type {
            Some(EntryType::Security) => EntryDetail::Security {
                amount: request.amount,
            },
            Some(EntryType::UnionFee) => EntryDetail::UnionFee {
                amount: request.amount,
            },
            _ => EntryDetail::Other {
                amount: request.amount,
            },
        };

        let mut entry = LedgerEntry::new(
            student.id,
            month,
            detail,
            request.payment_method,
            request.recorded_by,
            now,
        );
        entry.transaction_id = request.transaction_id.clone();
        entry.notes = request.notes.clone();
        let entry = self.ledger.create(&entry).await?;

        match entry.entry_type() {
            EntryType::Security => {
                student.security_deposit += request.amount;
                student.updated_at = now;
                self.students.update(student).await?;

                let mut transaction = SecurityDepositTransaction::new(
                    student.id,
                    DepositTransactionKind::Adjustment,
                    request.amount,
                    request.recorded_by,
                    now,
                );
                transaction.payment_id = Some(entry.id);
                transaction.notes = Some("Security deposit received".to_string());
                self.deposits.create(&transaction).await?;
            }
            EntryType::UnionFee => {
                student.union_fee += request.amount;
                student.updated_at = now;
                self.students.update(student).await?;
            }
            _ => {}
        }

        Ok(entry)
    }

    /// Rent payment: append a new row against the resolved month
    async fn record_rent(
        &self,
        student: &Student,
        request: &PaymentRequest,
    ) -> AppResult<LedgerEntry> {
        let period = request
            .billing_month
            .unwrap_or_else(|| self.clock.current_period());
        if !student.owes_period(period) {
            return Err(AppError::MonthBeforeJoining {
                month: period.to_string(),
                joined: student.joining_period().to_string(),
            });
        }

        let month = BillingMonth::Month(period);
        let already_paid: Decimal = self
            .ledger
            .list_for_month(student.id, month)
            .await?
            .iter()
            .filter(|e| e.detail.counts_toward_period())
            .map(|e| e.paid_amount())
            .sum();

        let remaining = (student.monthly_rent - already_paid).max(Decimal::ZERO);
        let due = (remaining - request.amount).max(Decimal::ZERO);
        let advance = (request.amount - remaining).max(Decimal::ZERO);

        let mut entry = LedgerEntry::new(
            student.id,
            month,
            EntryDetail::Rent {
                rent_amount: student.monthly_rent,
                paid_amount: request.amount,
                due_amount: due,
                advance_amount: advance,
            },
            request.payment_method,
            request.recorded_by,
            self.clock.now(),
        );
        entry.transaction_id = request.transaction_id.clone();
        entry.notes = request.notes.clone();
        self.ledger.create(&entry).await
    }

    /// Record up to four sub-payments sequentially: rent, security, union
    /// fee, other
    ///
    /// Not atomic. A failing sub-payment surfaces after the earlier ones
    /// have committed; the caller sees which entries were created.
    #[instrument(skip(self, request), fields(student_id = %request.student_id))]
    pub async fn record_bulk_payment(
        &self,
        request: BulkPaymentRequest,
    ) -> AppResult<BulkPaymentResult> {
        request.validate()?;
        if !request.has_components() {
            return Err(AppError::InvalidInput(
                "Bulk payment carries no amounts".to_string(),
            ));
        }

        let base = |amount: Decimal| PaymentRequest {
            student_id: request.student_id,
            amount,
            payment_type: None,
            is_advance: false,
            billing_month: None,
            payment_method: request.payment_method,
            transaction_id: request.transaction_id.clone(),
            notes: request.notes.clone(),
            recorded_by: request.recorded_by,
        };

        let mut entries = Vec::new();

        if let Some(amount) = request.rent_amount {
            let mut sub = base(amount);
            sub.billing_month = request.billing_month;
            entries.push(self.record_payment(sub).await?);
        }
        if let Some(amount) = request.security_amount {
            let mut sub = base(amount);
            sub.payment_type = Some(EntryType::Security);
            entries.push(self.record_payment(sub).await?);
        }
        if let Some(amount) = request.union_fee_amount {
            let mut sub = base(amount);
            sub.payment_type = Some(EntryType::UnionFee);
            entries.push(self.record_payment(sub).await?);
        }
        if let Some(amount) = request.other_amount {
            let mut sub = base(amount);
            sub.payment_type = Some(EntryType::Other);
            entries.push(self.record_payment(sub).await?);
        }

        Ok(BulkPaymentResult {
            count: entries.len(),
            entries,
        })
    }

    /// Soft-delete a payment with compensating reversal
    ///
    /// If the entry carried advance credit, every active advance application
    /// for the student is invalidated so the next due-status pass rebuilds
    /// them from the surviving ledger.
    #[instrument(skip(self))]
    pub async fn delete_payment(
        &self,
        payment_id: Uuid,
        actor: Option<Uuid>,
    ) -> AppResult<LedgerEntry> {
        let entry = self
            .ledger
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;
        let _guard = self.locks.acquire(entry.student_id).await;

        // Re-read under the lock; a concurrent reversal may have landed
        // between the lookup and the acquire.
        let mut entry = self
            .ledger
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;
        if entry.is_deleted {
            return Err(AppError::Conflict(format!(
                "Payment {} is already deleted",
                payment_id
            )));
        }

        let mut student = self.load_student(entry.student_id).await?;
        let now = self.clock.now();
        let before = serde_json::to_value(&entry)?;

        // Reverse balance side effects before touching the row.
        match entry.detail {
            EntryDetail::Security { amount } => {
                if student.security_deposit < amount {
                    return Err(AppError::InsufficientDeposit {
                        available: student.security_deposit.to_string(),
                        requested: amount.to_string(),
                    });
                }
                student.security_deposit -= amount;
                student.updated_at = now;
                self.students.update(&student).await?;
            }
            EntryDetail::UnionFee { amount } => {
                student.union_fee = (student.union_fee - amount).max(Decimal::ZERO);
                student.updated_at = now;
                self.students.update(&student).await?;
            }
            _ => {}
        }

        entry.is_deleted = true;
        entry.deleted_at = Some(now);
        let entry = self.ledger.update(&entry).await?;

        if entry.generates_advance() {
            let invalidated = self
                .advances
                .soft_delete_for_student(entry.student_id, now)
                .await?;
            if invalidated > 0 {
                warn!(
                    "Reversed {} advance applications after deleting payment {}",
                    invalidated, payment_id
                );
            }
        }

        self.emit_audit(
            AuditEvent::new("delete_payment", "Payment", payment_id.to_string(), actor, now)
                .with_before(before),
        )
        .await;
        self.republish(entry.student_id, serde_json::to_value(&entry)?)
            .await;

        Ok(entry)
    }

    /// Undo a soft-delete, mirroring the reversal cascade
    #[instrument(skip(self))]
    pub async fn restore_payment(
        &self,
        payment_id: Uuid,
        actor: Option<Uuid>,
    ) -> AppResult<LedgerEntry> {
        let entry = self
            .ledger
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;
        let _guard = self.locks.acquire(entry.student_id).await;

        // Same stale-read hazard as deletion: recheck under the lock.
        let mut entry = self
            .ledger
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;
        if !entry.is_deleted {
            return Err(AppError::Conflict(format!(
                "Payment {} is not deleted",
                payment_id
            )));
        }

        let mut student = self.load_student(entry.student_id).await?;
        let now = self.clock.now();

        match entry.detail {
            EntryDetail::Security { amount } => {
                student.security_deposit += amount;
                student.updated_at = now;
                self.students.update(&student).await?;
            }
            EntryDetail::UnionFee { amount } => {
                student.union_fee += amount;
                student.updated_at = now;
                self.students.update(&student).await?;
            }
            _ => {}
        }

        entry.is_deleted = false;
        entry.deleted_at = None;
        let entry = self.ledger.update(&entry).await?;

        // The restored credit changes every later period's figures, so the
        // application log is rebuilt from scratch on the next pass.
        if entry.generates_advance() {
            self.advances
                .soft_delete_for_student(entry.student_id, now)
                .await?;
        }

        self.emit_audit(
            AuditEvent::new(
                "restore_payment",
                "Payment",
                payment_id.to_string(),
                actor,
                now,
            )
            .with_after(serde_json::to_value(&entry)?),
        )
        .await;
        self.republish(entry.student_id, serde_json::to_value(&entry)?)
            .await;

        Ok(entry)
    }

    /// Soft-delete the sentinel advance entry
    ///
    /// Refuses while active applications still reference the credit; delete
    /// those through `delete_payment`, which cascades.
    #[instrument(skip(self))]
    pub async fn delete_advance_payment(
        &self,
        student_id: Uuid,
        actor: Option<Uuid>,
    ) -> AppResult<LedgerEntry> {
        let _guard = self.locks.acquire(student_id).await;

        let mut entry = self
            .ledger
            .find_advance_entry(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active advance credit".to_string()))?;

        let in_use = self.advances.count_active_by_payment(entry.id).await?;
        if in_use > 0 {
            return Err(AppError::AdvanceInUse(in_use as usize));
        }

        let now = self.clock.now();
        let before = serde_json::to_value(&entry)?;
        entry.is_deleted = true;
        entry.deleted_at = Some(now);
        let entry = self.ledger.update(&entry).await?;

        self.emit_audit(
            AuditEvent::new(
                "delete_advance",
                "Payment",
                entry.id.to_string(),
                actor,
                now,
            )
            .with_before(before),
        )
        .await;
        self.republish(student_id, serde_json::to_value(&entry)?)
            .await;

        Ok(entry)
    }
}
