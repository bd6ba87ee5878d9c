//! Due-status calculation and automatic advance application
//!
//! The calculator is the single source of truth for what a student owes.
//! It never trusts the write-time `due_amount`/`advance_amount` caches on
//! ledger rows; every figure is rebuilt from paid amounts and entry types.
//! Running it twice over an unchanged ledger yields identical figures and
//! writes nothing new.

use crate::constants::AUTO_DUE_NOTE;
use crate::engine::ResidentialLedger;
use hostel_core::{
    models::{
        AdvanceApplication, BillingMonth, BillingPeriod, EntryDetail, LedgerEntry, PaymentMethod,
    },
    AppResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Payment state of a single billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Paid,
    Partial,
    Unpaid,
}

/// Overall due classification for a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueClassification {
    NoDue,
    OneMonth,
    TwoPlusMonths,
}

/// Recomputed figures for one billing period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDueStatus {
    pub month: BillingPeriod,

    /// Obligation for the period (rent snapshot)
    pub rent_amount: Decimal,

    /// Sum of non-deleted rent/adjustment payments
    pub paid_amount: Decimal,

    /// Due remaining after advance application
    pub due_amount: Decimal,

    /// Overpayment this period contributed as fresh credit
    pub advance_amount: Decimal,

    /// Credit consumed by this period during the pass
    pub advance_applied: Decimal,

    pub status: PeriodStatus,
}

/// Full due-status report for a student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueStatusReport {
    pub student_id: Uuid,
    pub student_code: String,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    pub periods: Vec<PeriodDueStatus>,

    /// Sum of per-period dues after advance application
    pub total_due: Decimal,

    /// Unconsumed advance credit after the pass
    pub total_advance: Decimal,

    /// Trailing run of consecutive due periods ending at the current month
    pub consecutive_due_months: u32,

    pub classification: DueClassification,
}

impl DueStatusReport {
    /// Periods that still carry due, oldest first
    pub fn due_periods(&self) -> impl Iterator<Item = &PeriodDueStatus> {
        self.periods
            .iter()
            .filter(|p| p.due_amount > Decimal::ZERO)
    }
}

impl ResidentialLedger {
    /// Compute the student's due status, materializing missing monthly dues
    /// and applying available advance credit
    #[instrument(skip(self))]
    pub async fn due_status(&self, student_id: Uuid) -> AppResult<DueStatusReport> {
        let _guard = self.locks.acquire(student_id).await;
        self.due_status_locked(student_id).await
    }

    /// Lock-free variant for callers already holding the student's lock
    pub(crate) async fn due_status_locked(&self, student_id: Uuid) -> AppResult<DueStatusReport> {
        let student = self.load_student(student_id).await?;
        let current = self.clock.current_period();
        let periods = BillingPeriod::sequence(student.joining_period(), current);
        let mut entries = self.ledger.list_for_student(student_id).await?;

        // Lazily materialize zero-paid dues for fully elapsed months that
        // have no rent or adjustment row yet. Existence-guarded, so a crash
        // between rows is healed by the next run.
        for period in periods.iter().filter(|p| **p < current) {
            let month = BillingMonth::Month(*period);
            let exists = entries
                .iter()
                .any(|e| e.billing_month == month && e.detail.counts_toward_period());
            if exists {
                continue;
            }

            let mut entry = LedgerEntry::new(
                student_id,
                month,
                EntryDetail::Rent {
                    rent_amount: student.monthly_rent,
                    paid_amount: Decimal::ZERO,
                    due_amount: student.monthly_rent,
                    advance_amount: Decimal::ZERO,
                },
                PaymentMethod::Adjustment,
                None,
                self.clock.now(),
            );
            entry.notes = Some(AUTO_DUE_NOTE.to_string());
            let created = self.ledger.create(&entry).await?;

            info!(
                "Materialized {} {} due for student {} ({})",
                self.currency(),
                student.monthly_rent,
                student.student_code,
                period
            );
            self.emit_notification(
                "due",
                "Monthly due created",
                format!(
                    "{} owes {} {} for {}",
                    student.name,
                    self.currency(),
                    student.monthly_rent,
                    period
                ),
                None,
            )
            .await;

            entries.push(created);
        }

        // Seed available credit from the surviving advance entries.
        let advance_payment_id = entries
            .iter()
            .find(|e| e.billing_month.is_advance())
            .map(|e| e.id);
        let mut available: Decimal = entries
            .iter()
            .filter(|e| e.billing_month.is_advance())
            .map(|e| e.advance_amount())
            .sum();

        let mut report_periods = Vec::with_capacity(periods.len());
        let mut total_due = Decimal::ZERO;

        for period in &periods {
            let month = BillingMonth::Month(*period);
            let paid: Decimal = entries
                .iter()
                .filter(|e| e.billing_month == month && e.detail.counts_toward_period())
                .map(|e| e.paid_amount())
                .sum();

            let rent = student.monthly_rent;
            let overpay = (paid - rent).max(Decimal::ZERO);
            let due_before = (rent - paid).max(Decimal::ZERO);

            // Overpayment rolls forward as credit within this same pass.
            available += overpay;

            let mut applied = Decimal::ZERO;
            if due_before > Decimal::ZERO && available > Decimal::ZERO {
                applied = due_before.min(available);
                available -= applied;

                // One active application per (student, period). The record is
                // an idempotence guard; the applied figure above stands
                // regardless of whether a row already exists.
                if self
                    .advances
                    .find_active(student_id, *period)
                    .await?
                    .is_none()
                {
                    let application = AdvanceApplication::new(
                        student_id,
                        *period,
                        applied,
                        due_before,
                        available,
                        advance_payment_id,
                        self.clock.now(),
                    );
                    self.advances.create(&application).await?;
                    debug!(
                        "Applied {} advance to {} for student {}",
                        applied, period, student.student_code
                    );
                }
            }

            let due = due_before - applied;
            let status = if due == Decimal::ZERO {
                PeriodStatus::Paid
            } else if paid + applied > Decimal::ZERO {
                PeriodStatus::Partial
            } else {
                PeriodStatus::Unpaid
            };

            total_due += due;
            report_periods.push(PeriodDueStatus {
                month: *period,
                rent_amount: rent,
                paid_amount: paid,
                due_amount: due,
                advance_amount: overpay,
                advance_applied: applied,
                status,
            });
        }

        let consecutive_due_months = report_periods
            .iter()
            .rev()
            .take_while(|p| p.due_amount > Decimal::ZERO)
            .count() as u32;

        let due_month_count = report_periods
            .iter()
            .filter(|p| p.due_amount > Decimal::ZERO)
            .count();
        let classification = match due_month_count {
            0 => DueClassification::NoDue,
            1 => DueClassification::OneMonth,
            _ => DueClassification::TwoPlusMonths,
        };

        Ok(DueStatusReport {
            student_id,
            student_code: student.student_code,
            monthly_rent: student.monthly_rent,
            security_deposit: student.security_deposit,
            periods: report_periods,
            total_due,
            total_advance: available,
            consecutive_due_months,
            classification,
        })
    }
}
