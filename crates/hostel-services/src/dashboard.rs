//! Dashboard aggregates and the monthly billing job
//!
//! The residential due figure is a full recomputation over every active
//! student, so the dashboard can never drift from the ledger.

use crate::constants::AUTO_DUE_NOTE;
use crate::engine::ResidentialLedger;
use hostel_core::{
    models::{BillingMonth, BillingPeriod, EntryDetail, LedgerEntry, PaymentMethod},
    AppResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Combined dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_rooms: i64,
    pub active_students: i64,

    /// Sum of per-student dues after advance application
    pub residential_due: Decimal,

    /// Outstanding coaching admissions, from the parallel ledger
    pub coaching_due: Decimal,

    pub total_due: Decimal,
}

/// One month of the collection/due chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPoint {
    pub month: BillingPeriod,

    /// Money received across all students in the calendar month
    pub collection: Decimal,

    /// Cached dues written in the calendar month
    pub due: Decimal,
}

fn previous_period(period: BillingPeriod) -> BillingPeriod {
    let (year, month) = if period.month() == 1 {
        (period.year() - 1, 12)
    } else {
        (period.year(), period.month() - 1)
    };
    // Safe: month stays in 1..=12
    BillingPeriod::new(year, month).unwrap_or(period)
}

impl ResidentialLedger {
    /// Compute the combined dashboard aggregate
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let total_rooms = self.rooms.count().await?;
        let students = self.students.list_active().await?;
        let active_students = students.len() as i64;

        let mut residential_due = Decimal::ZERO;
        for student in &students {
            let report = self.due_status(student.id).await?;
            residential_due += report.total_due;
        }

        let coaching_due = self.coaching.admission_due_total().await?;

        Ok(DashboardStats {
            total_rooms,
            active_students,
            residential_due,
            coaching_due,
            total_due: residential_due + coaching_due,
        })
    }

    /// Collection/due chart over the trailing `months` calendar months,
    /// oldest first
    #[instrument(skip(self))]
    pub async fn monthly_chart(&self, months: u32) -> AppResult<Vec<ChartPoint>> {
        let months = months.max(1);
        let mut period = self.clock.current_period();
        let mut points = Vec::with_capacity(months as usize);

        for _ in 0..months {
            let entries = self.ledger.list_all_for_period(period).await?;
            let collection = entries.iter().map(|e| e.paid_amount()).sum();
            let due = entries.iter().map(|e| e.detail.cached_due()).sum();
            points.push(ChartPoint {
                month: period,
                collection,
                due,
            });
            period = previous_period(period);
        }

        points.reverse();
        Ok(points)
    }

    /// Materialize the current month's zero-paid due rows for every active
    /// student lacking one
    ///
    /// Convenience for a scheduler; the due-status calculator derives the
    /// same result lazily without it. Returns the number of rows created.
    #[instrument(skip(self))]
    pub async fn materialize_monthly_dues(&self) -> AppResult<usize> {
        let current = self.clock.current_period();
        let month = BillingMonth::Month(current);
        let students = self.students.list_active().await?;
        let mut created = 0usize;

        for student in students {
            let _guard = self.locks.acquire(student.id).await;
            if !student.owes_period(current) {
                continue;
            }

            let exists = self
                .ledger
                .list_for_month(student.id, month)
                .await?
                .iter()
                .any(|e| e.detail.counts_toward_period());
            if exists {
                continue;
            }

            let mut entry = LedgerEntry::new(
                student.id,
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
            self.ledger.create(&entry).await?;
            created += 1;
        }

        info!("Materialized {} due rows for {}", created, current);
        if created > 0 {
            self.notifier
                .publish_dashboard_update(serde_json::json!({
                    "month": current.to_string(),
                    "dues_created": created,
                }))
                .await;
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_period_wraps_year() {
        let jan = BillingPeriod::new(2025, 1).unwrap();
        assert_eq!(previous_period(jan).to_string(), "2024-12");

        let jul = BillingPeriod::new(2025, 7).unwrap();
        assert_eq!(previous_period(jul).to_string(), "2025-06");
    }
}
