//! Ledger entry repository implementation
//!
//! Append-style storage of payment ledger entries. Rows are flattened into
//! typed `EntryDetail` payloads on read; the `billing_month` column holds
//! either a `YYYY-MM` period or the `ADVANCE` sentinel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostel_core::{
    models::{BillingMonth, BillingPeriod, EntryDetail, EntryType, LedgerEntry, PaymentMethod},
    traits::LedgerRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const LEDGER_COLUMNS: &str = r#"
    id, student_id, billing_month, entry_type,
    rent_amount, paid_amount, due_amount, advance_amount,
    payment_method, transaction_id, notes, recorded_by,
    is_deleted, deleted_at, created_at
"#;

/// PostgreSQL implementation of LedgerRepository
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    /// Create a new ledger repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        debug!("Finding ledger entry by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding ledger entry {}: {}", id, e);
            AppError::Database(format!("Failed to find ledger entry: {}", e))
        })?;

        result.map(LedgerEntry::try_from).transpose()
    }

    #[instrument(skip(self, entry))]
    async fn create(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        debug!(
            "Appending {} entry for student {} ({})",
            entry.entry_type(),
            entry.student_id,
            entry.billing_month
        );

        let (entry_type, rent, paid, due, advance) = entry.detail.to_parts();

        let row = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            r#"
            INSERT INTO ledger_entries (
                id, student_id, billing_month, entry_type,
                rent_amount, paid_amount, due_amount, advance_amount,
                payment_method, transaction_id, notes, recorded_by,
                is_deleted, deleted_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {LEDGER_COLUMNS}
            "#
        ))
        .bind(entry.id)
        .bind(entry.student_id)
        .bind(entry.billing_month.to_string())
        .bind(entry_type.to_string())
        .bind(rent)
        .bind(paid)
        .bind(due)
        .bind(advance)
        .bind(entry.payment_method.to_string())
        .bind(&entry.transaction_id)
        .bind(&entry.notes)
        .bind(entry.recorded_by)
        .bind(entry.is_deleted)
        .bind(entry.deleted_at)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating ledger entry: {}", e);
            AppError::Database(format!("Failed to create ledger entry: {}", e))
        })?;

        row.try_into()
    }

    #[instrument(skip(self, entry))]
    async fn update(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        let (entry_type, rent, paid, due, advance) = entry.detail.to_parts();

        let row = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            r#"
            UPDATE ledger_entries
            SET entry_type = $2, rent_amount = $3, paid_amount = $4,
                due_amount = $5, advance_amount = $6, payment_method = $7,
                transaction_id = $8, notes = $9, recorded_by = $10,
                is_deleted = $11, deleted_at = $12
            WHERE id = $1
            RETURNING {LEDGER_COLUMNS}
            "#
        ))
        .bind(entry.id)
        .bind(entry_type.to_string())
        .bind(rent)
        .bind(paid)
        .bind(due)
        .bind(advance)
        .bind(entry.payment_method.to_string())
        .bind(&entry.transaction_id)
        .bind(&entry.notes)
        .bind(entry.recorded_by)
        .bind(entry.is_deleted)
        .bind(entry.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating ledger entry {}: {}", entry.id, e);
            AppError::Database(format!("Failed to update ledger entry: {}", e))
        })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            r#"
            SELECT {LEDGER_COLUMNS} FROM ledger_entries
            WHERE student_id = $1 AND is_deleted = FALSE
            ORDER BY billing_month, created_at
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing ledger entries: {}", e);
            AppError::Database(format!("Failed to list ledger entries: {}", e))
        })?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_for_month(
        &self,
        student_id: Uuid,
        month: BillingMonth,
    ) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            r#"
            SELECT {LEDGER_COLUMNS} FROM ledger_entries
            WHERE student_id = $1 AND billing_month = $2 AND is_deleted = FALSE
            ORDER BY created_at
            "#
        ))
        .bind(student_id)
        .bind(month.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing month entries: {}", e);
            AppError::Database(format!("Failed to list month entries: {}", e))
        })?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_advance_entry(&self, student_id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let result = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            r#"
            SELECT {LEDGER_COLUMNS} FROM ledger_entries
            WHERE student_id = $1 AND billing_month = 'ADVANCE'
              AND entry_type = 'advance' AND is_deleted = FALSE
            ORDER BY created_at
            LIMIT 1
            "#
        ))
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding advance entry: {}", e);
            AppError::Database(format!("Failed to find advance entry: {}", e))
        })?;

        result.map(LedgerEntry::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_all_for_period(&self, period: BillingPeriod) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<sqlx::Postgres, LedgerRow>(&format!(
            r#"
            SELECT {LEDGER_COLUMNS} FROM ledger_entries
            WHERE billing_month = $1 AND is_deleted = FALSE
            ORDER BY created_at
            "#
        ))
        .bind(period.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing period entries: {}", e);
            AppError::Database(format!("Failed to list period entries: {}", e))
        })?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}

/// Helper struct for ledger row mapping
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    student_id: Uuid,
    billing_month: String,
    entry_type: String,
    rent_amount: Decimal,
    paid_amount: Decimal,
    due_amount: Decimal,
    advance_amount: Decimal,
    payment_method: String,
    transaction_id: Option<String>,
    notes: Option<String>,
    recorded_by: Option<Uuid>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let billing_month: BillingMonth = row
            .billing_month
            .parse()
            .map_err(|e: String| AppError::Database(format!("Corrupt billing_month: {}", e)))?;

        let entry_type = EntryType::from_str(&row.entry_type).ok_or_else(|| {
            AppError::Database(format!("Unknown entry type: {}", row.entry_type))
        })?;

        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            billing_month,
            detail: EntryDetail::from_parts(
                entry_type,
                row.rent_amount,
                row.paid_amount,
                row.due_amount,
                row.advance_amount,
            ),
            payment_method: PaymentMethod::from_str(&row.payment_method)
                .unwrap_or(PaymentMethod::Cash),
            transaction_id: row.transaction_id,
            notes: row.notes,
            recorded_by: row.recorded_by,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        })
    }
}
