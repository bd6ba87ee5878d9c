//! Security deposit transaction repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostel_core::{
    models::{BillingPeriod, DepositTransactionKind, SecurityDepositTransaction},
    traits::DepositTransactionRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const DEPOSIT_TX_COLUMNS: &str = r#"
    id, student_id, kind, amount, billing_month, payment_id,
    notes, processed_by, is_deleted, deleted_at, created_at
"#;

/// PostgreSQL implementation of DepositTransactionRepository
pub struct PgDepositTransactionRepository {
    pool: PgPool,
}

impl PgDepositTransactionRepository {
    /// Create a new deposit transaction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepositTransactionRepository for PgDepositTransactionRepository {
    #[instrument(skip(self, transaction))]
    async fn create(
        &self,
        transaction: &SecurityDepositTransaction,
    ) -> AppResult<SecurityDepositTransaction> {
        debug!(
            "Recording {} deposit transaction for student {}",
            transaction.kind, transaction.student_id
        );

        let row = sqlx::query_as::<sqlx::Postgres, DepositTransactionRow>(&format!(
            r#"
            INSERT INTO deposit_transactions (
                id, student_id, kind, amount, billing_month, payment_id,
                notes, processed_by, is_deleted, deleted_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {DEPOSIT_TX_COLUMNS}
            "#
        ))
        .bind(transaction.id)
        .bind(transaction.student_id)
        .bind(transaction.kind.to_string())
        .bind(transaction.amount)
        .bind(transaction.billing_month.map(|m| m.to_string()))
        .bind(transaction.payment_id)
        .bind(&transaction.notes)
        .bind(transaction.processed_by)
        .bind(transaction.is_deleted)
        .bind(transaction.deleted_at)
        .bind(transaction.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating deposit transaction: {}", e);
            AppError::Database(format!("Failed to create deposit transaction: {}", e))
        })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> AppResult<Vec<SecurityDepositTransaction>> {
        let rows = sqlx::query_as::<sqlx::Postgres, DepositTransactionRow>(&format!(
            r#"
            SELECT {DEPOSIT_TX_COLUMNS} FROM deposit_transactions
            WHERE student_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing deposit transactions: {}", e);
            AppError::Database(format!("Failed to list deposit transactions: {}", e))
        })?;

        rows.into_iter()
            .map(SecurityDepositTransaction::try_from)
            .collect()
    }
}

/// Helper struct for deposit transaction row mapping
#[derive(Debug, sqlx::FromRow)]
struct DepositTransactionRow {
    id: Uuid,
    student_id: Uuid,
    kind: String,
    amount: Decimal,
    billing_month: Option<String>,
    payment_id: Option<Uuid>,
    notes: Option<String>,
    processed_by: Option<Uuid>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DepositTransactionRow> for SecurityDepositTransaction {
    type Error = AppError;

    fn try_from(row: DepositTransactionRow) -> Result<Self, Self::Error> {
        let kind = DepositTransactionKind::from_str(&row.kind)
            .ok_or_else(|| AppError::Database(format!("Unknown deposit kind: {}", row.kind)))?;

        let billing_month = row
            .billing_month
            .map(|m| {
                m.parse::<BillingPeriod>().map_err(|e| {
                    AppError::Database(format!("Corrupt billing_month: {}", e))
                })
            })
            .transpose()?;

        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            kind,
            amount: row.amount,
            billing_month,
            payment_id: row.payment_id,
            notes: row.notes,
            processed_by: row.processed_by,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        })
    }
}
