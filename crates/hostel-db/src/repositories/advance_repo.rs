//! Advance application repository implementation
//!
//! Records are an idempotence guard plus audit trail; the engine re-derives
//! actual advance figures from the ledger. The partial unique index on
//! `(student_id, billing_month) WHERE is_deleted = FALSE` backs the
//! find-then-insert pattern against races.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostel_core::{
    models::{AdvanceApplication, BillingPeriod},
    traits::AdvanceApplicationRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const ADVANCE_APP_COLUMNS: &str = r#"
    id, student_id, billing_month, advance_amount_applied,
    due_amount_before, due_amount_after, remaining_advance,
    advance_payment_id, notes, is_deleted, deleted_at, created_at
"#;

/// PostgreSQL implementation of AdvanceApplicationRepository
pub struct PgAdvanceApplicationRepository {
    pool: PgPool,
}

impl PgAdvanceApplicationRepository {
    /// Create a new advance application repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdvanceApplicationRepository for PgAdvanceApplicationRepository {
    #[instrument(skip(self, application))]
    async fn create(&self, application: &AdvanceApplication) -> AppResult<AdvanceApplication> {
        debug!(
            "Recording advance application for student {} ({})",
            application.student_id, application.billing_month
        );

        let row = sqlx::query_as::<sqlx::Postgres, AdvanceApplicationRow>(&format!(
            r#"
            INSERT INTO advance_applications (
                id, student_id, billing_month, advance_amount_applied,
                due_amount_before, due_amount_after, remaining_advance,
                advance_payment_id, notes, is_deleted, deleted_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ADVANCE_APP_COLUMNS}
            "#
        ))
        .bind(application.id)
        .bind(application.student_id)
        .bind(application.billing_month.to_string())
        .bind(application.advance_amount_applied)
        .bind(application.due_amount_before)
        .bind(application.due_amount_after)
        .bind(application.remaining_advance)
        .bind(application.advance_payment_id)
        .bind(&application.notes)
        .bind(application.is_deleted)
        .bind(application.deleted_at)
        .bind(application.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating advance application: {}", e);
            AppError::Database(format!("Failed to create advance application: {}", e))
        })?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        student_id: Uuid,
        period: BillingPeriod,
    ) -> AppResult<Option<AdvanceApplication>> {
        let result = sqlx::query_as::<sqlx::Postgres, AdvanceApplicationRow>(&format!(
            r#"
            SELECT {ADVANCE_APP_COLUMNS} FROM advance_applications
            WHERE student_id = $1 AND billing_month = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(student_id)
        .bind(period.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding advance application: {}", e);
            AppError::Database(format!("Failed to find advance application: {}", e))
        })?;

        result.map(AdvanceApplication::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<AdvanceApplication>> {
        let rows = sqlx::query_as::<sqlx::Postgres, AdvanceApplicationRow>(&format!(
            r#"
            SELECT {ADVANCE_APP_COLUMNS} FROM advance_applications
            WHERE student_id = $1 AND is_deleted = FALSE
            ORDER BY billing_month, created_at
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing advance applications: {}", e);
            AppError::Database(format!("Failed to list advance applications: {}", e))
        })?;

        rows.into_iter().map(AdvanceApplication::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count_active_by_payment(&self, advance_payment_id: Uuid) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM advance_applications
            WHERE advance_payment_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(advance_payment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting advance applications: {}", e);
            AppError::Database(format!("Failed to count advance applications: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn soft_delete_for_student(
        &self,
        student_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE advance_applications
            SET is_deleted = TRUE, deleted_at = $2
            WHERE student_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(student_id)
        .bind(deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error invalidating advance applications: {}", e);
            AppError::Database(format!("Failed to invalidate advance applications: {}", e))
        })?;

        debug!(
            "Invalidated {} advance applications for student {}",
            result.rows_affected(),
            student_id
        );

        Ok(result.rows_affected())
    }
}

/// Helper struct for advance application row mapping
#[derive(Debug, sqlx::FromRow)]
struct AdvanceApplicationRow {
    id: Uuid,
    student_id: Uuid,
    billing_month: String,
    advance_amount_applied: Decimal,
    due_amount_before: Decimal,
    due_amount_after: Decimal,
    remaining_advance: Decimal,
    advance_payment_id: Option<Uuid>,
    notes: Option<String>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdvanceApplicationRow> for AdvanceApplication {
    type Error = AppError;

    fn try_from(row: AdvanceApplicationRow) -> Result<Self, Self::Error> {
        let billing_month: BillingPeriod = row
            .billing_month
            .parse()
            .map_err(|e: String| AppError::Database(format!("Corrupt billing_month: {}", e)))?;

        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            billing_month,
            advance_amount_applied: row.advance_amount_applied,
            due_amount_before: row.due_amount_before,
            due_amount_after: row.due_amount_after,
            remaining_advance: row.remaining_advance,
            advance_payment_id: row.advance_payment_id,
            notes: row.notes,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
        })
    }
}
