//! Student repository implementation
//!
//! PostgreSQL-backed storage for students, including the bed-occupancy
//! lookup and student-code sequencing queries the engine needs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hostel_core::{
    models::{Student, StudentStatus},
    traits::StudentRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const STUDENT_COLUMNS: &str = r#"
    id, student_code, name, phone, guardian_name, guardian_phone,
    room_id, bed_number, joining_date, monthly_rent,
    security_deposit, union_fee, status,
    is_deleted, deleted_at, created_at, updated_at
"#;

/// PostgreSQL implementation of StudentRepository
pub struct PgStudentRepository {
    pool: PgPool,
}

impl PgStudentRepository {
    /// Create a new student repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Student>> {
        debug!("Finding student by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, StudentRow>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding student {}: {}", id, e);
            AppError::Database(format!("Failed to find student: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self, student))]
    async fn create(&self, student: &Student) -> AppResult<Student> {
        debug!("Creating student {}", student.student_code);

        let row = sqlx::query_as::<sqlx::Postgres, StudentRow>(&format!(
            r#"
            INSERT INTO students (
                id, student_code, name, phone, guardian_name, guardian_phone,
                room_id, bed_number, joining_date, monthly_rent,
                security_deposit, union_fee, status, is_deleted, deleted_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student.id)
        .bind(&student.student_code)
        .bind(&student.name)
        .bind(&student.phone)
        .bind(&student.guardian_name)
        .bind(&student.guardian_phone)
        .bind(student.room_id)
        .bind(student.bed_number as i32)
        .bind(student.joining_date)
        .bind(student.monthly_rent)
        .bind(student.security_deposit)
        .bind(student.union_fee)
        .bind(student.status.to_string())
        .bind(student.is_deleted)
        .bind(student.deleted_at)
        .bind(student.created_at)
        .bind(student.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating student: {}", e);
            AppError::Database(format!("Failed to create student: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, student))]
    async fn update(&self, student: &Student) -> AppResult<Student> {
        let row = sqlx::query_as::<sqlx::Postgres, StudentRow>(&format!(
            r#"
            UPDATE students
            SET name = $2, phone = $3, guardian_name = $4, guardian_phone = $5,
                room_id = $6, bed_number = $7, joining_date = $8,
                monthly_rent = $9, security_deposit = $10, union_fee = $11,
                status = $12, is_deleted = $13, deleted_at = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student.id)
        .bind(&student.name)
        .bind(&student.phone)
        .bind(&student.guardian_name)
        .bind(&student.guardian_phone)
        .bind(student.room_id)
        .bind(student.bed_number as i32)
        .bind(student.joining_date)
        .bind(student.monthly_rent)
        .bind(student.security_deposit)
        .bind(student.union_fee)
        .bind(student.status.to_string())
        .bind(student.is_deleted)
        .bind(student.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating student {}: {}", student.id, e);
            AppError::Database(format!("Failed to update student: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> AppResult<Vec<Student>> {
        let rows = sqlx::query_as::<sqlx::Postgres, StudentRow>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students
            WHERE status = 'active' AND is_deleted = FALSE
            ORDER BY created_at
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing active students: {}", e);
            AppError::Database(format!("Failed to list students: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count_active(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM students WHERE status = 'active' AND is_deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting students: {}", e);
            AppError::Database(format!("Failed to count students: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn last_code_with_prefix(&self, prefix: &str) -> AppResult<Option<String>> {
        let result: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT student_code FROM students
            WHERE student_code LIKE $1 || '%'
            ORDER BY student_code DESC
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding last student code: {}", e);
            AppError::Database(format!("Failed to find last student code: {}", e))
        })?;

        Ok(result.map(|r| r.0))
    }

    #[instrument(skip(self))]
    async fn find_active_by_bed(
        &self,
        room_id: Uuid,
        bed_number: u32,
    ) -> AppResult<Option<Student>> {
        let result = sqlx::query_as::<sqlx::Postgres, StudentRow>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students
            WHERE room_id = $1 AND bed_number = $2
              AND status = 'active' AND is_deleted = FALSE
            "#
        ))
        .bind(room_id)
        .bind(bed_number as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding bed occupant: {}", e);
            AppError::Database(format!("Failed to find bed occupant: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for student row mapping
#[derive(Debug, sqlx::FromRow)]
struct StudentRow {
    id: Uuid,
    student_code: String,
    name: String,
    phone: String,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
    room_id: Uuid,
    bed_number: i32,
    joining_date: NaiveDate,
    monthly_rent: Decimal,
    security_deposit: Decimal,
    union_fee: Decimal,
    status: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            student_code: row.student_code,
            name: row.name,
            phone: row.phone,
            guardian_name: row.guardian_name,
            guardian_phone: row.guardian_phone,
            room_id: row.room_id,
            bed_number: row.bed_number.max(0) as u32,
            joining_date: row.joining_date,
            monthly_rent: row.monthly_rent,
            security_deposit: row.security_deposit,
            union_fee: row.union_fee,
            status: StudentStatus::from_str(&row.status).unwrap_or(StudentStatus::Active),
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
