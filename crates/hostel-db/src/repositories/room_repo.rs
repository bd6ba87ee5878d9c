//! Room repository implementation
//!
//! Only the allocation surface the billing engine needs: lookup, occupancy
//! updates, and the room count for the dashboard. Inventory CRUD lives in
//! the outer application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostel_core::{
    models::{Bed, Room, RoomStatus},
    traits::RoomRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const ROOM_COLUMNS: &str = r#"
    id, name, floor, beds, total_beds, monthly_rent_per_bed,
    occupied_beds, status, is_deleted, deleted_at, created_at, updated_at
"#;

/// PostgreSQL implementation of RoomRepository
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new room repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Room>> {
        debug!("Finding room by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, RoomRow>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding room {}: {}", id, e);
            AppError::Database(format!("Failed to find room: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self, room))]
    async fn update(&self, room: &Room) -> AppResult<Room> {
        let beds = serde_json::to_string(&room.beds)
            .map_err(|e| AppError::Serialization(e.to_string()))?;

        let row = sqlx::query_as::<sqlx::Postgres, RoomRow>(&format!(
            r#"
            UPDATE rooms
            SET beds = $2, occupied_beds = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(room.id)
        .bind(beds)
        .bind(room.occupied_beds as i32)
        .bind(room.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating room {}: {}", room.id, e);
            AppError::Database(format!("Failed to update room: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms WHERE is_deleted = FALSE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting rooms: {}", e);
                AppError::Database(format!("Failed to count rooms: {}", e))
            })?;

        Ok(result.0)
    }
}

/// Helper struct for room row mapping
#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    name: String,
    floor: String,
    beds: String,
    total_beds: i32,
    monthly_rent_per_bed: Decimal,
    occupied_beds: i32,
    status: String,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        let beds: Vec<Bed> = serde_json::from_str(&row.beds).unwrap_or_else(|e| {
            warn!("Malformed beds payload for room {}: {}", row.id, e);
            Vec::new()
        });

        Self {
            id: row.id,
            name: row.name,
            floor: row.floor,
            beds,
            total_beds: row.total_beds.max(0) as u32,
            monthly_rent_per_bed: row.monthly_rent_per_bed,
            occupied_beds: row.occupied_beds.max(0) as u32,
            status: RoomStatus::from_str(&row.status).unwrap_or(RoomStatus::Available),
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
