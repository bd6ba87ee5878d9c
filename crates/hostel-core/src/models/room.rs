//! Room and bed models
//!
//! Inventory CRUD lives outside the billing core; the engine only needs
//! the allocation surface: look up a room, reserve a bed, release a bed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Room availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// At least one bed free
    #[default]
    Available,
    /// All beds occupied
    Full,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Available => write!(f, "available"),
            RoomStatus::Full => write!(f, "full"),
        }
    }
}

impl RoomStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(RoomStatus::Available),
            "full" => Some(RoomStatus::Full),
            _ => None,
        }
    }
}

/// A single bed within a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bed {
    /// Display name, e.g. "Bed 1"
    pub name: String,

    /// Monthly price for this bed
    pub price: Decimal,

    /// Occupancy flag
    pub is_occupied: bool,
}

/// Room entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier
    pub id: Uuid,

    /// Room name or number
    pub name: String,

    /// Floor label
    pub floor: String,

    /// Beds in this room, indexed 1-based by `Student::bed_number`
    pub beds: Vec<Bed>,

    /// Total bed count
    pub total_beds: u32,

    /// Default price when a bed has no explicit price
    pub monthly_rent_per_bed: Decimal,

    /// Count of occupied beds
    pub occupied_beds: u32,

    /// Availability status
    pub status: RoomStatus,

    /// Soft-delete flag
    pub is_deleted: bool,

    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Find a bed index (1-based) by its display name
    pub fn bed_index_by_name(&self, name: &str) -> Option<u32> {
        self.beds
            .iter()
            .position(|b| b.name == name)
            .map(|i| (i + 1) as u32)
    }

    /// Borrow a bed by 1-based index
    pub fn bed(&self, bed_number: u32) -> Option<&Bed> {
        if bed_number == 0 {
            return None;
        }
        self.beds.get(bed_number as usize - 1)
    }

    /// Mutably borrow a bed by 1-based index
    pub fn bed_mut(&mut self, bed_number: u32) -> Option<&mut Bed> {
        if bed_number == 0 {
            return None;
        }
        self.beds.get_mut(bed_number as usize - 1)
    }

    /// Recompute the availability status from the occupancy counter
    pub fn refresh_status(&mut self) {
        self.status = if self.occupied_beds >= self.total_beds {
            RoomStatus::Full
        } else {
            RoomStatus::Available
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn room() -> Room {
        Room {
            id: Uuid::new_v4(),
            name: "101".to_string(),
            floor: "1".to_string(),
            beds: vec![
                Bed {
                    name: "Bed 1".to_string(),
                    price: dec!(5000),
                    is_occupied: false,
                },
                Bed {
                    name: "Bed 2".to_string(),
                    price: dec!(4500),
                    is_occupied: true,
                },
            ],
            total_beds: 2,
            monthly_rent_per_bed: dec!(4750),
            occupied_beds: 1,
            status: RoomStatus::Available,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bed_lookup() {
        let r = room();
        assert_eq!(r.bed_index_by_name("Bed 2"), Some(2));
        assert_eq!(r.bed_index_by_name("Bed 9"), None);
        assert_eq!(r.bed(1).map(|b| b.price), Some(dec!(5000)));
        assert!(r.bed(0).is_none());
        assert!(r.bed(3).is_none());
    }

    #[test]
    fn test_refresh_status() {
        let mut r = room();
        r.occupied_beds = 2;
        r.refresh_status();
        assert_eq!(r.status, RoomStatus::Full);

        r.occupied_beds = 1;
        r.refresh_status();
        assert_eq!(r.status, RoomStatus::Available);
    }
}
