use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{fits_numeric, Entity};
use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub room_number: String,
    pub floor: i32,
    pub capacity: i32,
    pub monthly_rate: Decimal,
    pub amenities: Vec<String>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Room {
    const TABLE: &'static str = "rooms";
    const LABEL: &'static str = "Room";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "property_id",
        "room_number",
        "floor",
        "capacity",
        "monthly_rate",
        "amenities",
        "status",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["property_id", "room_number"]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.room_number.trim().is_empty() {
            errors.insert("room_number".to_string(), "Room number is required".to_string());
        }
        if self.capacity < 1 {
            errors.insert("capacity".to_string(), "Capacity must be at least 1".to_string());
        }
        if self.monthly_rate.is_sign_negative() {
            errors.insert("monthly_rate".to_string(), "Monthly rate cannot be negative".to_string());
        } else if !fits_numeric(self.monthly_rate, 12, 2) {
            errors.insert("monthly_rate".to_string(), "Monthly rate must be below 10000000000".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        if !self.amenities.iter().all(|a| seen.insert(a.as_str())) {
            errors.insert("amenities".to_string(), "Amenities must be unique".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Room {
    /// Whether this room is open for new bookings.
    pub fn is_bookable(&self) -> bool {
        self.status != RoomStatus::Maintenance
    }
}

/// Trim, drop blanks and deduplicate while keeping first-seen order.
pub fn normalize_amenities(amenities: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    amenities
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(a.to_lowercase()))
        .collect()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRoom {
    pub property_id: Uuid,
    #[validate(length(min = 1, max = 20, message = "Room number must be 1-20 characters"))]
    pub room_number: String,
    #[validate(range(min = -5, max = 200, message = "Floor is out of range"))]
    #[serde(default)]
    pub floor: i32,
    #[validate(range(min = 1, max = 50, message = "Capacity must be between 1 and 50"))]
    pub capacity: i32,
    pub monthly_rate: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub status: Option<RoomStatus>,
}

impl NewRoom {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> Room {
        Room {
            id: Uuid::new_v4(),
            tenant_id,
            property_id: self.property_id,
            room_number: self.room_number.trim().to_string(),
            floor: self.floor,
            capacity: self.capacity,
            monthly_rate: self.monthly_rate,
            amenities: normalize_amenities(self.amenities),
            status: self.status.unwrap_or(RoomStatus::Available),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_amenities_as_a_set() {
        let amenities = normalize_amenities(vec![
            " WiFi ".to_string(),
            "aircon".to_string(),
            "wifi".to_string(),
            "".to_string(),
        ]);
        assert_eq!(amenities, vec!["WiFi".to_string(), "aircon".to_string()]);
    }

    #[test]
    fn check_rejects_zero_capacity_and_negative_rate() {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            room_number: "2A".to_string(),
            floor: 2,
            capacity: 0,
            monthly_rate: Decimal::new(-1, 0),
            amenities: vec![],
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        let errors = room.check().unwrap_err();
        assert!(errors.contains_key("capacity"));
        assert!(errors.contains_key("monthly_rate"));

        let room = Room {
            capacity: 2,
            monthly_rate: Decimal::new(10_000_000_000, 0),
            ..room
        };
        assert!(room.check().unwrap_err().contains_key("monthly_rate"));
    }
}
