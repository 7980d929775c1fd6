use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{non_empty, Entity};
use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// pending -> confirmed -> active -> completed, cancelled before active
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Active)
                | (Confirmed, Cancelled)
                | (Active, Completed)
        )
    }

    /// Bookings in these states hold a place in the room.
    pub fn holds_room(self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Active)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&super::wire_name(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub boarder_id: Uuid,
    pub room_id: Uuid,
    pub status: BookingStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Inclusive start, exclusive end; a missing end date never ends.
    pub fn overlaps(&self, other: &Booking) -> bool {
        let starts_before_other_ends = other.end_date.map_or(true, |end| self.start_date < end);
        let other_starts_before_end = self.end_date.map_or(true, |end| other.start_date < end);
        starts_before_other_ends && other_starts_before_end
    }
}

impl Entity for Booking {
    const TABLE: &'static str = "bookings";
    const LABEL: &'static str = "Booking";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "boarder_id",
        "room_id",
        "status",
        "start_date",
        "end_date",
        "notes",
        "created_at",
        "updated_at",
    ];
    const MANAGED: &'static [&'static str] = &["status", "boarder_id", "room_id"];

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
        match self.end_date {
            Some(end) if end < self.start_date => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    "end_date".to_string(),
                    "End date cannot be before start date".to_string(),
                );
                Err(errors)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBooking {
    /// Boarder sessions book for themselves and may omit this.
    pub boarder_id: Option<Uuid>,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn into_entity(self, tenant_id: Uuid, boarder_id: Uuid, now: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            tenant_id,
            boarder_id,
            room_id: self.room_id,
            status: BookingStatus::Pending,
            start_date: self.start_date,
            end_date: self.end_date,
            notes: non_empty(self.notes),
            created_at: now,
            updated_at: now,
        }
    }
}
