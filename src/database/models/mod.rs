use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::error::FieldErrors;

pub mod boarder;
pub mod booking;
pub mod landlord;
pub mod maintenance;
pub mod payment;
pub mod property;
pub mod room;
pub mod user;
pub mod utility;

pub use boarder::{Boarder, NewBoarder};
pub use booking::{Booking, BookingStatus, NewBooking};
pub use landlord::{Landlord, NewLandlord};
pub use maintenance::{MaintenancePriority, MaintenanceRequest, MaintenanceStatus, NewMaintenanceRequest};
pub use payment::{NewPayment, Payment, PaymentStatus, PaymentType};
pub use property::{NewProperty, Property};
pub use room::{NewRoom, Room, RoomStatus};
pub use user::{NewUser, User, UserRole};
pub use utility::{NewUtilityReading, UtilityReading, UtilityType};

/// A tenant-scoped table row.
///
/// Both store back ends work from this description: the column list drives
/// the generated SQL, and the serde form of the row is what the in-memory
/// store keeps.
pub trait Entity:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    /// Human readable name used in messages
    const LABEL: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns only lifecycle procedures may change
    const MANAGED: &'static [&'static str] = &[];
    /// Column sets that must be unique across the table
    const UNIQUE: &'static [&'static [&'static str]] = &[];

    fn id(&self) -> Uuid;
    fn tenant_id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Row level invariants, checked before every write
    fn check(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

/// Lowercase/uppercase wire form of a serde enum, used for filters.
pub fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

/// Whether `value` fits a `NUMERIC(precision, scale)` column.
pub(crate) fn fits_numeric(value: Decimal, precision: u32, scale: u32) -> bool {
    value.abs() < Decimal::from(10_i64.pow(precision - scale))
}

/// Empty strings from forms mean "not provided".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
