use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::database::models::Entity;

/// System fields that are owned by the store, not by API input
const SYSTEM_FIELDS: &[&str] = &["id", "tenant_id", "created_at", "updated_at"];

/// Errors that can occur while applying an update to a stored row
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set via API")]
    SystemFieldNotAllowed(String),
    #[error("Field '{0}' is managed by lifecycle procedures")]
    ManagedFieldNotAllowed(String),
    #[error("Unknown field '{field}' for {entity}")]
    UnknownField { entity: &'static str, field: String },
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// Merge `patch` into `current` and return the updated row.
///
/// Only writable columns may appear in the patch. The merged JSON is parsed
/// back into `T`, so type errors surface here rather than in the store.
pub fn apply_patch<T: Entity>(
    current: &T,
    patch: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<T, RecordError> {
    for key in patch.keys() {
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            return Err(RecordError::SystemFieldNotAllowed(key.clone()));
        }
        if T::MANAGED.contains(&key.as_str()) {
            return Err(RecordError::ManagedFieldNotAllowed(key.clone()));
        }
        if !T::COLUMNS.contains(&key.as_str()) {
            return Err(RecordError::UnknownField {
                entity: T::LABEL,
                field: key.clone(),
            });
        }
    }

    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        Err(e) => return Err(RecordError::InvalidJson(e.to_string())),
    };
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    merged.insert(
        "updated_at".to_string(),
        serde_json::to_value(now).map_err(|e| RecordError::InvalidJson(e.to_string()))?,
    );

    serde_json::from_value(Value::Object(merged)).map_err(|e| RecordError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Booking, BookingStatus, Room, RoomStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;

    fn room() -> Room {
        let now = Utc::now();
        Room {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            room_number: "101".to_string(),
            floor: 1,
            capacity: 2,
            monthly_rate: Decimal::new(450000, 2),
            amenities: vec!["wifi".to_string()],
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn merges_writable_fields() {
        let current = room();
        let now = Utc::now();
        let updated = apply_patch(
            &current,
            &patch(json!({ "capacity": 3, "status": "MAINTENANCE", "monthly_rate": "5000.00" })),
            now,
        )
        .unwrap();

        assert_eq!(updated.id, current.id);
        assert_eq!(updated.capacity, 3);
        assert_eq!(updated.status, RoomStatus::Maintenance);
        assert_eq!(updated.monthly_rate, Decimal::new(500000, 2));
        assert_eq!(updated.updated_at, now);
        assert_eq!(updated.room_number, "101");
    }

    #[test]
    fn rejects_system_fields() {
        let err = apply_patch(&room(), &patch(json!({ "tenant_id": Uuid::new_v4() })), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RecordError::SystemFieldNotAllowed(f) if f == "tenant_id"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = apply_patch(&room(), &patch(json!({ "colour": "blue" })), Utc::now()).unwrap_err();
        assert!(matches!(err, RecordError::UnknownField { .. }));
    }

    #[test]
    fn rejects_badly_typed_values() {
        let err = apply_patch(&room(), &patch(json!({ "capacity": "lots" })), Utc::now()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidJson(_)));
    }

    #[test]
    fn rejects_lifecycle_fields() {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            boarder_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            status: BookingStatus::Pending,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let err = apply_patch(&booking, &patch(json!({ "status": "active" })), now).unwrap_err();
        assert!(matches!(err, RecordError::ManagedFieldNotAllowed(f) if f == "status"));
    }
}
