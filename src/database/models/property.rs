use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{non_empty, Entity};
use crate::error::FieldErrors;

/// A boarding house owned by a landlord. Room counts are maintained by the
/// store whenever a room of the property changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub description: Option<String>,
    pub total_rooms: i32,
    pub available_rooms: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Property {
    const TABLE: &'static str = "properties";
    const LABEL: &'static str = "Property";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "landlord_id",
        "name",
        "address",
        "city",
        "description",
        "total_rooms",
        "available_rooms",
        "created_at",
        "updated_at",
    ];
    const MANAGED: &'static [&'static str] = &["total_rooms", "available_rooms"];

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
        if self.name.trim().is_empty() {
            errors.insert("name".to_string(), "Name is required".to_string());
        }
        if self.available_rooms > self.total_rooms {
            errors.insert(
                "available_rooms".to_string(),
                "Cannot exceed total rooms".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProperty {
    pub landlord_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
}

impl NewProperty {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> Property {
        Property {
            id: Uuid::new_v4(),
            tenant_id,
            landlord_id: self.landlord_id,
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            description: non_empty(self.description),
            total_rooms: 0,
            available_rooms: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
