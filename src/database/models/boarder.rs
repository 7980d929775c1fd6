use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{non_empty, Entity};
use crate::error::FieldErrors;

/// Tenant (renter) profile. A boarder lives in at most one room at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Boarder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub is_active: bool,
    pub move_in_date: Option<NaiveDate>,
    pub move_out_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Boarder {
    const TABLE: &'static str = "boarders";
    const LABEL: &'static str = "Boarder";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "user_id",
        "room_id",
        "name",
        "email",
        "phone",
        "emergency_contact",
        "is_active",
        "move_in_date",
        "move_out_date",
        "created_at",
        "updated_at",
    ];
    // Room assignment follows the booking lifecycle
    const MANAGED: &'static [&'static str] = &["room_id"];

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
        if let (Some(move_in), Some(move_out)) = (self.move_in_date, self.move_out_date) {
            if move_out < move_in {
                errors.insert(
                    "move_out_date".to_string(),
                    "Move-out date cannot be before move-in date".to_string(),
                );
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBoarder {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "Emergency contact must be at most 200 characters"))]
    pub emergency_contact: Option<String>,
}

impl NewBoarder {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> Boarder {
        Boarder {
            id: Uuid::new_v4(),
            tenant_id,
            user_id: self.user_id,
            room_id: None,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: non_empty(self.phone),
            emergency_contact: non_empty(self.emergency_contact),
            is_active: true,
            move_in_date: None,
            move_out_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}
