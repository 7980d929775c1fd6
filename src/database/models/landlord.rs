use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{non_empty, Entity};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Landlord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Landlord {
    const TABLE: &'static str = "landlords";
    const LABEL: &'static str = "Landlord";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "user_id",
        "name",
        "email",
        "phone",
        "created_at",
        "updated_at",
    ];

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
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewLandlord {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
}

impl NewLandlord {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> Landlord {
        Landlord {
            id: Uuid::new_v4(),
            tenant_id,
            user_id: self.user_id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: non_empty(self.phone),
            created_at: now,
            updated_at: now,
        }
    }
}
