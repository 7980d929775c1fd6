use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Boarder,
    Landlord,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Boarder => "boarder",
            UserRole::Landlord => "landlord",
            UserRole::Admin => "admin",
        }
    }

    /// Landlords and admins run the back office.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Landlord | UserRole::Admin)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boarder" => Ok(UserRole::Boarder),
            "landlord" => Ok(UserRole::Landlord),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const LABEL: &'static str = "User";
    const COLUMNS: &'static [&'static str] =
        &["id", "tenant_id", "email", "name", "role", "created_at", "updated_at"];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["tenant_id", "email"]];

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
pub struct NewUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub role: UserRole,
}

impl NewUser {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id,
            email: self.email.trim().to_lowercase(),
            name: self.name.trim().to_string(),
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}
