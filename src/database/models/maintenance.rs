use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn can_transition_to(self, next: MaintenanceStatus) -> bool {
        use MaintenanceStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Completed)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_open(self) -> bool {
        matches!(self, MaintenanceStatus::Pending | MaintenanceStatus::InProgress)
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&super::wire_name(self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceRequest {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub room_id: Uuid,
    pub boarder_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for MaintenanceRequest {
    const TABLE: &'static str = "maintenance_requests";
    const LABEL: &'static str = "Maintenance request";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "room_id",
        "boarder_id",
        "title",
        "description",
        "priority",
        "status",
        "completed_at",
        "created_at",
        "updated_at",
    ];
    const MANAGED: &'static [&'static str] = &["status", "completed_at"];

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
pub struct NewMaintenanceRequest {
    pub room_id: Uuid,
    pub boarder_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,
    pub priority: Option<MaintenancePriority>,
}

impl NewMaintenanceRequest {
    pub fn into_entity(self, tenant_id: Uuid, now: DateTime<Utc>) -> MaintenanceRequest {
        MaintenanceRequest {
            id: Uuid::new_v4(),
            tenant_id,
            room_id: self.room_id,
            boarder_id: self.boarder_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            priority: self.priority.unwrap_or(MaintenancePriority::Medium),
            status: MaintenanceStatus::Pending,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
