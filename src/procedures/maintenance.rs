use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::boarders::self_scope;
use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, Context, ProcedureRouter};
use crate::database::models::{
    wire_name, Boarder, MaintenancePriority, MaintenanceRequest, MaintenanceStatus, NewMaintenanceRequest, Room,
};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::services::plan_maintenance_transition;

#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<MaintenanceStatus>,
    pub priority: Option<MaintenancePriority>,
    pub room_id: Option<Uuid>,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("maintenance", "getAll", Access::Authenticated, |ctx, input: MaintenanceFilter| async move {
        let query = ListQuery::scoped(Some(ctx.tenant()?))
            .filter_opt("status", input.status.as_ref().map(wire_name))
            .filter_opt("priority", input.priority.as_ref().map(wire_name))
            .filter_opt("room_id", input.room_id)
            .filter_opt("boarder_id", self_scope(&ctx).await?);
        crud::list::<MaintenanceRequest>(&ctx, query, &input.paging).await
    });

    router.register("maintenance", "getById", Access::Authenticated, |ctx, input: IdInput| async move {
        let request: MaintenanceRequest = crud::get_in_tenant(&ctx, input.id).await?;
        match self_scope(&ctx).await? {
            Some(own) if request.boarder_id != Some(own) => {
                Err(ApiError::not_found(format!("Maintenance request {} not found", input.id)))
            }
            _ => Ok(request),
        }
    });

    router.register("maintenance", "create", Access::Authenticated, |ctx, input: NewMaintenanceRequest| async move {
        create_request(&ctx, input).await
    });

    router.register("maintenance", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        crud::update::<MaintenanceRequest>(&ctx, input).await
    });

    router.register("maintenance", "delete", Access::Staff, |ctx, input: IdInput| async move {
        crud::delete::<MaintenanceRequest>(&ctx, input.id).await
    });

    router.register("maintenance", "start", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, MaintenanceStatus::InProgress).await
    });

    router.register("maintenance", "complete", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, MaintenanceStatus::Completed).await
    });

    router.register("maintenance", "cancel", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, MaintenanceStatus::Cancelled).await
    });
}

/// Boarders file requests as themselves; staff may name any boarder or none.
async fn create_request(ctx: &Context, mut input: NewMaintenanceRequest) -> Result<MaintenanceRequest, ApiError> {
    input.validate()?;
    crud::get_in_tenant::<Room>(ctx, input.room_id).await?;

    match self_scope(ctx).await? {
        Some(own) => input.boarder_id = Some(own),
        None => {
            if let Some(boarder_id) = input.boarder_id {
                crud::get_in_tenant::<Boarder>(ctx, boarder_id).await?;
            }
        }
    }

    let request = crud::create(ctx, input.into_entity(ctx.tenant()?, Utc::now())).await?;
    tracing::info!(
        "Maintenance request {} filed for room {} ({:?})",
        request.id,
        request.room_id,
        request.priority
    );
    Ok(request)
}

async fn transition(ctx: &Context, id: Uuid, target: MaintenanceStatus) -> Result<MaintenanceRequest, ApiError> {
    let current: MaintenanceRequest = crud::get_in_tenant(ctx, id).await?;
    let next = plan_maintenance_transition(&current, target, Utc::now())?;
    let saved = crud::save(ctx, &current, next).await?;
    tracing::info!("Maintenance request {} moved from {} to {}", id, current.status, saved.status);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::super::build;
    use super::super::testing::{context, context_for};
    use super::*;
    use crate::database::models::{NewBoarder, RoomStatus, UserRole};
    use crate::database::Store;
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    async fn room(store: &Store, tenant: Uuid) -> Room {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            property_id: Uuid::new_v4(),
            room_number: "5".to_string(),
            floor: 2,
            capacity: 1,
            monthly_rate: Decimal::new(2800, 0),
            amenities: vec![],
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        store.insert(&room).await.unwrap()
    }

    #[tokio::test]
    async fn boarder_request_is_attributed_and_completed_by_staff() {
        let store = Store::memory();
        let tenant = Uuid::new_v4();
        let room = room(&store, tenant).await;
        let user_id = Uuid::new_v4();
        let boarder = NewBoarder {
            user_id: Some(user_id),
            name: "Carlo".to_string(),
            email: "carlo@example.com".to_string(),
            phone: None,
            emergency_contact: None,
        }
        .into_entity(tenant, Utc::now());
        store.insert(&boarder).await.unwrap();

        let router = build();
        let boarder_ctx = context_for(&store, Some(UserRole::Boarder), tenant, user_id);
        let request = router
            .call(
                "maintenance",
                "create",
                boarder_ctx.clone(),
                json!({ "room_id": room.id, "title": "Leaky faucet", "description": "Drips all night" }),
            )
            .await
            .unwrap();
        assert_eq!(request["boarder_id"], json!(boarder.id));
        assert_eq!(request["priority"], "MEDIUM");

        let err = router
            .call("maintenance", "start", boarder_ctx, json!({ "id": request["id"] }))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let staff = context(&store, Some(UserRole::Landlord), tenant);
        router
            .call("maintenance", "start", staff.clone(), json!({ "id": request["id"] }))
            .await
            .unwrap();
        let done = router
            .call("maintenance", "complete", staff.clone(), json!({ "id": request["id"] }))
            .await
            .unwrap();
        assert_eq!(done["status"], "COMPLETED");
        assert!(done["completed_at"].is_string());

        let err = router
            .call("maintenance", "cancel", staff, json!({ "id": request["id"] }))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
