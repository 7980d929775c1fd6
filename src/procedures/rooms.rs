use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, Context, ProcedureRouter};
use crate::database::models::room::normalize_amenities;
use crate::database::models::{
    wire_name, Boarder, Booking, MaintenanceRequest, NewRoom, Property, Room, RoomStatus, UtilityReading,
};
use crate::database::{apply_patch, ListQuery};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct RoomFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<RoomStatus>,
    pub property_id: Option<Uuid>,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("rooms", "getAll", Access::Public, |ctx, input: RoomFilter| async move {
        let query = ListQuery::scoped(ctx.tenant_id)
            .filter_opt("status", input.status.as_ref().map(wire_name))
            .filter_opt("property_id", input.property_id);
        crud::list::<Room>(&ctx, query, &input.paging).await
    });

    router.register("rooms", "getById", Access::Public, |ctx, input: IdInput| async move {
        crud::get::<Room>(&ctx, input.id).await
    });

    router.register("rooms", "create", Access::Staff, |ctx, input: NewRoom| async move {
        create_room(&ctx, input).await
    });

    router.register("rooms", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        update_room(&ctx, input).await
    });

    router.register("rooms", "delete", Access::Staff, |ctx, input: IdInput| async move {
        crud::ensure_unreferenced::<Boarder>(&ctx, "room_id", input.id, "Room").await?;
        crud::ensure_unreferenced::<Booking>(&ctx, "room_id", input.id, "Room").await?;
        crud::ensure_unreferenced::<MaintenanceRequest>(&ctx, "room_id", input.id, "Room").await?;
        crud::ensure_unreferenced::<UtilityReading>(&ctx, "room_id", input.id, "Room").await?;
        let room = crud::delete::<Room>(&ctx, input.id).await?;
        ctx.store.refresh_property(room.property_id).await?;
        Ok(room)
    });
}

async fn ensure_number_free(ctx: &Context, property_id: Uuid, room_number: &str, except: Option<Uuid>) -> Result<(), ApiError> {
    let query = ListQuery::scoped(Some(ctx.tenant()?))
        .filter("property_id", property_id)
        .filter("room_number", room_number);
    let clash = ctx
        .store
        .list::<Room>(&query)
        .await?
        .into_iter()
        .any(|r| Some(r.id) != except);
    if clash {
        return Err(ApiError::conflict(format!(
            "Room {} already exists in this property",
            room_number
        )));
    }
    Ok(())
}

async fn create_room(ctx: &Context, input: NewRoom) -> Result<Room, ApiError> {
    input.validate()?;
    let property: Property = crud::get_in_tenant(ctx, input.property_id).await?;
    ensure_number_free(ctx, property.id, input.room_number.trim(), None).await?;

    let room = crud::create(ctx, input.into_entity(ctx.tenant()?, Utc::now())).await?;
    ctx.store.refresh_property(property.id).await?;
    Ok(room)
}

/// Room edits may move the room between properties or change its status,
/// so both affected properties get their counts recomputed.
async fn update_room(ctx: &Context, mut input: UpdateInput) -> Result<Room, ApiError> {
    let current: Room = crud::get_in_tenant(ctx, input.id).await?;

    if let Some(Value::Array(amenities)) = input.data.get("amenities") {
        let amenities = amenities
            .iter()
            .filter_map(|a| a.as_str().map(str::to_string))
            .collect();
        input
            .data
            .insert("amenities".to_string(), serde_json::to_value(normalize_amenities(amenities))?);
    }

    let updated = apply_patch(&current, &input.data, Utc::now())?;
    if updated.property_id != current.property_id {
        crud::get_in_tenant::<Property>(ctx, updated.property_id).await?;
    }
    if updated.property_id != current.property_id || updated.room_number != current.room_number {
        ensure_number_free(ctx, updated.property_id, &updated.room_number, Some(updated.id)).await?;
    }
    let updated = crud::save(ctx, &current, updated).await?;

    ctx.store.refresh_property(updated.property_id).await?;
    if updated.property_id != current.property_id {
        ctx.store.refresh_property(current.property_id).await?;
    }
    Ok(updated)
}
