use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::boarders::self_scope;
use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, Context, ProcedureRouter};
use crate::database::models::{wire_name, Boarder, Booking, BookingStatus, NewBooking, Room};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::services::LifecycleError;

#[derive(Debug, Default, Deserialize)]
pub struct BookingFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<BookingStatus>,
    pub room_id: Option<Uuid>,
    pub boarder_id: Option<Uuid>,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("bookings", "getAll", Access::Authenticated, |ctx, input: BookingFilter| async move {
        let boarder_id = self_scope(&ctx).await?.or(input.boarder_id);
        let query = ListQuery::scoped(Some(ctx.tenant()?))
            .filter_opt("status", input.status.as_ref().map(wire_name))
            .filter_opt("room_id", input.room_id)
            .filter_opt("boarder_id", boarder_id);
        crud::list::<Booking>(&ctx, query, &input.paging).await
    });

    router.register("bookings", "getById", Access::Authenticated, |ctx, input: IdInput| async move {
        visible_booking(&ctx, input.id).await
    });

    router.register("bookings", "create", Access::Authenticated, |ctx, input: NewBooking| async move {
        create_booking(&ctx, input).await
    });

    router.register("bookings", "cancel", Access::Authenticated, |ctx, input: IdInput| async move {
        visible_booking(&ctx, input.id).await?;
        transition(&ctx, input.id, BookingStatus::Cancelled).await
    });

    router.register("bookings", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        let current: Booking = crud::get_in_tenant(&ctx, input.id).await?;
        let moves_dates = input.data.contains_key("start_date") || input.data.contains_key("end_date");
        if moves_dates && current.status != BookingStatus::Pending {
            return Err(ApiError::conflict(format!(
                "Dates of a {} booking cannot change",
                current.status
            )));
        }
        crud::patch_row(&ctx, &current, &input.data).await
    });

    router.register("bookings", "delete", Access::Staff, |ctx, input: IdInput| async move {
        let current: Booking = crud::get_in_tenant(&ctx, input.id).await?;
        if current.status.holds_room() {
            return Err(ApiError::conflict(format!(
                "Cannot delete a {} booking; cancel or complete it first",
                current.status
            )));
        }
        crud::delete::<Booking>(&ctx, input.id).await
    });

    router.register("bookings", "confirm", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, BookingStatus::Confirmed).await
    });

    router.register("bookings", "activate", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, BookingStatus::Active).await
    });

    router.register("bookings", "complete", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, BookingStatus::Completed).await
    });
}

/// A booking the caller may see; boarders only see their own.
async fn visible_booking(ctx: &Context, id: Uuid) -> Result<Booking, ApiError> {
    let booking: Booking = crud::get_in_tenant(ctx, id).await?;
    match self_scope(ctx).await? {
        Some(own) if own != booking.boarder_id => Err(ApiError::not_found(format!("Booking {} not found", id))),
        _ => Ok(booking),
    }
}

async fn create_booking(ctx: &Context, input: NewBooking) -> Result<Booking, ApiError> {
    input.validate()?;
    let tenant_id = ctx.tenant()?;

    let boarder_id = match (self_scope(ctx).await?, input.boarder_id) {
        (Some(own), Some(requested)) if own != requested => {
            return Err(ApiError::forbidden("Boarders can only book for themselves"))
        }
        (Some(own), _) => own,
        (None, Some(requested)) => requested,
        (None, None) => return Err(ApiError::bad_request("boarder_id is required")),
    };

    let boarder: Boarder = crud::get_in_tenant(ctx, boarder_id).await?;
    let room: Room = crud::get_in_tenant(ctx, input.room_id).await?;
    if !room.is_bookable() {
        return Err(LifecycleError::RoomUnavailable(room.room_number).into());
    }

    let booking = input.into_entity(tenant_id, boarder.id, Utc::now());
    let booking = crud::create(ctx, booking).await?;
    tracing::info!("Booking {} requested by boarder {} for room {}", booking.id, boarder.id, room.id);
    Ok(booking)
}

async fn transition(ctx: &Context, id: Uuid, target: BookingStatus) -> Result<Booking, ApiError> {
    let tenant_id = ctx.tenant()?;
    let booking = ctx
        .store
        .transition_booking(tenant_id, id, target, ctx.today())
        .await?;
    tracing::info!("Booking {} moved to {}", booking.id, booking.status);
    Ok(booking)
}
