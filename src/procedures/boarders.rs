use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, Context, ProcedureRouter};
use crate::database::models::{Boarder, Booking, NewBoarder, Payment};
use crate::database::ListQuery;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct BoarderFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub active: Option<bool>,
    pub room_id: Option<Uuid>,
}

impl BoarderFilter {
    pub fn query(&self, tenant_id: Option<Uuid>) -> ListQuery {
        ListQuery::scoped(tenant_id)
            .filter_opt("is_active", self.active)
            .filter_opt("room_id", self.room_id)
    }
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("boarders", "getAll", Access::Staff, |ctx, input: BoarderFilter| async move {
        let query = input.query(Some(ctx.tenant()?));
        crud::list::<Boarder>(&ctx, query, &input.paging).await
    });

    router.register("boarders", "getById", Access::Staff, |ctx, input: IdInput| async move {
        crud::get_in_tenant::<Boarder>(&ctx, input.id).await
    });

    router.register("boarders", "create", Access::Staff, |ctx, input: NewBoarder| async move {
        input.validate()?;
        crud::create(&ctx, input.into_entity(ctx.tenant()?, Utc::now())).await
    });

    router.register("boarders", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        crud::update::<Boarder>(&ctx, input).await
    });

    router.register("boarders", "delete", Access::Staff, |ctx, input: IdInput| async move {
        let boarder: Boarder = crud::get_in_tenant(&ctx, input.id).await?;
        if boarder.room_id.is_some() {
            return Err(ApiError::conflict(format!(
                "Boarder {} still occupies a room; complete the booking first",
                boarder.id
            )));
        }
        crud::ensure_unreferenced::<Booking>(&ctx, "boarder_id", input.id, "Boarder").await?;
        crud::ensure_unreferenced::<Payment>(&ctx, "boarder_id", input.id, "Boarder").await?;
        crud::delete::<Boarder>(&ctx, input.id).await
    });
}

/// The boarder profile behind a boarder session, if any
pub async fn own_profile(ctx: &Context) -> Result<Option<Boarder>, ApiError> {
    let session = ctx.session()?;
    let query = ListQuery::scoped(Some(session.tenant_id)).filter("user_id", session.user_id);
    Ok(ctx.store.list::<Boarder>(&query).await?.into_iter().next())
}

/// Boarder sessions act only as themselves. Returns the boarder id to scope
/// to, or `None` for staff.
pub async fn self_scope(ctx: &Context) -> Result<Option<Uuid>, ApiError> {
    if !ctx.is_boarder() {
        return Ok(None);
    }
    match own_profile(ctx).await? {
        Some(boarder) => Ok(Some(boarder.id)),
        None => Err(ApiError::forbidden("No boarder profile is linked to this account")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_filter_matches_column_text() {
        let filter = BoarderFilter {
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(filter.query(None).filters, vec![("is_active", "true".to_string())]);
    }
}
