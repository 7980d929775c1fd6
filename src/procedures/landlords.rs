use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, ProcedureRouter};
use crate::database::models::{Landlord, NewLandlord, Property};
use crate::database::ListQuery;

#[derive(Debug, Default, Deserialize)]
pub struct LandlordFilter {
    #[serde(flatten)]
    pub paging: Paging,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("landlords", "getAll", Access::Authenticated, |ctx, input: LandlordFilter| async move {
        let query = ListQuery::scoped(Some(ctx.tenant()?));
        crud::list::<Landlord>(&ctx, query, &input.paging).await
    });

    router.register("landlords", "getById", Access::Authenticated, |ctx, input: IdInput| async move {
        crud::get_in_tenant::<Landlord>(&ctx, input.id).await
    });

    router.register("landlords", "create", Access::Admin, |ctx, input: NewLandlord| async move {
        input.validate()?;
        crud::create(&ctx, input.into_entity(ctx.tenant()?, Utc::now())).await
    });

    router.register("landlords", "update", Access::Admin, |ctx, input: UpdateInput| async move {
        crud::update::<Landlord>(&ctx, input).await
    });

    router.register("landlords", "delete", Access::Admin, |ctx, input: IdInput| async move {
        crud::ensure_unreferenced::<Property>(&ctx, "landlord_id", input.id, "Landlord").await?;
        crud::delete::<Landlord>(&ctx, input.id).await
    });
}
