use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, ProcedureRouter};
use crate::database::models::{Landlord, NewProperty, Property, Room};
use crate::database::ListQuery;

#[derive(Debug, Default, Deserialize)]
pub struct PropertyFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub landlord_id: Option<Uuid>,
    pub city: Option<String>,
}

pub fn register(router: &mut ProcedureRouter) {
    // Listings are public; anonymous callers without a tenant header browse every tenant.
    router.register("properties", "getAll", Access::Public, |ctx, input: PropertyFilter| async move {
        let query = ListQuery::scoped(ctx.tenant_id)
            .filter_opt("landlord_id", input.landlord_id)
            .filter_opt("city", input.city);
        crud::list::<Property>(&ctx, query, &input.paging).await
    });

    router.register("properties", "getById", Access::Public, |ctx, input: IdInput| async move {
        crud::get::<Property>(&ctx, input.id).await
    });

    router.register("properties", "create", Access::Staff, |ctx, input: NewProperty| async move {
        input.validate()?;
        crud::get_in_tenant::<Landlord>(&ctx, input.landlord_id).await?;
        crud::create(&ctx, input.into_entity(ctx.tenant()?, Utc::now())).await
    });

    router.register("properties", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        if let Some(landlord_id) = input.data.get("landlord_id").and_then(|v| v.as_str()) {
            if let Ok(landlord_id) = Uuid::parse_str(landlord_id) {
                crud::get_in_tenant::<Landlord>(&ctx, landlord_id).await?;
            }
        }
        crud::update::<Property>(&ctx, input).await
    });

    router.register("properties", "delete", Access::Staff, |ctx, input: IdInput| async move {
        crud::ensure_unreferenced::<Room>(&ctx, "property_id", input.id, "Property").await?;
        crud::delete::<Property>(&ctx, input.id).await
    });
}
