//! Shared building blocks for the resource procedures.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Context;
use crate::database::models::Entity;
use crate::database::{apply_patch, ListQuery};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct IdInput {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInput {
    pub id: Uuid,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Paging {
    pub fn apply(&self, query: ListQuery, ctx: &Context) -> ListQuery {
        query.page(ctx.config.page_size(self.limit), self.offset.unwrap_or(0))
    }
}

/// Row invariants as a 422 with per-field messages
pub fn check<T: Entity>(row: &T) -> Result<(), ApiError> {
    row.check().map_err(|fields| {
        ApiError::unprocessable_entity(format!("Invalid {}", T::LABEL.to_lowercase()), fields)
    })
}

pub async fn list<T: Entity>(ctx: &Context, query: ListQuery, paging: &Paging) -> Result<Vec<T>, ApiError> {
    Ok(ctx.store.list(&paging.apply(query, ctx)).await?)
}

/// Fetch by id within the caller's tenant, or across tenants for anonymous
/// callers without a tenant header.
pub async fn get<T: Entity>(ctx: &Context, id: Uuid) -> Result<T, ApiError> {
    Ok(ctx.store.get(ctx.tenant_id, id).await?)
}

/// Fetch by id, requiring a tenant
pub async fn get_in_tenant<T: Entity>(ctx: &Context, id: Uuid) -> Result<T, ApiError> {
    Ok(ctx.store.get(Some(ctx.tenant()?), id).await?)
}

pub async fn create<T: Entity>(ctx: &Context, row: T) -> Result<T, ApiError> {
    check(&row)?;
    let row = ctx.store.insert(&row).await?;
    tracing::debug!("Created {} {}", T::LABEL, row.id());
    Ok(row)
}

/// Merge-patch `data` into the stored row and write it back, failing with
/// 409 if someone else changed the row in between.
pub async fn update<T: Entity>(ctx: &Context, input: UpdateInput) -> Result<T, ApiError> {
    let current: T = get_in_tenant(ctx, input.id).await?;
    patch_row(ctx, &current, &input.data).await
}

pub async fn patch_row<T: Entity>(ctx: &Context, current: &T, data: &Map<String, Value>) -> Result<T, ApiError> {
    let updated = apply_patch(current, data, Utc::now())?;
    check(&updated)?;
    Ok(ctx.store.replace(&updated, current.updated_at()).await?)
}

/// Write a row produced by a lifecycle plan
pub async fn save<T: Entity>(ctx: &Context, current: &T, updated: T) -> Result<T, ApiError> {
    check(&updated)?;
    Ok(ctx.store.replace(&updated, current.updated_at()).await?)
}

pub async fn delete<T: Entity>(ctx: &Context, id: Uuid) -> Result<T, ApiError> {
    let row = ctx.store.delete(Some(ctx.tenant()?), id).await?;
    tracing::debug!("Deleted {} {}", T::LABEL, id);
    Ok(row)
}

/// 409 while rows of `R` still point at `id` through `column`
pub async fn ensure_unreferenced<R: Entity>(
    ctx: &Context,
    column: &'static str,
    id: Uuid,
    owner: &str,
) -> Result<(), ApiError> {
    let query = ListQuery::scoped(Some(ctx.tenant()?)).filter(column, id);
    let count = ctx.store.count::<R>(&query).await?;
    if count > 0 {
        return Err(ApiError::conflict(format!(
            "{} {} is still referenced by {} {} record(s)",
            owner,
            id,
            count,
            R::LABEL.to_lowercase()
        )));
    }
    Ok(())
}
