use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, ProcedureRouter};
use crate::database::models::utility::UtilityReadingView;
use crate::database::models::{wire_name, NewUtilityReading, Room, UtilityReading, UtilityType};
use crate::database::ListQuery;

#[derive(Debug, Default, Deserialize)]
pub struct UtilityFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub room_id: Option<Uuid>,
    pub utility_type: Option<UtilityType>,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("utilities", "getAll", Access::Staff, |ctx, input: UtilityFilter| async move {
        let query = ListQuery::scoped(Some(ctx.tenant()?))
            .filter_opt("room_id", input.room_id)
            .filter_opt("utility_type", input.utility_type.as_ref().map(wire_name));
        let readings = crud::list::<UtilityReading>(&ctx, query, &input.paging).await?;
        Ok(readings.into_iter().map(UtilityReadingView::from).collect::<Vec<_>>())
    });

    router.register("utilities", "getById", Access::Staff, |ctx, input: IdInput| async move {
        crud::get_in_tenant::<UtilityReading>(&ctx, input.id)
            .await
            .map(UtilityReadingView::from)
    });

    router.register("utilities", "create", Access::Staff, |ctx, input: NewUtilityReading| async move {
        input.validate()?;
        crud::get_in_tenant::<Room>(&ctx, input.room_id).await?;
        crud::create(&ctx, input.into_entity(ctx.tenant()?, Utc::now()))
            .await
            .map(UtilityReadingView::from)
    });

    router.register("utilities", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        crud::update::<UtilityReading>(&ctx, input)
            .await
            .map(UtilityReadingView::from)
    });

    router.register("utilities", "delete", Access::Staff, |ctx, input: IdInput| async move {
        crud::delete::<UtilityReading>(&ctx, input.id).await
    });
}

#[cfg(test)]
mod tests {
    use super::super::build;
    use super::super::testing::context;
    use crate::database::models::{Room, RoomStatus, UserRole, UtilityReading};
    use crate::database::{ListQuery, Store};
    use axum::http::StatusCode;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;

    async fn seed_room(store: &Store, tenant: Uuid) -> Room {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            property_id: Uuid::new_v4(),
            room_number: "8".to_string(),
            floor: 1,
            capacity: 2,
            monthly_rate: Decimal::new(3000, 0),
            amenities: vec![],
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        store.insert(&room).await.unwrap()
    }

    #[tokio::test]
    async fn readings_carry_derived_amounts() {
        let store = Store::memory();
        let tenant = Uuid::new_v4();
        let room = seed_room(&store, tenant).await;

        let router = build();
        let ctx = context(&store, Some(UserRole::Landlord), tenant);
        let reading = router
            .call(
                "utilities",
                "create",
                ctx.clone(),
                json!({
                    "room_id": room.id,
                    "utility_type": "WATER",
                    "previous_reading": "100",
                    "current_reading": "112",
                    "rate": "25.50",
                    "reading_date": "2026-03-31",
                }),
            )
            .await
            .unwrap();
        assert_eq!(reading["consumption"], "12");
        assert_eq!(reading["amount"], "306.00");

        let listed = router
            .call("utilities", "getAll", ctx.clone(), json!({ "room_id": room.id }))
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let boarder = context(&store, Some(UserRole::Boarder), tenant);
        let err = router.call("utilities", "getAll", boarder, json!({})).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn oversized_readings_are_unprocessable() {
        let store = Store::memory();
        let tenant = Uuid::new_v4();
        let room = seed_room(&store, tenant).await;
        let ctx = context(&store, Some(UserRole::Landlord), tenant);

        let err = build()
            .call(
                "utilities",
                "create",
                ctx,
                json!({
                    "room_id": room.id,
                    "utility_type": "ELECTRICITY",
                    "previous_reading": "0",
                    "current_reading": "70000000000000000000000000000",
                    "rate": "10",
                    "reading_date": "2026-03-31",
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(store.list::<UtilityReading>(&ListQuery::scoped(Some(tenant))).await.unwrap().is_empty());
    }
}
