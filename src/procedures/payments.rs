use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::boarders::self_scope;
use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, Context, ProcedureRouter};
use crate::database::models::{wire_name, Boarder, NewPayment, Payment, PaymentStatus, PaymentType};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::services::plan_payment_transition;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
    pub boarder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidInput {
    pub id: Uuid,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SweepInput {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SweepResult {
    pub updated: u64,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("payments", "getAll", Access::Authenticated, |ctx, input: PaymentFilter| async move {
        let boarder_id = self_scope(&ctx).await?.or(input.boarder_id);
        let query = ListQuery::scoped(Some(ctx.tenant()?))
            .filter_opt("status", input.status.as_ref().map(wire_name))
            .filter_opt("payment_type", input.payment_type.as_ref().map(wire_name))
            .filter_opt("boarder_id", boarder_id);
        crud::list::<Payment>(&ctx, query, &input.paging).await
    });

    router.register("payments", "getById", Access::Authenticated, |ctx, input: IdInput| async move {
        let payment: Payment = crud::get_in_tenant(&ctx, input.id).await?;
        match self_scope(&ctx).await? {
            Some(own) if own != payment.boarder_id => {
                Err(ApiError::not_found(format!("Payment {} not found", input.id)))
            }
            _ => Ok(payment),
        }
    });

    router.register("payments", "create", Access::Staff, |ctx, input: NewPayment| async move {
        input.validate()?;
        crud::get_in_tenant::<Boarder>(&ctx, input.boarder_id).await?;
        crud::create(&ctx, input.into_entity(ctx.tenant()?, Utc::now())).await
    });

    router.register("payments", "update", Access::Staff, |ctx, input: UpdateInput| async move {
        crud::update::<Payment>(&ctx, input).await
    });

    router.register("payments", "delete", Access::Staff, |ctx, input: IdInput| async move {
        crud::delete::<Payment>(&ctx, input.id).await
    });

    router.register("payments", "markPaid", Access::Staff, |ctx, input: MarkPaidInput| async move {
        transition(&ctx, input.id, PaymentStatus::Paid, input.paid_date).await
    });

    router.register("payments", "cancel", Access::Staff, |ctx, input: IdInput| async move {
        transition(&ctx, input.id, PaymentStatus::Cancelled, None).await
    });

    router.register("payments", "markOverdue", Access::Staff, |ctx, input: SweepInput| async move {
        let as_of = input.as_of.unwrap_or_else(|| ctx.today());
        let updated = ctx.store.mark_overdue(Some(ctx.tenant()?), as_of).await?;
        tracing::info!("Marked {} payment(s) overdue as of {}", updated, as_of);
        Ok(SweepResult { updated })
    });
}

async fn transition(
    ctx: &Context,
    id: Uuid,
    target: PaymentStatus,
    paid_date: Option<NaiveDate>,
) -> Result<Payment, ApiError> {
    let current: Payment = crud::get_in_tenant(ctx, id).await?;
    let next = plan_payment_transition(&current, target, paid_date, ctx.today(), Utc::now())?;
    let saved = crud::save(ctx, &current, next).await?;
    tracing::info!("Payment {} moved from {} to {}", id, current.status, saved.status);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::super::testing::context;
    use super::super::build;
    use super::*;
    use crate::database::models::{NewBoarder, UserRole};
    use crate::database::Store;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn seeded() -> (Context, Boarder) {
        let store = Store::memory();
        let ctx = context(&store, Some(UserRole::Landlord), Uuid::new_v4());
        let boarder = NewBoarder {
            user_id: None,
            name: "Lea".to_string(),
            email: "lea@example.com".to_string(),
            phone: None,
            emergency_contact: None,
        }
        .into_entity(ctx.tenant().unwrap(), Utc::now());
        let boarder = store.insert(&boarder).await.unwrap();
        (ctx, boarder)
    }

    #[tokio::test]
    async fn mark_paid_stamps_date_and_freezes() {
        let (ctx, boarder) = seeded().await;
        let router = build();
        let payment = router
            .call(
                "payments",
                "create",
                ctx.clone(),
                json!({ "boarder_id": boarder.id, "amount": "4500", "payment_type": "RENT", "due_date": "2026-02-05" }),
            )
            .await
            .unwrap();
        assert_eq!(payment["status"], "PENDING");

        let paid = router
            .call(
                "payments",
                "markPaid",
                ctx.clone(),
                json!({ "id": payment["id"], "paid_date": "2026-02-03" }),
            )
            .await
            .unwrap();
        assert_eq!(paid["status"], "PAID");
        assert_eq!(paid["paid_date"], "2026-02-03");

        let err = router
            .call("payments", "cancel", ctx, json!({ "id": payment["id"] }))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn zero_amount_is_unprocessable() {
        let (ctx, boarder) = seeded().await;
        let err = build()
            .call(
                "payments",
                "create",
                ctx,
                json!({ "boarder_id": boarder.id, "amount": "0", "payment_type": "RENT", "due_date": "2026-02-05" }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn sweep_reports_updated_count() {
        let (ctx, boarder) = seeded().await;
        let router = build();
        for due in ["2026-01-05", "2026-03-05"] {
            router
                .call(
                    "payments",
                    "create",
                    ctx.clone(),
                    json!({ "boarder_id": boarder.id, "amount": 4500, "payment_type": "RENT", "due_date": due }),
                )
                .await
                .unwrap();
        }
        let out = router
            .call("payments", "markOverdue", ctx, json!({ "as_of": "2026-02-01" }))
            .await
            .unwrap();
        assert_eq!(out, json!({ "updated": 1 }));
    }
}
