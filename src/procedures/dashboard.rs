use serde_json::Value;

use super::{Access, Context, ProcedureRouter};
use crate::database::models::{Boarder, Booking, MaintenanceRequest, Payment, Room};
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::services::DashboardSummary;

pub fn register(router: &mut ProcedureRouter) {
    router.register("dashboard", "summary", Access::Staff, |ctx, _input: Value| async move {
        summary(&ctx).await
    });
}

async fn summary(ctx: &Context) -> Result<DashboardSummary, ApiError> {
    let all = ListQuery::scoped(Some(ctx.tenant()?));
    let (rooms, boarders, bookings, payments, maintenance) = futures::try_join!(
        ctx.store.list::<Room>(&all),
        ctx.store.list::<Boarder>(&all),
        ctx.store.list::<Booking>(&all),
        ctx.store.list::<Payment>(&all),
        ctx.store.list::<MaintenanceRequest>(&all),
    )?;
    Ok(DashboardSummary::compute(&rooms, &boarders, &bookings, &payments, &maintenance))
}
