use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::Boarder;
use crate::database::ListQuery;
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::procedures::Access;

#[derive(Debug, Default, Deserialize)]
pub struct BoarderListRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct BoarderList {
    pub boarders: Vec<Boarder>,
    pub pagination: Pagination,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// Row offset of `page` (1-based), or 400 when it does not fit.
fn page_offset(page: i64, limit: i64) -> Result<i64, ApiError> {
    (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| ApiError::bad_request(format!("Page {} is out of range", page)))
}

/// POST /api/boarders - paged boarder listing
///
/// Staff only, scoped to the session tenant. An empty body lists the first
/// page.
pub async fn list_boarders(
    State(state): State<AppState>,
    RequestContext(ctx): RequestContext,
    body: Bytes,
) -> Result<Json<BoarderList>, ApiError> {
    let request: BoarderListRequest = if body.iter().all(u8::is_ascii_whitespace) {
        BoarderListRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    Access::Staff.check(&ctx)?;
    let tenant_id = ctx.tenant()?;

    let page = request.page.unwrap_or(1).max(1);
    let limit = state.config.page_size(request.limit);
    let offset = page_offset(page, limit)?;
    let query = ListQuery::scoped(Some(tenant_id)).filter_opt("is_active", request.active);

    let total = state.store.count::<Boarder>(&query).await?;
    let boarders = state.store.list::<Boarder>(&query.page(limit, offset)).await?;

    Ok(Json(BoarderList {
        boarders,
        pagination: Pagination::new(page, limit, total),
    }))
}
