use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::SessionState;
use crate::error::ApiError;
use crate::procedures::Context;

/// Header naming the tenant for anonymous requests
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Per-request procedure context built from the app state and the session
/// attached by `session_middleware`.
pub struct RequestContext(pub Context);

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<SessionState>()
            .cloned()
            .unwrap_or(SessionState::Anonymous);

        let tenant_id = match session.session() {
            Some(session) => Some(session.tenant_id),
            None => tenant_from_header(parts)?,
        };

        Ok(RequestContext(Context {
            store: state.store.clone(),
            session,
            tenant_id,
            config: state.config.clone(),
        }))
    }
}

fn tenant_from_header(parts: &Parts) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = parts.headers.get(TENANT_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .map(Some)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid {} header", TENANT_HEADER)))
}
