use axum::{Extension, Json};

use crate::auth::{Session, SessionState};
use crate::error::ApiError;

/// GET /api/session - the caller's decoded session
pub async fn current_session(Extension(state): Extension<SessionState>) -> Result<Json<Session>, ApiError> {
    match state {
        SessionState::Present(session) => Ok(Json(session)),
        // require_auth already turned these away
        _ => Err(ApiError::unauthorized("Authentication required")),
    }
}
