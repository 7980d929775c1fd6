use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{validate_jwt, Session, SessionState};
use crate::config::SecurityConfig;
use crate::error::ApiError;

/// Attaches a `SessionState` to every request. Never rejects; procedures and
/// `require_auth` decide what an anonymous or invalid session may do.
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session = resolve_session(request.headers(), &state.config.security);
    if let SessionState::Invalid(reason) = &session {
        tracing::debug!("Rejected bearer token: {}", reason);
    }
    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Gate for routes that need a signed-in caller
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<SessionState>() {
        Some(SessionState::Present(_)) => Ok(next.run(request).await),
        Some(SessionState::Invalid(reason)) => Err(ApiError::unauthorized(reason.clone())),
        _ => Err(ApiError::unauthorized("Missing Authorization header")),
    }
}

pub fn resolve_session(headers: &HeaderMap, security: &SecurityConfig) -> SessionState {
    match extract_jwt_from_headers(headers) {
        Ok(None) => SessionState::Anonymous,
        Ok(Some(token)) => match validate_jwt(&token, security) {
            Ok(claims) => SessionState::Present(Session::from(claims)),
            Err(e) => SessionState::Invalid(e.to_string()),
        },
        Err(reason) => SessionState::Invalid(reason),
    }
}

/// Extract JWT token from Authorization header. `Ok(None)` when absent.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
