use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "Boarding API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "endpoints": {
            "health": "/health, /api/health",
            "boarders": "POST /api/boarders",
            "session": "GET /api/session (requires Authorization)",
            "procedures": "GET /orpc, ANY /orpc/{resource}/{action}",
        }
    }))
}

/// GET /health - liveness, never touches the store
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// ANY /api/health - readiness including the store
pub async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let environment = state.config.environment.as_str();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": state.store.backend(),
                "environment": environment,
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                    "environment": environment,
                })),
            )
        }
    }
}
