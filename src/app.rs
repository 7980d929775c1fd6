//! Application state and router builder.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers;
use crate::middleware::{require_auth, session_middleware, TENANT_HEADER};
use crate::procedures::{self, ProcedureRouter};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
    pub procedures: Arc<ProcedureRouter>,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            procedures: Arc::new(procedures::build()),
        }
    }
}

/// ```text
/// /
/// ├── GET  /                          service info
/// ├── GET  /health                    liveness
/// ├── ANY  /api/health                readiness (store ping)
/// ├── POST /api/boarders              paged boarder listing
/// ├── GET  /api/session               requires Authorization
/// ├── GET  /orpc                      procedure table
/// ├── ANY  /orpc/:resource/:action
/// └── ANY  /orpc/:resource.:action
/// ```
pub fn build_router(state: AppState) -> Router {
    // Request logs drop to debug when request logging is switched off
    let level = if state.config.api.enable_request_logging {
        Level::INFO
    } else {
        Level::DEBUG
    };

    let protected = Router::new()
        .route("/api/session", get(handlers::protected::current_session))
        .route_layer(from_fn(require_auth));

    let orpc = Router::new()
        .route("/orpc", get(handlers::orpc::list_procedures))
        .route("/orpc/:procedure", any(handlers::orpc::call_dotted_procedure))
        .route("/orpc/:resource/:action", any(handlers::orpc::call_procedure));

    Router::new()
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .route("/api/health", any(handlers::public::api_health))
        .route("/api/boarders", post(handlers::public::list_boarders))
        .merge(protected)
        .merge(orpc)
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(level))
                .on_response(DefaultOnResponse::new().level(level)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(TENANT_HEADER),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
