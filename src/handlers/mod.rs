// handlers/mod.rs - HTTP handlers by security tier
//
// Public (no session required) and protected (behind `require_auth`).
// The `/orpc` dispatcher is public at the HTTP level; each procedure
// enforces its own access level.

pub mod orpc;
pub mod protected;
pub mod public;

use axum::http::{Method, Uri};

use crate::error::ApiError;

/// JSON 404 for unmatched routes
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {} {}", method, uri.path()))
}
