//! `/orpc` procedure endpoints.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::procedures::{Context, ProcedureInfo};

#[derive(Debug, Default, Deserialize)]
pub struct InputQuery {
    /// JSON-encoded procedure input for GET calls
    pub input: Option<String>,
}

/// GET /orpc - registered procedures with their access levels
pub async fn list_procedures(State(state): State<AppState>) -> Json<Vec<ProcedureInfo>> {
    Json(state.procedures.list())
}

/// ANY /orpc/:resource/:action
pub async fn call_procedure(
    State(state): State<AppState>,
    Path((resource, action)): Path<(String, String)>,
    RequestContext(ctx): RequestContext,
    method: Method,
    Query(query): Query<InputQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    dispatch(&state, &resource, &action, ctx, &method, query, &body).await
}

/// ANY /orpc/:procedure where procedure is `resource.action`
pub async fn call_dotted_procedure(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    RequestContext(ctx): RequestContext,
    method: Method,
    Query(query): Query<InputQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let (resource, action) = procedure.split_once('.').unwrap_or((procedure.as_str(), ""));
    dispatch(&state, resource, action, ctx, &method, query, &body).await
}

async fn dispatch(
    state: &AppState,
    resource: &str,
    action: &str,
    ctx: Context,
    method: &Method,
    query: InputQuery,
    body: &[u8],
) -> Result<Json<Value>, ApiError> {
    let environment = state.config.environment;
    let result = async {
        let input = read_input(method, query, body)?;
        state.procedures.call(resource, action, ctx, input).await
    }
    .await;

    match result {
        Ok(output) => Ok(Json(output)),
        Err(err) => {
            if err.status_code().is_server_error() {
                tracing::error!("Procedure {}.{} failed: {}", resource, action, err);
            } else {
                tracing::debug!("Procedure {}.{} rejected: {}", resource, action, err);
            }
            Err(err.redact(environment))
        }
    }
}

/// GET reads `?input=`, everything else reads the body. Absent input is null.
fn read_input(method: &Method, query: InputQuery, body: &[u8]) -> Result<Value, ApiError> {
    let raw = if method == Method::GET {
        query.input.map(String::into_bytes).unwrap_or_default()
    } else {
        body.to_vec()
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&raw)?)
}
