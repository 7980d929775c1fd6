pub mod auth;
pub mod context;

pub use auth::{require_auth, resolve_session, session_middleware};
pub use context::{RequestContext, TENANT_HEADER};
