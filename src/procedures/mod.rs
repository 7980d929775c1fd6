//! RPC-style procedure table behind `/orpc/{resource}/{action}`.
//!
//! Every procedure takes a `Context` and a JSON input and returns JSON.
//! Registration records the access level, which is checked before the
//! handler runs.

use chrono::{NaiveDate, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Session, SessionState};
use crate::config::AppConfig;
use crate::database::models::UserRole;
use crate::database::Store;
use crate::error::ApiError;

pub mod auth;
pub mod boarders;
pub mod bookings;
pub mod crud;
pub mod dashboard;
pub mod landlords;
pub mod maintenance;
pub mod payments;
pub mod properties;
pub mod rooms;
pub mod users;
pub mod utilities;

/// Everything a procedure may use for one call
#[derive(Clone)]
pub struct Context {
    pub store: Store,
    pub session: SessionState,
    /// From the session, or the tenant header for anonymous callers
    pub tenant_id: Option<Uuid>,
    pub config: Arc<AppConfig>,
}

impl Context {
    pub fn session(&self) -> Result<&Session, ApiError> {
        match &self.session {
            SessionState::Present(session) => Ok(session),
            SessionState::Invalid(reason) => Err(ApiError::unauthorized(reason.clone())),
            SessionState::Anonymous => Err(ApiError::unauthorized("Authentication required")),
        }
    }

    /// Tenant that writes and scoped reads apply to
    pub fn tenant(&self) -> Result<Uuid, ApiError> {
        self.tenant_id
            .ok_or_else(|| ApiError::bad_request("Tenant is required (sign in or send x-tenant-id)"))
    }

    pub fn role(&self) -> Option<UserRole> {
        self.session.session().map(|s| s.role)
    }

    pub fn is_boarder(&self) -> bool {
        self.role() == Some(UserRole::Boarder)
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Authenticated,
    /// Landlords and admins
    Staff,
    Admin,
}

impl Access {
    pub fn check(self, ctx: &Context) -> Result<(), ApiError> {
        if self == Access::Public {
            return Ok(());
        }
        let session = ctx.session()?;
        let allowed = match self {
            Access::Public | Access::Authenticated => true,
            Access::Staff => session.role.is_staff(),
            Access::Admin => session.role == UserRole::Admin,
        };
        if allowed {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role '{}' cannot perform this operation",
                session.role.as_str()
            )))
        }
    }
}

type Handler = Arc<dyn Fn(Context, Value) -> BoxFuture<'static, Result<Value, ApiError>> + Send + Sync>;

struct Procedure {
    access: Access,
    handler: Handler,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcedureInfo {
    pub name: String,
    pub access: Access,
}

#[derive(Default)]
pub struct ProcedureRouter {
    procedures: BTreeMap<String, Procedure>,
}

impl ProcedureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resource.action`. Input is deserialized into `I` (a missing
    /// or null input reads as `{}`) and the output serialized back to JSON.
    pub fn register<I, O, F, Fut>(&mut self, resource: &str, action: &str, access: Access, handler: F)
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + 'static,
        F: Fn(Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let wrapped: Handler = Arc::new(move |ctx, input| {
            let handler = handler.clone();
            async move {
                let input = match input {
                    Value::Null => Value::Object(Default::default()),
                    other => other,
                };
                let input: I = serde_json::from_value(input)?;
                let output = (handler.as_ref())(ctx, input).await?;
                Ok(serde_json::to_value(output)?)
            }
            .boxed()
        });

        self.procedures.insert(
            format!("{}.{}", resource, action),
            Procedure {
                access,
                handler: wrapped,
            },
        );
    }

    pub fn contains(&self, resource: &str, action: &str) -> bool {
        self.procedures.contains_key(&format!("{}.{}", resource, action))
    }

    pub fn list(&self) -> Vec<ProcedureInfo> {
        self.procedures
            .iter()
            .map(|(name, p)| ProcedureInfo {
                name: name.clone(),
                access: p.access,
            })
            .collect()
    }

    pub async fn call(&self, resource: &str, action: &str, ctx: Context, input: Value) -> Result<Value, ApiError> {
        let name = format!("{}.{}", resource, action);
        let procedure = self
            .procedures
            .get(&name)
            .ok_or_else(|| ApiError::internal_server_error(format!("Procedure {} not found", name)))?;

        procedure.access.check(&ctx)?;
        (procedure.handler)(ctx, input).await
    }
}

/// The full procedure table served by the API
pub fn build() -> ProcedureRouter {
    let mut router = ProcedureRouter::new();
    auth::register(&mut router);
    users::register(&mut router);
    landlords::register(&mut router);
    properties::register(&mut router);
    rooms::register(&mut router);
    boarders::register(&mut router);
    bookings::register(&mut router);
    payments::register(&mut router);
    maintenance::register(&mut router);
    utilities::register(&mut router);
    dashboard::register(&mut router);
    router
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn context(store: &Store, role: Option<UserRole>, tenant_id: Uuid) -> Context {
        context_for(store, role, tenant_id, Uuid::new_v4())
    }

    pub fn context_for(store: &Store, role: Option<UserRole>, tenant_id: Uuid, user_id: Uuid) -> Context {
        let session = match role {
            Some(role) => SessionState::Present(Session {
                user_id,
                tenant_id,
                role,
                email: format!("{}@example.com", role.as_str()),
                expires_at: i64::MAX,
            }),
            None => SessionState::Anonymous,
        };
        Context {
            store: store.clone(),
            session,
            tenant_id: Some(tenant_id),
            config: Arc::new(AppConfig::development()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::context;
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Echo {
        #[serde(default)]
        word: Option<String>,
    }

    fn router() -> ProcedureRouter {
        let mut router = ProcedureRouter::new();
        router.register("test", "echo", Access::Public, |_ctx, input: Echo| async move {
            Ok(json!({ "word": input.word }))
        });
        router.register("test", "staff", Access::Staff, |_ctx, _input: Value| async move { Ok(json!("ok")) });
        router.register("test", "admin", Access::Admin, |_ctx, _input: Value| async move { Ok(json!("ok")) });
        router
    }

    #[tokio::test]
    async fn null_input_reads_as_empty_object() {
        let store = Store::memory();
        let out = router()
            .call("test", "echo", context(&store, None, Uuid::new_v4()), Value::Null)
            .await
            .unwrap();
        assert_eq!(out, json!({ "word": null }));
    }

    #[tokio::test]
    async fn unknown_procedure_is_a_server_error() {
        let store = Store::memory();
        let err = router()
            .call("rooms", "explode", context(&store, None, Uuid::new_v4()), Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Procedure rooms.explode not found");
    }

    #[tokio::test]
    async fn enforces_access_levels() {
        let store = Store::memory();
        let tenant = Uuid::new_v4();
        let router = router();

        let anon = router.call("test", "staff", context(&store, None, tenant), Value::Null).await;
        assert_eq!(anon.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);

        let boarder = router
            .call("test", "staff", context(&store, Some(UserRole::Boarder), tenant), Value::Null)
            .await;
        assert_eq!(boarder.unwrap_err().status_code(), axum::http::StatusCode::FORBIDDEN);

        assert!(router
            .call("test", "staff", context(&store, Some(UserRole::Landlord), tenant), Value::Null)
            .await
            .is_ok());
        let landlord_admin = router
            .call("test", "admin", context(&store, Some(UserRole::Landlord), tenant), Value::Null)
            .await;
        assert_eq!(landlord_admin.unwrap_err().status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_input_is_bad_request() {
        let store = Store::memory();
        let err = router()
            .call("test", "echo", context(&store, None, Uuid::new_v4()), json!({ "word": 5 }))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn full_table_lists_every_resource() {
        let names: Vec<String> = build().list().into_iter().map(|p| p.name).collect();
        for expected in [
            "auth.register",
            "users.me",
            "rooms.getAll",
            "bookings.confirm",
            "payments.markOverdue",
            "maintenance.start",
            "utilities.getAll",
            "dashboard.summary",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }
}
