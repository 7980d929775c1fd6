use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::auth::Profile;
use super::crud::{self, IdInput, Paging, UpdateInput};
use super::{Access, Context, ProcedureRouter};
use crate::database::models::{Boarder, Landlord, NewUser, User, UserRole};
use crate::database::ListQuery;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: User,
    pub profile: Option<Profile>,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("users", "me", Access::Authenticated, |ctx, _input: Value| async move {
        me(&ctx).await
    });

    router.register("users", "getAll", Access::Admin, |ctx, input: UserFilter| async move {
        let query = ListQuery::scoped(Some(ctx.tenant()?)).filter_opt("role", input.role.map(|r| r.as_str()));
        crud::list::<User>(&ctx, query, &input.paging).await
    });

    router.register("users", "getById", Access::Admin, |ctx, input: IdInput| async move {
        crud::get_in_tenant::<User>(&ctx, input.id).await
    });

    router.register("users", "create", Access::Admin, |ctx, input: NewUser| async move {
        input.validate()?;
        let tenant_id = ctx.tenant()?;
        let taken = ListQuery::scoped(Some(tenant_id)).filter("email", input.email.trim().to_lowercase());
        if ctx.store.count::<User>(&taken).await? > 0 {
            return Err(ApiError::conflict(format!("Email {} is already registered", input.email)));
        }
        crud::create(&ctx, input.into_entity(tenant_id, Utc::now())).await
    });

    router.register("users", "update", Access::Admin, |ctx, input: UpdateInput| async move {
        crud::update::<User>(&ctx, input).await
    });

    router.register("users", "delete", Access::Admin, |ctx, input: IdInput| async move {
        unlink_profiles(&ctx, input.id).await?;
        crud::delete::<User>(&ctx, input.id).await
    });
}

/// The signed-in user with their landlord or boarder profile
async fn me(ctx: &Context) -> Result<Me, ApiError> {
    let session = ctx.session()?;
    let user: User = ctx.store.get(Some(session.tenant_id), session.user_id).await?;
    let by_user = ListQuery::scoped(Some(session.tenant_id)).filter("user_id", user.id);

    let profile = match user.role {
        UserRole::Landlord => ctx
            .store
            .list::<Landlord>(&by_user)
            .await?
            .into_iter()
            .next()
            .map(Profile::Landlord),
        UserRole::Boarder => ctx
            .store
            .list::<Boarder>(&by_user)
            .await?
            .into_iter()
            .next()
            .map(Profile::Boarder),
        UserRole::Admin => None,
    };

    Ok(Me { user, profile })
}

/// Profiles outlive their user; detach them before the user goes.
async fn unlink_profiles(ctx: &Context, user_id: uuid::Uuid) -> Result<(), ApiError> {
    let by_user = ListQuery::scoped(Some(ctx.tenant()?)).filter("user_id", user_id);
    let now = Utc::now();

    for landlord in ctx.store.list::<Landlord>(&by_user).await? {
        let detached = Landlord {
            user_id: None,
            updated_at: now,
            ..landlord.clone()
        };
        crud::save(ctx, &landlord, detached).await?;
    }
    for boarder in ctx.store.list::<Boarder>(&by_user).await? {
        let detached = Boarder {
            user_id: None,
            updated_at: now,
            ..boarder.clone()
        };
        crud::save(ctx, &boarder, detached).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::context_for;
    use super::*;
    use crate::database::models::NewBoarder;
    use crate::database::Store;
    use uuid::Uuid;

    #[tokio::test]
    async fn me_includes_boarder_profile() {
        let store = Store::memory();
        let tenant = Uuid::new_v4();
        let now = Utc::now();
        let user = NewUser {
            email: "rica@example.com".to_string(),
            name: "Rica".to_string(),
            role: UserRole::Boarder,
        }
        .into_entity(tenant, now);
        store.insert(&user).await.unwrap();
        let boarder = NewBoarder {
            user_id: Some(user.id),
            name: "Rica".to_string(),
            email: "rica@example.com".to_string(),
            phone: None,
            emergency_contact: None,
        }
        .into_entity(tenant, now);
        store.insert(&boarder).await.unwrap();

        let ctx = context_for(&store, Some(UserRole::Boarder), tenant, user.id);
        let me = me(&ctx).await.unwrap();
        assert_eq!(me.user.id, user.id);
        assert!(matches!(me.profile, Some(Profile::Boarder(b)) if b.id == boarder.id));
    }

    #[tokio::test]
    async fn deleting_a_user_detaches_profiles() {
        let store = Store::memory();
        let tenant = Uuid::new_v4();
        let now = Utc::now();
        let user = NewUser {
            email: "rica@example.com".to_string(),
            name: "Rica".to_string(),
            role: UserRole::Boarder,
        }
        .into_entity(tenant, now);
        store.insert(&user).await.unwrap();
        let boarder = NewBoarder {
            user_id: Some(user.id),
            name: "Rica".to_string(),
            email: "rica@example.com".to_string(),
            phone: None,
            emergency_contact: None,
        }
        .into_entity(tenant, now);
        store.insert(&boarder).await.unwrap();

        let admin = context_for(&store, Some(UserRole::Admin), tenant, Uuid::new_v4());
        super::super::build()
            .call("users", "delete", admin, serde_json::json!({ "id": user.id }))
            .await
            .unwrap();

        let boarder: Boarder = store.get(Some(tenant), boarder.id).await.unwrap();
        assert_eq!(boarder.user_id, None);
    }
}
