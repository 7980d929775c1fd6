use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{crud, Access, Context, ProcedureRouter};
use crate::auth::issue_token;
use crate::database::models::{Boarder, Landlord, NewBoarder, NewLandlord, NewUser, User, UserRole};
use crate::database::ListQuery;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub role: UserRole,
    /// Required for boarders. Landlords always start a new tenant.
    pub tenant_id: Option<Uuid>,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "Emergency contact must be at most 200 characters"))]
    pub emergency_contact: Option<String>,
}

/// The role-specific row created alongside a user
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Landlord(Landlord),
    Boarder(Boarder),
}

#[derive(Debug, Serialize)]
pub struct Registration {
    pub user: User,
    pub profile: Profile,
    pub token: String,
}

pub fn register(router: &mut ProcedureRouter) {
    router.register("auth", "register", Access::Public, |ctx, input: RegisterInput| async move {
        register_user(&ctx, input).await
    });
}

async fn register_user(ctx: &Context, input: RegisterInput) -> Result<Registration, ApiError> {
    input.validate()?;

    let tenant_id = match (input.role, input.tenant_id.or(ctx.tenant_id)) {
        (UserRole::Admin, _) => return Err(ApiError::forbidden("Admins cannot self-register")),
        // Landlords never join an existing tenant.
        (UserRole::Landlord, _) => Uuid::new_v4(),
        (UserRole::Boarder, Some(tenant_id)) => tenant_id,
        (UserRole::Boarder, None) => {
            return Err(ApiError::bad_request("Boarders must register under an existing tenant_id"))
        }
    };

    let email = input.email.trim().to_lowercase();
    let taken = ListQuery::scoped(Some(tenant_id)).filter("email", &email);
    if ctx.store.count::<User>(&taken).await? > 0 {
        return Err(ApiError::conflict(format!("Email {} is already registered", email)));
    }

    let now = Utc::now();
    let user = NewUser {
        email: email.clone(),
        name: input.name.clone(),
        role: input.role,
    }
    .into_entity(tenant_id, now);
    let user = crud::create(ctx, user).await?;

    let profile = match input.role {
        UserRole::Landlord => {
            let landlord = NewLandlord {
                user_id: Some(user.id),
                name: input.name,
                email,
                phone: input.phone,
            }
            .into_entity(tenant_id, now);
            Profile::Landlord(crud::create(ctx, landlord).await?)
        }
        _ => {
            let boarder = NewBoarder {
                user_id: Some(user.id),
                name: input.name,
                email,
                phone: input.phone,
                emergency_contact: input.emergency_contact,
            }
            .into_entity(tenant_id, now);
            Profile::Boarder(crud::create(ctx, boarder).await?)
        }
    };

    let token = issue_token(&user, &ctx.config.security).map_err(|e| {
        tracing::error!("Failed to issue token for {}: {}", user.id, e);
        ApiError::internal_server_error("Failed to issue session token")
    })?;

    tracing::info!("Registered {} {} in tenant {}", user.role.as_str(), user.id, tenant_id);
    Ok(Registration { user, profile, token })
}
