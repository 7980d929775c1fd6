use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::UserRole;

pub fn handle(
    user: Uuid,
    tenant: Uuid,
    role: UserRole,
    email: String,
    hours: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let security = &config().security;
    let hours = hours.unwrap_or(security.jwt_expiry_hours);
    let claims = Claims::new(user, tenant, role, email, hours);
    let token = generate_jwt(&claims, security).map_err(|e| anyhow::anyhow!("{}", e))?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "token": token,
                "expires_at": claims.exp,
                "role": role.as_str(),
            }))?
        ),
        // bare token so it can be captured with $(boarding token ...)
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
