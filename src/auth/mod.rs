use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::{User, UserRole};

/// JWT payload carried in `Authorization: Bearer` headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub role: UserRole,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, tenant_id: Uuid, role: UserRole, email: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            tenant_id,
            role,
            email: email.into(),
            iat: now.timestamp(),
            exp,
        }
    }

    pub fn for_user(user: &User, expiry_hours: u64) -> Self {
        Self::new(user.id, user.tenant_id, user.role, user.email.clone(), expiry_hours)
    }
}

/// The authenticated caller, as seen by procedures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: UserRole,
    pub email: String,
    pub expires_at: i64,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
            email: claims.email,
            expires_at: claims.exp,
        }
    }
}

/// What the auth middleware found on a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    /// A header was sent but could not be used; the reason is reported on 401
    Invalid(String),
    Present(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Present(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "JWT secret not configured"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

/// Mint a token for `user` with the configured lifetime
pub fn issue_token(user: &User, security: &SecurityConfig) -> Result<String, JwtError> {
    generate_jwt(&Claims::for_user(user, security.jwt_expiry_hours), security)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        AppConfig::development().security
    }

    #[test]
    fn round_trips_claims() {
        let security = security();
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Landlord, "owner@example.com", 1);
        let token = generate_jwt(&claims, &security).unwrap();
        let decoded = validate_jwt(&token, &security).unwrap();
        assert_eq!(decoded, claims);

        let session = Session::from(decoded);
        assert_eq!(session.role, UserRole::Landlord);
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Boarder, "b@example.com", 1);
        let token = generate_jwt(&claims, &security()).unwrap();

        let mut other = security();
        other.jwt_secret = "another-secret".to_string();
        assert!(matches!(validate_jwt(&token, &other), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let security = security();
        let mut claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Admin, "a@example.com", 1);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = generate_jwt(&claims, &security).unwrap();
        assert!(validate_jwt(&token, &security).is_err());
    }

    #[test]
    fn refuses_empty_secret() {
        let mut security = security();
        security.jwt_secret.clear();
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Admin, "a@example.com", 1);
        assert!(matches!(generate_jwt(&claims, &security), Err(JwtError::InvalidSecret)));
    }
}
