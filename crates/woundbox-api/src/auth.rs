//! Bearer-token auth: argon2 password hashing, HS256 JWT issue/verify, and
//! the `AuthUser`/`AdminUser` request extractors.
//!
//! Tokens are stateless; there is no server-side session table. Revocation
//! before expiry is not supported — the TTL is the only bound.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use woundbox_core::{store::WoundStore, user::{Role, User}};

use crate::{AppState, error::ApiError};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("cannot hash password: {e}").into()))
}

/// Verify a password against a stored PHC string. A malformed stored hash
/// verifies as false rather than erroring.
pub fn verify_password(phc: &str, password: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Signing parameters for identity tokens.
#[derive(Clone)]
pub struct TokenConfig {
  /// HMAC-SHA256 secret used to sign and verify tokens.
  pub secret:    String,
  /// Token lifetime in hours.
  pub ttl_hours: i64,
}

/// JWT claims embedded in every identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Subject — the user's id.
  pub sub:       Uuid,
  pub username:  String,
  pub full_name: String,
  pub role:      Role,
  /// Issued-at (UTC Unix timestamp).
  pub iat:       i64,
  /// Expiration (UTC Unix timestamp).
  pub exp:       i64,
}

/// Issue a signed token for an authenticated user.
pub fn issue_token(user: &User, config: &TokenConfig) -> Result<String, ApiError> {
  let now = chrono::Utc::now().timestamp();
  let claims = Claims {
    sub:       user.user_id,
    username:  user.username.clone(),
    full_name: user.full_name.clone(),
    role:      user.role,
    iat:       now,
    exp:       now + config.ttl_hours * 3600,
  };
  encode(
    &Header::default(), // HS256
    &claims,
    &EncodingKey::from_secret(config.secret.as_bytes()),
  )
  .map_err(|e| ApiError::store(e))
}

/// Validate a token's signature and expiry and return its claims.
pub fn verify_token(token: &str, config: &TokenConfig) -> Result<Claims, ApiError> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(config.secret.as_bytes()),
    &Validation::default(), // HS256, validates exp
  )
  .map(|data| data.claims)
  .map_err(|_| ApiError::Unauthorized)
}

/// Extract and verify the `Authorization: Bearer <jwt>` header.
pub fn verify_bearer(headers: &HeaderMap, config: &TokenConfig) -> Result<Claims, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .ok_or(ApiError::Unauthorized)?;

  verify_token(token, config)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The authenticated caller; present in a handler's signature means the
/// request carried a valid token.
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let claims = verify_bearer(&parts.headers, &state.tokens)?;
    Ok(AuthUser(claims))
  }
}

/// An authenticated caller holding the `admin` role.
pub struct AdminUser(pub Claims);

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let claims = verify_bearer(&parts.headers, &state.tokens)?;
    if claims.role != Role::Admin {
      return Err(ApiError::Forbidden);
    }
    Ok(AdminUser(claims))
  }
}
