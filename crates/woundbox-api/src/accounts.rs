//! Handlers for authentication and account management.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/auth/login` | `{username, password}`; open |
//! | `POST` | `/api/auth/register` | open only when registration is enabled |
//! | `POST` | `/api/auth/change-password` | auth |
//! | `GET`  | `/api/users` | admin |
//! | `POST` | `/api/users/:id/role` | admin |
//! | `POST` | `/api/users/:id/deactivate` | admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use woundbox_core::{
  store::WoundStore,
  user::{NewUser, Role, User},
};

use crate::{
  AppState,
  auth::{self, AdminUser, AuthUser},
  error::{ApiError, ApiJson},
};

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// The user as presented on the wire after authentication.
#[derive(Debug, Serialize)]
pub struct UserView {
  pub user_id:   Uuid,
  pub username:  String,
  pub full_name: String,
  pub role:      Role,
}

impl From<&User> for UserView {
  fn from(u: &User) -> Self {
    UserView {
      user_id:   u.user_id,
      username:  u.username.clone(),
      full_name: u.full_name.clone(),
      role:      u.role,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub user:         UserView,
}

/// `POST /api/auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.username.is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest(
      "username and password are required".into(),
    ));
  }

  let user = state
    .store
    .find_user_by_username(&body.username)
    .await
    .map_err(ApiError::store)?;

  // Deactivated accounts and unknown usernames fail identically.
  let user = match user {
    Some(u) if u.is_active && auth::verify_password(&u.password_hash, &body.password) => u,
    _ => return Err(ApiError::Unauthorized),
  };

  state
    .store
    .touch_last_login(user.user_id)
    .await
    .map_err(ApiError::store)?;

  let access_token = auth::issue_token(&user, &state.tokens)?;
  tracing::info!(username = %user.username, "login");
  Ok(Json(TokenResponse { access_token, user: UserView::from(&user) }))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:  String,
  pub password:  String,
  pub full_name: String,
  pub email:     Option<String>,
  pub role:      Option<Role>,
}

/// `POST /api/auth/register` — 201 + token, like a login.
///
/// Only available when `allow_registration` is set; otherwise accounts are
/// provisioned by an admin.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if !state.config.allow_registration {
    return Err(ApiError::Forbidden);
  }
  if body.username.is_empty() || body.password.is_empty() || body.full_name.is_empty() {
    return Err(ApiError::BadRequest("all fields are required".into()));
  }

  if state
    .store
    .find_user_by_username(&body.username)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::BadRequest("username already exists".into()));
  }

  let user = state
    .store
    .create_user(NewUser {
      username:      body.username,
      password_hash: auth::hash_password(&body.password)?,
      full_name:     body.full_name,
      email:         body.email,
      role:          body.role.unwrap_or(Role::Annotator),
    })
    .await
    .map_err(ApiError::store)?;

  let access_token = auth::issue_token(&user, &state.tokens)?;
  tracing::info!(username = %user.username, "registered");
  Ok((
    StatusCode::CREATED,
    Json(TokenResponse { access_token, user: UserView::from(&user) }),
  ))
}

// ─── Change password ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
  pub old_password: String,
  pub new_password: String,
}

/// `POST /api/auth/change-password`
pub async fn change_password<S>(
  State(state): State<AppState<S>>,
  AuthUser(claims): AuthUser,
  ApiJson(body): ApiJson<ChangePasswordBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.new_password.is_empty() {
    return Err(ApiError::BadRequest("new password is required".into()));
  }

  let user = state
    .store
    .get_user(claims.sub)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !auth::verify_password(&user.password_hash, &body.old_password) {
    return Err(ApiError::Unauthorized);
  }

  state
    .store
    .update_password_hash(user.user_id, auth::hash_password(&body.new_password)?)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(json!({ "message": "password updated" })))
}

// ─── Admin: user management ───────────────────────────────────────────────────

/// `GET /api/users` — all accounts, active and deactivated.
pub async fn list_users<S>(
  State(state): State<AppState<S>>,
  AdminUser(_): AdminUser,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
  pub role: String,
}

/// `POST /api/users/:id/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  AdminUser(_): AdminUser,
  Path(user_id): Path<Uuid>,
  ApiJson(body): ApiJson<SetRoleBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let role: Role = body
    .role
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("unknown role: {:?}", body.role)))?;

  let changed = state
    .store
    .set_user_role(user_id, role)
    .await
    .map_err(ApiError::store)?;
  if !changed {
    return Err(ApiError::NotFound(format!("user {user_id} not found")));
  }
  Ok(Json(json!({ "message": "role updated" })))
}

/// `POST /api/users/:id/deactivate` — accounts are never hard-deleted.
pub async fn deactivate<S>(
  State(state): State<AppState<S>>,
  AdminUser(_): AdminUser,
  Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let changed = state
    .store
    .deactivate_user(user_id)
    .await
    .map_err(ApiError::store)?;
  if !changed {
    return Err(ApiError::NotFound(format!("user {user_id} not found")));
  }
  Ok(Json(json!({ "message": "user deactivated" })))
}
