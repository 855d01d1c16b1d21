//! JSON REST API for the Woundbox annotation backend.
//!
//! Exposes an axum [`Router`] backed by any [`woundbox_core::store::WoundStore`].
//! Auth is bearer-token (HS256 JWT); role gates are enforced per route via
//! the extractors in [`auth`].

pub mod accounts;
pub mod annotations;
pub mod auth;
pub mod clinical;
pub mod error;
pub mod wounds;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};
use woundbox_core::store::WoundStore;

use auth::TokenConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WOUNDBOX_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// HMAC secret for token signing. Keep out of version control.
  pub jwt_secret: String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours: i64,
  /// Browser origins allowed by CORS. Empty means no cross-origin access.
  #[serde(default)]
  pub cors_origins: Vec<String>,
  /// When false, accounts are provisioned by an admin only.
  #[serde(default)]
  pub allow_registration: bool,
}

fn default_token_ttl_hours() -> i64 { 24 }

impl ServerConfig {
  pub fn token_config(&self) -> TokenConfig {
    TokenConfig {
      secret:    self.jwt_secret.clone(),
      ttl_hours: self.token_ttl_hours,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: WoundStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub tokens: Arc<TokenConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let cors = cors_layer(&state.config);

  Router::new()
    // Auth + accounts
    .route("/api/auth/login", post(accounts::login::<S>))
    .route("/api/auth/register", post(accounts::register::<S>))
    .route("/api/auth/change-password", post(accounts::change_password::<S>))
    .route("/api/users", get(accounts::list_users::<S>))
    .route("/api/users/{id}/role", post(accounts::set_role::<S>))
    .route("/api/users/{id}/deactivate", post(accounts::deactivate::<S>))
    // Image catalog
    .route("/api/wounds", get(wounds::list::<S>))
    .route("/api/wounds/with-status", get(wounds::list_with_status::<S>))
    // Triage queues (static segments before the {id} captures)
    .route("/api/wounds/review-queue", get(wounds::review_queue::<S>))
    .route("/api/wounds/omit-queue", get(wounds::omit_queue::<S>))
    .route("/api/wounds/{id}", get(wounds::get_one::<S>))
    .route("/api/wounds/{id}/image", get(wounds::get_image::<S>))
    .route("/api/wounds/{id}/status", post(wounds::set_status::<S>))
    .route("/api/wounds/{id}/request-omit", post(wounds::request_omit::<S>))
    // Annotations
    .route(
      "/api/annotations/count-by-category",
      get(annotations::count_by_category::<S>),
    )
    .route(
      "/api/annotations/{id}",
      get(annotations::get_for_assessment::<S>)
        .post(annotations::save_for_assessment::<S>),
    )
    // Fixed clinical enumerations
    .route("/api/config/etiology-options", get(clinical::etiology_options::<S>))
    .route("/api/config/body-locations", get(clinical::body_locations::<S>))
    .route("/api/config/category-colors", get(clinical::category_colors::<S>))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
  let origins: Vec<HeaderValue> = config
    .cors_origins
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use woundbox_core::{
    assessment::WoundAssessment,
    store::WoundStore as _,
    user::{NewUser, Role},
  };
  use woundbox_store_sqlite::SqliteStore;

  async fn make_state(allow_registration: bool) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();

    for (username, full_name, role) in [
      ("admin", "Ada Admin", Role::Admin),
      ("annie", "Annie Annotator", Role::Annotator),
    ] {
      store
        .create_user(NewUser {
          username:      username.into(),
          password_hash: auth::hash_password("secret").unwrap(),
          full_name:     full_name.into(),
          email:         None,
          role,
        })
        .await
        .unwrap();
    }

    store
      .insert_assessment(
        WoundAssessment {
          assessment_id: 42,
          wound_type:    "BURN".into(),
          body_location: "LOWER EXTREMITY".into(),
          patient_id:    Some("P-042".into()),
          storage_path:  "wounds/batch-1/42.jpg".into(),
        },
        Some(vec![0xFF, 0xD8, 0xFF, 0xE0]),
      )
      .await
      .unwrap();

    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:               "127.0.0.1".into(),
        port:               3000,
        store_path:         PathBuf::from(":memory:"),
        jwt_secret:         "integration-test-secret".into(),
        token_ttl_hours:    24,
        cors_origins:       vec![],
        allow_registration,
      }),
      tokens: Arc::new(TokenConfig {
        secret:    "integration-test-secret".into(),
        ttl_hours: 24,
      }),
    }
  }

  async fn send(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn login(state: &AppState<SqliteStore>, username: &str) -> String {
    let resp = send(
      state.clone(),
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": username, "password": "secret" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["access_token"].as_str().unwrap().to_owned()
  }

  fn bbox(category: &str) -> Value {
    json!({
      "category": category,
      "location_label": "LOWER EXTREMITY",
      "x": 10, "y": 20, "width": 30, "height": 40
    })
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_returns_token_and_user() {
    let state = make_state(false).await;
    let resp = send(
      state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "annie", "password": "secret" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["username"], "annie");
    assert_eq!(body["user"]["role"], "annotator");
  }

  #[tokio::test]
  async fn login_wrong_password_is_401() {
    let state = make_state(false).await;
    let resp = send(
      state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "annie", "password": "nope" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn deactivated_user_cannot_log_in() {
    let state = make_state(false).await;
    let annie = state
      .store
      .find_user_by_username("annie")
      .await
      .unwrap()
      .unwrap();
    state.store.deactivate_user(annie.user_id).await.unwrap();

    let resp = send(
      state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "annie", "password": "secret" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn protected_routes_require_a_token() {
    let state = make_state(false).await;
    let resp = send(state, "GET", "/api/annotations/42", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn registration_is_403_when_disabled() {
    let state = make_state(false).await;
    let resp = send(
      state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "username": "new", "password": "pw", "full_name": "New User"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn registration_creates_an_annotator() {
    let state = make_state(true).await;
    let resp = send(
      state.clone(),
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "username": "new", "password": "pw", "full_name": "New User"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["role"], "annotator");

    // Duplicate username is a 400, not a 500.
    let dup = send(
      state,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "username": "new", "password": "pw", "full_name": "Other"
      })),
    )
    .await;
    assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn change_password_requires_the_old_one() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let wrong = send(
      state.clone(),
      "POST",
      "/api/auth/change-password",
      Some(&token),
      Some(json!({ "old_password": "nope", "new_password": "fresh" })),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = send(
      state.clone(),
      "POST",
      "/api/auth/change-password",
      Some(&token),
      Some(json!({ "old_password": "secret", "new_password": "fresh" })),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let relogin = send(
      state,
      "POST",
      "/api/auth/login",
      None,
      Some(json!({ "username": "annie", "password": "fresh" })),
    )
    .await;
    assert_eq!(relogin.status(), StatusCode::OK);
  }

  // ── Role gates ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn user_management_is_admin_only() {
    let state = make_state(false).await;
    let annie = login(&state, "annie").await;
    let admin = login(&state, "admin").await;

    let forbidden = send(state.clone(), "GET", "/api/users", Some(&annie), None).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let ok = send(state, "GET", "/api/users", Some(&admin), None).await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    let usernames: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|u| u["username"].as_str().unwrap())
      .collect();
    assert_eq!(usernames, vec!["admin", "annie"]);
    // Hashes never leave the server.
    assert!(body[0].get("password_hash").is_none());
  }

  #[tokio::test]
  async fn admin_can_change_roles_and_deactivate() {
    let state = make_state(false).await;
    let admin = login(&state, "admin").await;
    let annie = state
      .store
      .find_user_by_username("annie")
      .await
      .unwrap()
      .unwrap();

    let resp = send(
      state.clone(),
      "POST",
      &format!("/api/users/{}/role", annie.user_id),
      Some(&admin),
      Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let bad_role = send(
      state.clone(),
      "POST",
      &format!("/api/users/{}/role", annie.user_id),
      Some(&admin),
      Some(json!({ "role": "superuser" })),
    )
    .await;
    assert_eq!(bad_role.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      state.clone(),
      "POST",
      &format!("/api/users/{}/deactivate", annie.user_id),
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let missing = send(
      state,
      "POST",
      &format!("/api/users/{}/deactivate", uuid::Uuid::new_v4()),
      Some(&admin),
      None,
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
  }

  // ── Annotations ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unannotated_assessment_returns_empty_boxes() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;
    let resp = send(state, "GET", "/api/annotations/42", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "boxes": [] }));
  }

  #[tokio::test]
  async fn save_and_get_round_trip() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let resp = send(
      state.clone(),
      "POST",
      "/api/annotations/42",
      Some(&token),
      Some(json!([bbox("BURN"), bbox("TRAUMA")])),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(state, "GET", "/api/annotations/42", Some(&token), None).await;
    let body = body_json(resp).await;
    let boxes = body["boxes"].as_array().unwrap();
    assert_eq!(boxes.len(), 2);

    let burn = boxes.iter().find(|b| b["category"] == "BURN").unwrap();
    assert_eq!(burn["x"], 10);
    assert_eq!(burn["width"], 30);
    assert_eq!(burn["created_by"], "annie");
    assert_eq!(burn["last_modified_by"], "annie");
    // Omitted optional fields come back as empty strings, never null.
    assert_eq!(burn["doctor_notes"], "");
    assert_eq!(burn["severity"], "");
    assert!(burn["annotation_id"].as_str().is_some());
  }

  #[tokio::test]
  async fn invalid_batch_is_400_and_prior_set_survives() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    send(
      state.clone(),
      "POST",
      "/api/annotations/42",
      Some(&token),
      Some(json!([bbox("BURN")])),
    )
    .await;

    let mut zero_width = bbox("TRAUMA");
    zero_width["width"] = json!(0);
    let resp = send(
      state.clone(),
      "POST",
      "/api/annotations/42",
      Some(&token),
      Some(json!([zero_width])),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(state, "GET", "/api/annotations/42", Some(&token), None).await;
    let body = body_json(resp).await;
    assert_eq!(body["boxes"].as_array().unwrap().len(), 1);
    assert_eq!(body["boxes"][0]["category"], "BURN");
  }

  #[tokio::test]
  async fn missing_required_field_is_400() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    // No `width`: the body fails deserialization before validation runs.
    let resp = send(
      state.clone(),
      "POST",
      "/api/annotations/42",
      Some(&token),
      Some(json!([{
        "category": "BURN", "location_label": "HEAD",
        "x": 1, "y": 2, "height": 4
      }])),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(send(state, "GET", "/api/annotations/42", Some(&token), None)
      .await
      .status()
      .is_success());
  }

  #[tokio::test]
  async fn non_numeric_assessment_id_is_400() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;
    let resp = send(state, "GET", "/api/annotations/forty-two", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn count_by_category_aggregates() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let empty = send(
      state.clone(),
      "GET",
      "/api/annotations/count-by-category",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(empty.status(), StatusCode::OK);
    assert_eq!(body_json(empty).await, json!([]));

    send(
      state.clone(),
      "POST",
      "/api/annotations/42",
      Some(&token),
      Some(json!([bbox("BURN"), bbox("BURN"), bbox("TRAUMA")])),
    )
    .await;

    let resp = send(
      state,
      "GET",
      "/api/annotations/count-by-category",
      Some(&token),
      None,
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(
      body,
      json!([
        { "category": "BURN", "count": 2 },
        { "category": "TRAUMA", "count": 1 }
      ])
    );
  }

  // ── Catalog ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn wound_metadata_and_image() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let resp = send(state.clone(), "GET", "/api/wounds/42", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["wound_type"], "BURN");
    assert_eq!(body["patient_id"], "P-042");

    let resp = send(state.clone(), "GET", "/api/wounds/42/image", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert_eq!(ct, "image/jpeg");

    let missing = send(state, "GET", "/api/wounds/999", Some(&token), None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn annotation_status_listing() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    send(
      state.clone(),
      "POST",
      "/api/annotations/42",
      Some(&token),
      Some(json!([bbox("BURN")])),
    )
    .await;

    let resp = send(state, "GET", "/api/wounds/with-status", Some(&token), None).await;
    let body = body_json(resp).await;
    let w42 = body
      .as_array()
      .unwrap()
      .iter()
      .find(|w| w["id"] == 42)
      .unwrap();
    assert_eq!(w42["annotated"], true);
    assert_eq!(w42["annotators"], "annie");
  }

  // ── Triage ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn review_queue_add_and_clear_scenario() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let resp = send(
      state.clone(),
      "POST",
      "/api/wounds/42/status",
      Some(&token),
      Some(json!({ "status": "expert_review" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(state.clone(), "GET", "/api/wounds/review-queue", Some(&token), None).await;
    let queue = body_json(resp).await;
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert_eq!(queue[0]["assessment_id"], 42);
    assert_eq!(queue[0]["requested_by"], "annie");

    let resp = send(
      state.clone(),
      "POST",
      "/api/wounds/42/status",
      Some(&token),
      Some(json!({ "status": "clear_review" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(state, "GET", "/api/wounds/review-queue", Some(&token), None).await;
    assert_eq!(body_json(resp).await, json!([]));
  }

  #[tokio::test]
  async fn double_add_keeps_a_single_entry() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    for _ in 0..2 {
      send(
        state.clone(),
        "POST",
        "/api/wounds/42/status",
        Some(&token),
        Some(json!({ "status": "omitted" })),
      )
      .await;
    }

    let resp = send(state, "GET", "/api/wounds/omit-queue", Some(&token), None).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn unknown_status_is_400() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;
    let resp = send(
      state,
      "POST",
      "/api/wounds/42/status",
      Some(&token),
      Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn request_omit_enqueues() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let resp = send(
      state.clone(),
      "POST",
      "/api/wounds/42/request-omit",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(state, "GET", "/api/wounds/omit-queue", Some(&token), None).await;
    let queue = body_json(resp).await;
    assert_eq!(queue[0]["assessment_id"], 42);
  }

  // ── Fixed enumerations ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn clinical_enumerations_are_served() {
    let state = make_state(false).await;
    let token = login(&state, "annie").await;

    let resp = send(
      state.clone(),
      "GET",
      "/api/config/etiology-options",
      Some(&token),
      None,
    )
    .await;
    let options = body_json(resp).await;
    assert!(options.as_array().unwrap().iter().any(|v| v == "BURN"));

    let resp = send(
      state.clone(),
      "GET",
      "/api/config/body-locations",
      Some(&token),
      None,
    )
    .await;
    let locations = body_json(resp).await;
    assert!(locations.as_array().unwrap().iter().any(|v| v == "HEAD"));

    let resp = send(
      state,
      "GET",
      "/api/config/category-colors",
      Some(&token),
      None,
    )
    .await;
    let colors = body_json(resp).await;
    assert_eq!(colors["BURN"], "#FFA500");
  }
}
