//! Handlers for the image catalog and the triage queues.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/wounds` | `[{id, path}]` |
//! | `GET`  | `/api/wounds/with-status` | adds `annotated` + `annotators` |
//! | `GET`  | `/api/wounds/:id` | clinical metadata, 404 if unknown |
//! | `GET`  | `/api/wounds/:id/image` | `image/jpeg` bytes |
//! | `GET`  | `/api/wounds/review-queue`, `/api/wounds/omit-queue` | |
//! | `POST` | `/api/wounds/:id/status` | `{status}` per the triage actions |
//! | `POST` | `/api/wounds/:id/request-omit` | always enqueues to omit |

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use woundbox_core::{
  assessment::{AssessmentRef, AssessmentStatus, WoundAssessment},
  store::WoundStore,
  triage::{StatusAction, TriageEntry, TriageQueue},
};

use crate::{
  AppState,
  auth::AuthUser,
  error::{ApiError, ApiJson},
};

/// Parse a path segment as an assessment id. Non-numeric text is the
/// caller's mistake, not a server fault.
pub(crate) fn parse_assessment_id(raw: &str) -> Result<i64, ApiError> {
  raw
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid assessment id: {raw:?}")))
}

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /api/wounds`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Result<Json<Vec<AssessmentRef>>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let refs = state
    .store
    .list_assessments()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(refs))
}

/// `GET /api/wounds/with-status`
pub async fn list_with_status<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Result<Json<Vec<AssessmentStatus>>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let statuses = state
    .store
    .list_assessments_with_status()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(statuses))
}

/// `GET /api/wounds/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
  Path(raw_id): Path<String>,
) -> Result<Json<WoundAssessment>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_assessment_id(&raw_id)?;
  let assessment = state
    .store
    .get_assessment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("wound {id} not found")))?;
  Ok(Json(assessment))
}

/// `GET /api/wounds/:id/image` — raw JPEG bytes.
pub async fn get_image<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
  Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_assessment_id(&raw_id)?;
  let bytes = state
    .store
    .get_image_bytes(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("wound image {id} not found")))?;
  Ok((
    [(header::CONTENT_TYPE, "image/jpeg")],
    bytes::Bytes::from(bytes),
  ))
}

// ─── Triage queues ────────────────────────────────────────────────────────────

/// `GET /api/wounds/review-queue`
pub async fn review_queue<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Result<Json<Vec<TriageEntry>>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let entries = state
    .store
    .list_queue(TriageQueue::Review)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}

/// `GET /api/wounds/omit-queue`
pub async fn omit_queue<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Result<Json<Vec<TriageEntry>>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let entries = state
    .store
    .list_queue(TriageQueue::Omit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `POST /api/wounds/:id/status`
pub async fn set_status<S>(
  State(state): State<AppState<S>>,
  AuthUser(claims): AuthUser,
  Path(raw_id): Path<String>,
  ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_assessment_id(&raw_id)?;
  let action = StatusAction::parse(&body.status)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  state
    .store
    .set_status(id, action, claims.username.clone())
    .await
    .map_err(ApiError::store)?;

  tracing::info!(assessment_id = id, status = %body.status, by = %claims.username, "triage status updated");
  Ok(Json(json!({ "message": "status updated" })))
}

/// `POST /api/wounds/:id/request-omit` — unconditional enqueue.
pub async fn request_omit<S>(
  State(state): State<AppState<S>>,
  AuthUser(claims): AuthUser,
  Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_assessment_id(&raw_id)?;
  state
    .store
    .set_status(id, StatusAction::Omitted, claims.username)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "message": "omit requested" })))
}
