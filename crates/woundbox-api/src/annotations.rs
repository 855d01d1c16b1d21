//! Handlers for `/api/annotations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/annotations/:id` | `{"boxes": []}` when none exist |
//! | `POST` | `/api/annotations/:id` | body: `NewAnnotation[]`; full replace |
//! | `GET`  | `/api/annotations/count-by-category` | `[{category, count}]` |

use axum::{
  Json,
  extract::{Path, State},
};
use serde_json::json;
use woundbox_core::{
  annotation::{self, AnnotationSet, CategoryCount, NewAnnotation},
  store::WoundStore,
};

use crate::{
  AppState,
  auth::AuthUser,
  error::{ApiError, ApiJson},
  wounds::parse_assessment_id,
};

/// `GET /api/annotations/:id` — an unannotated assessment is an empty set,
/// not an error.
pub async fn get_for_assessment<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
  Path(raw_id): Path<String>,
) -> Result<Json<AnnotationSet>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_assessment_id(&raw_id)?;
  let set = state
    .store
    .get_annotations(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(set))
}

/// `POST /api/annotations/:id` — transactional replace of the assessment's
/// annotation set. An invalid box rejects the whole batch with 400 before
/// anything is written.
pub async fn save_for_assessment<S>(
  State(state): State<AppState<S>>,
  AuthUser(claims): AuthUser,
  Path(raw_id): Path<String>,
  ApiJson(batch): ApiJson<Vec<NewAnnotation>>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_assessment_id(&raw_id)?;
  annotation::validate_batch(&batch).map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let count = batch.len();
  state
    .store
    .save_annotations(id, batch, claims.username.clone())
    .await
    .map_err(ApiError::store)?;

  tracing::info!(assessment_id = id, boxes = count, by = %claims.username, "annotations saved");
  Ok(Json(json!({ "message": "annotations saved successfully" })))
}

/// `GET /api/annotations/count-by-category` — bare array, empty when there
/// are no annotations anywhere.
pub async fn count_by_category<S>(
  State(state): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Result<Json<Vec<CategoryCount>>, ApiError>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let counts = state
    .store
    .count_by_category()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(counts))
}
