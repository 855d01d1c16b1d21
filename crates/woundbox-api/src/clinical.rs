//! Fixed clinical enumerations served read-only to the annotation UI:
//! wound etiologies, body locations, and the category colour map.

use axum::{Json, extract::State};
use serde_json::{Map, Value};
use woundbox_core::store::WoundStore;

use crate::{AppState, auth::AuthUser};

pub const ETIOLOGY_OPTIONS: &[&str] = &[
  "INSECT BITE",
  "DOG BITE",
  "CAT BITE",
  "HUMAN BITE",
  "BITE (OTHER)",
  "SURGICAL",
  "AUTOIMMUNE",
  "TRAUMA",
  "INFECTIOUS ABCESS",
  "CYST LESION",
  "VASCULITUS",
  "MALIGNANT",
  "MASD",
  "CHRONIC SKIN ULCER",
  "PRESSURE / DEVICE RELATED PRESSURE",
  "DIABETIC SKIN ULCER (FOOT)",
  "DIABETIC SKIN ULCER (NON-FOOT)",
  "BURN",
  "STOMA",
  "FISTULA/SINUS TRACT",
  "DERMATOLOLICAL",
  "CALCIPHYLAXIS",
  "NOT A WOUND",
  "RADIATION WOUND",
  "EDEMA RELATED",
];

pub const BODY_LOCATIONS: &[&str] = &[
  "HEAD",
  "NECK",
  "LOWER EXTREMITY",
  "TORSO ABDOMEN",
  "TORSO BACK",
  "BUTTOCKS SACRUM",
  "PERINEUM",
];

/// Hex display colour per category, one entry per etiology option.
pub const CATEGORY_COLORS: &[(&str, &str)] = &[
  ("INSECT BITE", "#FF0000"),
  ("DOG BITE", "#FF4500"),
  ("CAT BITE", "#FF6347"),
  ("HUMAN BITE", "#FF7F50"),
  ("BITE (OTHER)", "#FF8C00"),
  ("SURGICAL", "#800080"),
  ("AUTOIMMUNE", "#9370DB"),
  ("TRAUMA", "#FF1493"),
  ("INFECTIOUS ABCESS", "#8B0000"),
  ("CYST LESION", "#DA70D6"),
  ("VASCULITUS", "#0000FF"),
  ("MALIGNANT", "#000080"),
  ("MASD", "#4169E1"),
  ("CHRONIC SKIN ULCER", "#1E90FF"),
  ("PRESSURE / DEVICE RELATED PRESSURE", "#00BFFF"),
  ("DIABETIC SKIN ULCER (FOOT)", "#00FF00"),
  ("DIABETIC SKIN ULCER (NON-FOOT)", "#32CD32"),
  ("BURN", "#FFA500"),
  ("STOMA", "#8B4513"),
  ("FISTULA/SINUS TRACT", "#A0522D"),
  ("DERMATOLOLICAL", "#6B8E23"),
  ("CALCIPHYLAXIS", "#556B2F"),
  ("NOT A WOUND", "#808080"),
  ("RADIATION WOUND", "#4B0082"),
  ("EDEMA RELATED", "#483D8B"),
];

/// `GET /api/config/etiology-options`
pub async fn etiology_options<S>(
  State(_): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Json<Vec<&'static str>>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Json(ETIOLOGY_OPTIONS.to_vec())
}

/// `GET /api/config/body-locations`
pub async fn body_locations<S>(
  State(_): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Json<Vec<&'static str>>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Json(BODY_LOCATIONS.to_vec())
}

/// `GET /api/config/category-colors`
pub async fn category_colors<S>(
  State(_): State<AppState<S>>,
  AuthUser(_): AuthUser,
) -> Json<Value>
where
  S: WoundStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let map: Map<String, Value> = CATEGORY_COLORS
    .iter()
    .map(|(cat, hex)| ((*cat).to_owned(), Value::String((*hex).to_owned())))
    .collect();
  Json(Value::Object(map))
}
