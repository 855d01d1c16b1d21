//! Wound assessment records — the read-mostly image catalog.
//!
//! Assessments are created and maintained by an upstream ingestion process;
//! this system only ever reads them. Each is addressed by its numeric
//! assessment id.

use serde::Serialize;

/// Clinical metadata for one wound image. Image bytes are fetched separately
/// via [`crate::store::WoundStore::get_image_bytes`] so listing stays cheap.
#[derive(Debug, Clone, Serialize)]
pub struct WoundAssessment {
  pub assessment_id: i64,
  pub wound_type:    String,
  pub body_location: String,
  pub patient_id:    Option<String>,
  pub storage_path:  String,
}

/// A catalog listing entry: id plus storage path.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentRef {
  pub id:   i64,
  pub path: String,
}

/// A catalog entry enriched with annotation status.
///
/// `annotators` is a display string summarising the distinct users who have
/// contributed annotations, or `"-"` when there are none.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentStatus {
  pub id:         i64,
  pub path:       String,
  pub annotated:  bool,
  pub annotators: String,
}
