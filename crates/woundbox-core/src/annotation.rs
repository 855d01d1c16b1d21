//! Bounding-box annotation types and batch validation.
//!
//! The annotation set for one assessment is replaced atomically on every
//! save; there is no partial update and no history of prior states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Sentinel bucket for annotations whose category is NULL or empty in
/// category aggregation.
pub const UNCATEGORIZED: &str = "Uncategorized";

// ─── Stored annotation ───────────────────────────────────────────────────────

/// One stored bounding box plus its clinical labels and audit stamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
  pub annotation_id:    Uuid,
  pub assessment_id:    i64,
  pub category:         String,
  pub location_label:   String,
  pub body_map_id:      String,
  pub x:                i64,
  pub y:                i64,
  pub width:            i64,
  pub height:           i64,
  pub created_by:       String,
  pub created_at:       DateTime<Utc>,
  pub last_modified_by: String,
  pub last_modified_at: DateTime<Utc>,
  /// Always a string — empty rather than NULL, to keep downstream consumers
  /// simple.
  pub doctor_notes:     String,
  pub severity:         String,
}

/// The wire shape of an annotation read: `{"boxes": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationSet {
  pub boxes: Vec<Annotation>,
}

/// One row of the category aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub category: String,
  pub count:    i64,
}

// ─── Save input ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::WoundStore::save_annotations`].
///
/// `created_by`/`created_at` are preserved when supplied (a re-save of an
/// existing box keeps its original authorship) and default to the acting
/// user and now otherwise. `last_modified_by`/`last_modified_at` are always
/// stamped by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnotation {
  pub category:       String,
  pub location_label: String,
  #[serde(default)]
  pub body_map_id:    String,
  pub x:              i64,
  pub y:              i64,
  pub width:          i64,
  pub height:         i64,
  pub created_by:     Option<String>,
  pub created_at:     Option<DateTime<Utc>>,
  pub doctor_notes:   Option<String>,
  pub severity:       Option<String>,
}

impl NewAnnotation {
  /// Check the per-box invariants: positive dimensions, non-empty category
  /// and location label.
  pub fn validate(&self) -> Result<()> {
    if self.category.is_empty() {
      return Err(Error::InvalidAnnotation("category is required".into()));
    }
    if self.location_label.is_empty() {
      return Err(Error::InvalidAnnotation("location is required".into()));
    }
    if self.width <= 0 || self.height <= 0 {
      return Err(Error::InvalidAnnotation(format!(
        "invalid box dimensions {}x{}",
        self.width, self.height
      )));
    }
    Ok(())
  }

  /// Build the stored record, applying audit stamps and defaults.
  /// `now` is passed in so one save stamps every box identically.
  pub fn into_record(
    self,
    assessment_id: i64,
    acting_user: &str,
    now: DateTime<Utc>,
  ) -> Annotation {
    Annotation {
      annotation_id:    Uuid::new_v4(),
      assessment_id,
      category:         self.category,
      location_label:   self.location_label,
      body_map_id:      self.body_map_id,
      x:                self.x,
      y:                self.y,
      width:            self.width,
      height:           self.height,
      created_by:       self.created_by.unwrap_or_else(|| acting_user.to_owned()),
      created_at:       self.created_at.unwrap_or(now),
      last_modified_by: acting_user.to_owned(),
      last_modified_at: now,
      doctor_notes:     self.doctor_notes.unwrap_or_default(),
      severity:         self.severity.unwrap_or_default(),
    }
  }
}

/// Validate an entire batch before any row is touched. The whole save is
/// rejected if any single box is invalid.
pub fn validate_batch(batch: &[NewAnnotation]) -> Result<()> {
  for ann in batch {
    ann.validate()?;
  }
  Ok(())
}
