//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enumerations are stored as their lowercase
//! wire names.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use woundbox_core::{
  annotation::Annotation,
  triage::{TriageEntry, TriageQueue},
  user::{Role, User},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "admin",
    Role::Annotator => "annotator",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "annotator" => Ok(Role::Annotator),
    other => Err(Error::Core(woundbox_core::Error::UnknownRole(
      other.to_owned(),
    ))),
  }
}

// ─── TriageQueue ──────────────────────────────────────────────────────────────

pub fn encode_queue(q: TriageQueue) -> &'static str {
  match q {
    TriageQueue::Review => "review",
    TriageQueue::Omit => "omit",
  }
}

pub fn decode_queue(s: &str) -> Result<TriageQueue> {
  match s {
    "review" => Ok(TriageQueue::Review),
    "omit" => Ok(TriageQueue::Omit),
    other => Err(Error::Decode(format!("unknown queue name: {other:?}"))),
  }
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `users` row as read from SQLite, before decoding.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub password_hash: String,
  pub full_name:     String,
  pub email:         Option<String>,
  pub role:          String,
  pub is_active:     bool,
  pub created_at:    String,
  pub last_login:    Option<String>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      password_hash: self.password_hash,
      full_name:     self.full_name,
      email:         self.email,
      role:          decode_role(&self.role)?,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
      last_login:    self.last_login.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// An `annotations` row as read from SQLite, before decoding.
pub struct RawAnnotation {
  pub annotation_id:    String,
  pub assessment_id:    i64,
  pub category:         Option<String>,
  pub location_label:   Option<String>,
  pub body_map_id:      String,
  pub x:                i64,
  pub y:                i64,
  pub width:            i64,
  pub height:           i64,
  pub created_by:       String,
  pub created_at:       String,
  pub last_modified_by: String,
  pub last_modified_at: String,
  pub doctor_notes:     Option<String>,
  pub severity:         Option<String>,
}

impl RawAnnotation {
  pub fn into_annotation(self) -> Result<Annotation> {
    Ok(Annotation {
      annotation_id:    decode_uuid(&self.annotation_id)?,
      assessment_id:    self.assessment_id,
      category:         self.category.unwrap_or_default(),
      location_label:   self.location_label.unwrap_or_default(),
      body_map_id:      self.body_map_id,
      x:                self.x,
      y:                self.y,
      width:            self.width,
      height:           self.height,
      created_by:       self.created_by,
      created_at:       decode_dt(&self.created_at)?,
      last_modified_by: self.last_modified_by,
      last_modified_at: decode_dt(&self.last_modified_at)?,
      // Legacy rows may hold NULL; normalise to empty strings on the way out.
      doctor_notes:     self.doctor_notes.unwrap_or_default(),
      severity:         self.severity.unwrap_or_default(),
    })
  }
}

/// A `triage_entries` row as read from SQLite, before decoding.
pub struct RawTriageEntry {
  pub assessment_id: i64,
  pub queue:         String,
  pub requested_by:  String,
  pub requested_at:  String,
}

impl RawTriageEntry {
  pub fn into_entry(self) -> Result<TriageEntry> {
    Ok(TriageEntry {
      assessment_id: self.assessment_id,
      queue:         decode_queue(&self.queue)?,
      requested_by:  self.requested_by,
      requested_at:  decode_dt(&self.requested_at)?,
    })
  }
}
