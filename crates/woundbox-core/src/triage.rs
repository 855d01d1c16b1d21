//! Triage queues — the "review" and "omit" sets of assessment ids.
//!
//! Queue membership per assessment is binary (absent/present); adding an
//! already-present id and removing an absent one are both no-op successes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::Error;

/// The two triage queues. An assessment may sit in both at once; clearing
/// one never touches the other.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriageQueue {
  Review,
  Omit,
}

/// A wire status-update action, parsed from the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StatusAction {
  Omitted,
  ClearOmit,
  ExpertReview,
  ClearReview,
}

impl StatusAction {
  /// Parse the raw wire string.
  pub fn parse(s: &str) -> Result<Self, Error> {
    Self::from_str(s).map_err(|_| Error::UnknownStatusAction(s.to_owned()))
  }

  /// The queue this action operates on.
  pub fn queue(self) -> TriageQueue {
    match self {
      Self::Omitted | Self::ClearOmit => TriageQueue::Omit,
      Self::ExpertReview | Self::ClearReview => TriageQueue::Review,
    }
  }

  /// `true` for the enqueue actions, `false` for the clears.
  pub fn is_add(self) -> bool {
    matches!(self, Self::Omitted | Self::ExpertReview)
  }
}

/// One queue membership record, tagged with who requested it and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageEntry {
  pub assessment_id: i64,
  pub queue:         TriageQueue,
  pub requested_by:  String,
  pub requested_at:  DateTime<Utc>,
}
