//! User identity and role types.
//!
//! Users are never hard-deleted; deactivation (`is_active = false`) excludes
//! an account from authentication while keeping its audit trail intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The fixed set of roles. `Admin` additionally manages accounts; both roles
/// may annotate and triage.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Annotator,
}

/// A stored user account. The `password_hash` is an argon2 PHC string and is
/// never serialised onto the wire.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub full_name:  String,
  pub email:      Option<String>,
  pub role:       Role,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
  pub last_login: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::WoundStore::create_user`]. The caller hashes the
/// password; the store assigns `user_id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
  pub full_name:     String,
  pub email:         Option<String>,
  pub role:          Role,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn role_round_trips_through_strings() {
    assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
    assert_eq!(Role::from_str("annotator").unwrap(), Role::Annotator);
    assert_eq!(Role::Admin.to_string(), "admin");
    assert!(Role::from_str("superuser").is_err());
  }
}
