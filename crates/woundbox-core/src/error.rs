//! Error types for `woundbox-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("username already taken: {0:?}")]
  UsernameTaken(String),

  #[error("invalid annotation: {0}")]
  InvalidAnnotation(String),

  #[error("unknown status action: {0:?}")]
  UnknownStatusAction(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
