//! Error type for `woundbox-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] woundbox_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("column decode error: {0}")]
  Decode(String),
}

impl Error {
  /// Whether this failure is an invalid-input class error (HTTP 400)
  /// rather than a backend fault (HTTP 500).
  pub fn is_invalid_argument(&self) -> bool {
    matches!(
      self,
      Error::Core(
        woundbox_core::Error::InvalidAnnotation(_)
          | woundbox_core::Error::UnknownStatusAction(_)
          | woundbox_core::Error::UnknownRole(_)
          | woundbox_core::Error::UsernameTaken(_)
      )
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
