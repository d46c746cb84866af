//! Error type for `eduvance-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("invalid {column} value: {value:?}")]
  Decode { column: &'static str, value: String },

  /// The insert went through but the read-back found nothing.
  #[error("exam session {0} missing after insert")]
  ExamSessionVanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
