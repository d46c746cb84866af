//! Error type for `eduvance-store-mysql`.

use thiserror::Error;

/// `ER_DUP_KEYNAME`: an index with that name already exists.
pub const ER_DUP_KEYNAME: u16 = 1061;
/// `ER_DUP_ENTRY`: unique key violation.
pub const ER_DUP_ENTRY: u16 = 1062;
/// `ER_PARSE_ERROR`: e.g. `CREATE INDEX IF NOT EXISTS` before MySQL 8.0.
pub const ER_PARSE_ERROR: u16 = 1064;

#[derive(Debug, Error)]
pub enum Error {
  #[error("mysql error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("invalid {column} value: {value:?}")]
  Decode { column: &'static str, value: String },

  #[error("invalid database name {0:?}")]
  InvalidDatabaseName(String),

  /// The insert went through but the read-back found nothing.
  #[error("exam session {0} missing after insert")]
  ExamSessionVanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The server error number carried by `err`, if it came from MySQL.
pub fn error_number(err: &sqlx::Error) -> Option<u16> {
  match err {
    sqlx::Error::Database(db) => db
      .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
      .map(|e| e.number()),
    _ => None,
  }
}

/// How a failed `CREATE UNIQUE INDEX` should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFailure {
  /// The index is already there.
  AlreadyExists,
  /// The server does not understand `IF NOT EXISTS`; retry without it.
  RetryWithoutGuard,
  Fatal,
}

impl IndexFailure {
  pub fn classify(number: Option<u16>) -> Self {
    match number {
      Some(ER_DUP_KEYNAME) => IndexFailure::AlreadyExists,
      Some(ER_PARSE_ERROR) => IndexFailure::RetryWithoutGuard,
      _ => IndexFailure::Fatal,
    }
  }
}
