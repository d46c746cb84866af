//! Error type for `eduvance-store-supabase`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} → {status}: {body}")]
  Status {
    method: &'static str,
    path:   String,
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("table `{0}` does not exist; create it from the Supabase SQL editor")]
  MissingTable(&'static str),

  #[error("{0} is not available over the Supabase REST API")]
  Unsupported(&'static str),

  #[error("unexpected response from {0}: no rows returned")]
  EmptyResponse(String),

  /// The insert went through but the read-back found nothing.
  #[error("exam session {0} missing after insert")]
  ExamSessionVanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
