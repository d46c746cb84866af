//! Error types for `eduvance-core`.
//!
//! Only conditions that abort a run live here. Input-shape problems (bad
//! filenames, unknown material types, …) are [`crate::skip::Skip`] values.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::ExamSessionKey;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("paper batch {batch}/{total} failed: {source}")]
  BatchFailed {
    batch:  usize,
    total:  usize,
    #[source]
    source: BoxError,
  },

  #[error("no exam session id resolved for {0}")]
  UnresolvedExamSession(ExamSessionKey),

  #[error("batch size must be at least 1")]
  InvalidBatchSize,

  #[error("unknown syllabus type: {0:?}")]
  UnknownSyllabusType(String),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
