//! The `PaperStore` trait: the dimension/fact store seam.
//!
//! Implemented by the backend crates (`eduvance-store-sqlite`,
//! `eduvance-store-mysql`, `eduvance-store-supabase`). Parsing, classification
//! and aggregation never see a backend; only [`crate::ingest`] and the
//! operator binary talk to this trait.

use std::future::Future;

use crate::{
  paper::NewPaper,
  session::{ExamSession, ExamSessionKey},
  subject::{NewSubject, Subject},
};

/// Abstraction over a relational backend holding `subjects`,
/// `exam_sessions` and `papers`.
///
/// Calls are issued strictly one after another by a single operator run;
/// implementations need no internal coordination beyond being `Send + Sync`.
pub trait PaperStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Create `subjects`, `exam_sessions` and `papers` with their unique
  /// constraints if they do not exist.
  fn init_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Ensure `papers` and its `(subject_id, exam_session_id, unit_code)`
  /// unique index exist. Run once per ingestion; "already exists" is not an
  /// error, anything else is.
  fn prepare_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// All subjects, in store order. Rows with an unknown syllabus type are
  /// left out.
  fn list_subjects(&self) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Insert a subject with an empty unit list.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  // ── Exam sessions ─────────────────────────────────────────────────────

  /// Look up the session by exact `(session, year)`; insert it if absent and
  /// read it back to obtain the generated id.
  ///
  /// Not transactional: two concurrent runs may both miss on the read.
  fn resolve_exam_session<'a>(
    &'a self,
    key: &'a ExamSessionKey,
  ) -> impl Future<Output = Result<ExamSession, Self::Error>> + Send + 'a;

  // ── Papers ────────────────────────────────────────────────────────────

  /// Upsert one batch in a single statement.
  ///
  /// On `(subject_id, exam_session_id, unit_code)` conflict only the link
  /// columns are written. Returns the number of rows the backend reports as
  /// written.
  fn upsert_papers<'a>(
    &'a self,
    batch: &'a [NewPaper],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Release connections. The store must not be used afterwards.
  fn close(&self) -> impl Future<Output = ()> + Send + '_;
}
