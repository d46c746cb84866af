//! The upsert driver: resolve exam sessions, then batch-upsert papers.
//!
//! Backend-agnostic; everything goes through [`PaperStore`]. A failed batch
//! aborts the remaining ones, and batches already written stay written.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{
  Error, Result,
  aggregate::Aggregation,
  paper::NewPaper,
  session::ExamSessionKey,
  store::PaperStore,
};

/// Rows per upsert statement.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// What one [`ingest`] call wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
  pub sessions_resolved: usize,
  pub papers_prepared:   usize,
  pub batches:           usize,
  /// Rows the backend reported as written, summed over batches.
  pub rows_written:      u64,
}

/// Persist an aggregation.
///
/// Does nothing (and touches no exam sessions) when there are no papers.
pub async fn ingest<S: PaperStore>(
  store: &S,
  aggregation: &Aggregation,
  batch_size: usize,
) -> Result<IngestReport> {
  if batch_size == 0 {
    return Err(Error::InvalidBatchSize);
  }
  if aggregation.papers.is_empty() {
    tracing::info!("no papers to write");
    return Ok(IngestReport::default());
  }

  let session_ids = resolve_sessions(store, aggregation).await?;

  let rows = aggregation
    .papers
    .iter()
    .map(|paper| {
      let exam_session_id = session_ids
        .get(&paper.key.session)
        .copied()
        .ok_or_else(|| Error::UnresolvedExamSession(paper.key.session.clone()))?;
      Ok(NewPaper {
        subject_id: paper.key.subject_id,
        exam_session_id,
        unit_code: paper.key.unit_code.clone(),
        links: paper.links.clone(),
      })
    })
    .collect::<Result<Vec<_>>>()?;

  let total = rows.len().div_ceil(batch_size);
  tracing::info!(papers = rows.len(), batch_size, batches = total, "upserting papers");

  let mut rows_written = 0;
  for (index, batch) in rows.chunks(batch_size).enumerate() {
    let number = index + 1;
    tracing::info!("processing batch {number}/{total} ({} records)", batch.len());
    let written = store
      .upsert_papers(batch)
      .await
      .map_err(|e| Error::BatchFailed { batch: number, total, source: Box::new(e) })?;
    tracing::info!("batch {number}/{total} completed: {written} rows written");
    rows_written += written;
  }

  Ok(IngestReport {
    sessions_resolved: session_ids.len(),
    papers_prepared: rows.len(),
    batches: total,
    rows_written,
  })
}

async fn resolve_sessions<S: PaperStore>(
  store: &S,
  aggregation: &Aggregation,
) -> Result<BTreeMap<ExamSessionKey, Uuid>> {
  let mut ids = BTreeMap::new();
  for key in &aggregation.sessions {
    let session = store.resolve_exam_session(key).await.map_err(Error::store)?;
    tracing::debug!(session = %key, id = %session.id, "exam session resolved");
    ids.insert(key.clone(), session.id);
  }
  tracing::info!(sessions = ids.len(), "exam sessions ensured");
  Ok(ids)
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use super::*;
  use crate::{
    aggregate::PaperAggregator,
    session::ExamSession,
    source::SourceFile,
    subject::{NewSubject, Subject, SyllabusType},
  };

  #[derive(Debug, thiserror::Error)]
  #[error("fake store failure")]
  struct FakeError;

  /// An in-memory store with upsert semantics matching the SQL backends.
  #[derive(Default)]
  struct MemoryStore {
    state:         Mutex<MemoryState>,
    fail_on_batch: Option<usize>,
  }

  #[derive(Default)]
  struct MemoryState {
    sessions: Vec<ExamSession>,
    papers:   HashMap<(Uuid, Uuid, String), NewPaper>,
    batches:  Vec<usize>,
  }

  impl PaperStore for MemoryStore {
    type Error = FakeError;

    async fn init_schema(&self) -> Result<(), FakeError> { Ok(()) }

    async fn prepare_schema(&self) -> Result<(), FakeError> { Ok(()) }

    async fn list_subjects(&self) -> Result<Vec<Subject>, FakeError> { Ok(Vec::new()) }

    async fn add_subject(&self, _: NewSubject) -> Result<Subject, FakeError> { Err(FakeError) }

    async fn resolve_exam_session(&self, key: &ExamSessionKey) -> Result<ExamSession, FakeError> {
      let mut state = self.state.lock().unwrap();
      if let Some(found) = state.sessions.iter().find(|s| s.key() == *key) {
        return Ok(found.clone());
      }
      let session = ExamSession { id: Uuid::new_v4(), session: key.session.clone(), year: key.year };
      state.sessions.push(session.clone());
      Ok(session)
    }

    async fn upsert_papers(&self, batch: &[NewPaper]) -> Result<u64, FakeError> {
      let mut state = self.state.lock().unwrap();
      state.batches.push(batch.len());
      if self.fail_on_batch == Some(state.batches.len()) {
        return Err(FakeError);
      }
      let mut written = 0;
      for paper in batch {
        let key = (paper.subject_id, paper.exam_session_id, paper.unit_code.clone());
        if state.papers.get(&key) != Some(paper) {
          state.papers.insert(key, paper.clone());
          written += 1;
        }
      }
      Ok(written)
    }

    async fn close(&self) {}
  }

  fn physics() -> Subject {
    Subject {
      id: Uuid::new_v4(),
      name: "Physics".into(),
      code: None,
      syllabus_type: SyllabusType::Ial,
      units: serde_json::Value::Null,
    }
  }

  /// `units` IAL papers spread over two sessions.
  fn aggregation(subject: &Subject, units: usize) -> Aggregation {
    let items = |link: &str| {
      (0..units)
        .map(|n| serde_json::json!({"Name": format!("Question Paper (WPH{n:02})"), "Link": link}))
        .collect::<Vec<_>>()
    };
    let file = |name: &str, link: &str| {
      let body = serde_json::Value::Array(items(link)).to_string();
      SourceFile::from_contents(name, &body).unwrap()
    };
    let jan = file("Jan-2021.json", "http://x/jan");
    let oct = file("Oct-2021.json", "http://x/oct");
    PaperAggregator::new()
      .fold_file(subject, &jan)
      .fold_file(subject, &oct)
      .finish()
  }

  #[tokio::test]
  async fn splits_into_batches() {
    let store = MemoryStore::default();
    let subject = physics();
    let agg = aggregation(&subject, 5);

    let report = ingest(&store, &agg, 4).await.unwrap();

    assert_eq!(report.sessions_resolved, 2);
    assert_eq!(report.papers_prepared, 10);
    assert_eq!(report.batches, 3);
    assert_eq!(report.rows_written, 10);
    assert_eq!(store.state.lock().unwrap().batches, [4, 4, 2]);
  }

  #[tokio::test]
  async fn second_run_writes_nothing() {
    let store = MemoryStore::default();
    let subject = physics();
    let agg = aggregation(&subject, 3);

    ingest(&store, &agg, DEFAULT_BATCH_SIZE).await.unwrap();
    let again = ingest(&store, &agg, DEFAULT_BATCH_SIZE).await.unwrap();

    assert_eq!(again.rows_written, 0);
    let state = store.state.lock().unwrap();
    assert_eq!(state.sessions.len(), 2);
    assert_eq!(state.papers.len(), 6);
  }

  #[tokio::test]
  async fn failed_batch_aborts_the_rest() {
    let store = MemoryStore { fail_on_batch: Some(2), ..Default::default() };
    let subject = physics();
    let agg = aggregation(&subject, 5);

    let err = ingest(&store, &agg, 3).await.unwrap_err();

    assert!(matches!(err, Error::BatchFailed { batch: 2, total: 4, .. }), "{err}");
    let state = store.state.lock().unwrap();
    assert_eq!(state.batches.len(), 2);
    // The first batch stays committed.
    assert_eq!(state.papers.len(), 3);
  }

  #[tokio::test]
  async fn empty_aggregation_touches_nothing() {
    let store = MemoryStore::default();
    let report = ingest(&store, &Aggregation::default(), DEFAULT_BATCH_SIZE).await.unwrap();
    assert_eq!(report, IngestReport::default());
    assert!(store.state.lock().unwrap().sessions.is_empty());
  }

  #[tokio::test]
  async fn zero_batch_size_is_rejected() {
    let store = MemoryStore::default();
    let subject = physics();
    let err = ingest(&store, &aggregation(&subject, 1), 0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidBatchSize));
  }
}
