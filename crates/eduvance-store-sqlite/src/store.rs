//! [`SqliteStore`]: the SQLite implementation of [`PaperStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use eduvance_core::{
  paper::{NewPaper, Paper},
  session::{ExamSession, ExamSessionKey},
  store::PaperStore,
  subject::{NewSubject, Subject},
};

use crate::{
  Error, Result,
  encode::{RawExamSession, RawPaper, RawSubject, encode_uuid},
  schema::{PAPERS, SCHEMA, UPSERT_PAPERS_HEAD, UPSERT_PAPERS_TAIL},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A paper store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with the full schema in place.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Every paper of one subject, ordered by unit code then session id.
  pub async fn list_papers(&self, subject_id: Uuid) -> Result<Vec<Paper>> {
    let subject_str = encode_uuid(subject_id);
    let raws: Vec<RawPaper> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, subject_id, exam_session_id, unit_code,
                  question_paper_link, mark_scheme_link, examiner_report_link
           FROM papers
           WHERE subject_id = ?1
           ORDER BY unit_code, exam_session_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![subject_str], RawPaper::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPaper::into_paper).collect()
  }

  /// All exam sessions, oldest year first.
  pub async fn list_exam_sessions(&self) -> Result<Vec<ExamSession>> {
    let raws: Vec<RawExamSession> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, session, year FROM exam_sessions ORDER BY year, session")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawExamSession { id: row.get(0)?, session: row.get(1)?, year: row.get(2)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawExamSession::into_exam_session).collect()
  }

  async fn find_exam_session(&self, key: &ExamSessionKey) -> Result<Option<ExamSession>> {
    let session = key.session.as_str().to_owned();
    let year = i64::from(key.year);
    let raw: Option<RawExamSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, session, year FROM exam_sessions
               WHERE session = ?1 AND year = ?2",
              rusqlite::params![session, year],
              |row| {
                Ok(RawExamSession { id: row.get(0)?, session: row.get(1)?, year: row.get(2)? })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawExamSession::into_exam_session).transpose()
  }
}

// ─── PaperStore impl ─────────────────────────────────────────────────────────

impl PaperStore for SqliteStore {
  type Error = Error;

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(PAPERS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn prepare_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PAPERS)?;
        Ok(())
      })
      .await?;
    tracing::debug!("papers table and unique index ensured");
    Ok(())
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let sql = format!("SELECT {} FROM subjects ORDER BY rowid", RawSubject::COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut subjects = Vec::with_capacity(raws.len());
    for raw in raws {
      if let Some(subject) = raw.into_subject()? {
        subjects.push(subject);
      }
    }
    Ok(subjects)
  }

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      id:            Uuid::new_v4(),
      name:          input.name,
      code:          input.code,
      syllabus_type: input.syllabus_type,
      units:         serde_json::Value::Array(Vec::new()),
    };

    let id_str = encode_uuid(subject.id);
    let name = subject.name.clone();
    let code = subject.code.clone();
    let syllabus_type = subject.syllabus_type.as_str();
    let units = subject.units.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (id, name, code, syllabus_type, units)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, code, syllabus_type, units],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn resolve_exam_session(&self, key: &ExamSessionKey) -> Result<ExamSession> {
    if let Some(found) = self.find_exam_session(key).await? {
      return Ok(found);
    }

    let id_str = encode_uuid(Uuid::new_v4());
    let session = key.session.as_str().to_owned();
    let year = i64::from(key.year);
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO exam_sessions (id, session, year) VALUES (?1, ?2, ?3)
           ON CONFLICT (session, year) DO NOTHING",
          rusqlite::params![id_str, session, year],
        )?)
      })
      .await?;
    if inserted == 0 {
      tracing::debug!(session = %key, "exam session created concurrently; re-reading");
    } else {
      tracing::info!(session = %key, "created exam session");
    }

    self
      .find_exam_session(key)
      .await?
      .ok_or_else(|| Error::ExamSessionVanished(key.to_string()))
  }

  async fn upsert_papers(&self, batch: &[NewPaper]) -> Result<u64> {
    if batch.is_empty() {
      return Ok(0);
    }

    let mut sql = String::from(UPSERT_PAPERS_HEAD);
    let mut params: Vec<Option<String>> = Vec::with_capacity(batch.len() * 7);
    for (i, paper) in batch.iter().enumerate() {
      if i > 0 {
        sql.push_str(", ");
      }
      sql.push_str("(?, ?, ?, ?, ?, ?, ?)");
      params.extend([
        Some(encode_uuid(Uuid::new_v4())),
        Some(encode_uuid(paper.subject_id)),
        Some(encode_uuid(paper.exam_session_id)),
        Some(paper.unit_code.clone()),
        paper.links.question_paper_link.clone(),
        paper.links.mark_scheme_link.clone(),
        paper.links.examiner_report_link.clone(),
      ]);
    }
    sql.push_str(UPSERT_PAPERS_TAIL);

    let written = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await?;
    Ok(written as u64)
  }

  async fn close(&self) {
    if let Err(e) = self.conn.clone().close().await {
      tracing::warn!(error = %e, "closing sqlite connection failed");
    }
  }
}
