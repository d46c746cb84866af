//! [`MysqlStore`]: the MySQL implementation of [`PaperStore`].

use sqlx::{
  ConnectOptions as _, Connection as _,
  mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions},
};
use uuid::Uuid;

use eduvance_core::{
  paper::NewPaper,
  session::{ExamSession, ExamSessionKey, Session},
  store::PaperStore,
  subject::{NewSubject, Subject, SyllabusType},
};

use crate::{
  Error, MysqlConfig, Result,
  error::{ER_DUP_ENTRY, IndexFailure, error_number},
  schema,
};

type SubjectRow = (String, String, Option<String>, String, Option<String>);
type ExamSessionRow = (String, String, i32);

/// A paper store on a MySQL server.
///
/// Holds a pool capped at one connection; the ingestion run is strictly
/// sequential.
pub struct MysqlStore {
  pool: MySqlPool,
}

impl MysqlStore {
  /// Connect to the server, create `config.database` if needed, then open
  /// the pool against it.
  pub async fn connect(config: &MysqlConfig) -> Result<Self> {
    let mut options = MySqlConnectOptions::new()
      .host(&config.host)
      .port(config.port)
      .username(&config.user);
    if let Some(password) = &config.password {
      options = options.password(password);
    }

    let create = schema::create_database(&config.database)?;
    let mut conn = options.connect().await?;
    sqlx::raw_sql(&create).execute(&mut conn).await?;
    conn.close().await?;
    tracing::info!(target_db = %config.display_target(), "connected to mysql");

    let pool = MySqlPoolOptions::new()
      .max_connections(1)
      .connect_with(options.database(&config.database))
      .await?;
    Ok(Self { pool })
  }

  async fn find_exam_session(&self, key: &ExamSessionKey) -> Result<Option<ExamSession>> {
    let row: Option<ExamSessionRow> = sqlx::query_as(schema::SELECT_EXAM_SESSION)
      .bind(key.session.as_str())
      .bind(i32::from(key.year))
      .fetch_optional(&self.pool)
      .await?;
    row.map(decode_exam_session).transpose()
  }

  async fn ensure_papers_index(&self) -> Result<()> {
    let Err(e) = sqlx::raw_sql(schema::CREATE_PAPERS_INDEX_GUARDED).execute(&self.pool).await else {
      return Ok(());
    };
    match IndexFailure::classify(error_number(&e)) {
      IndexFailure::AlreadyExists => Ok(()),
      IndexFailure::Fatal => Err(e.into()),
      IndexFailure::RetryWithoutGuard => {
        tracing::debug!("server rejects CREATE INDEX IF NOT EXISTS; retrying without it");
        match sqlx::raw_sql(schema::CREATE_PAPERS_INDEX).execute(&self.pool).await {
          Ok(_) => Ok(()),
          Err(e) if IndexFailure::classify(error_number(&e)) == IndexFailure::AlreadyExists => {
            Ok(())
          }
          Err(e) => Err(e.into()),
        }
      }
    }
  }
}

impl PaperStore for MysqlStore {
  type Error = Error;

  async fn init_schema(&self) -> Result<()> {
    for ddl in [schema::CREATE_SUBJECTS, schema::CREATE_EXAM_SESSIONS, schema::CREATE_PAPERS] {
      sqlx::raw_sql(ddl).execute(&self.pool).await?;
    }
    self.ensure_papers_index().await
  }

  async fn prepare_schema(&self) -> Result<()> {
    sqlx::raw_sql(schema::CREATE_EXAM_SESSIONS).execute(&self.pool).await?;
    sqlx::raw_sql(schema::CREATE_PAPERS).execute(&self.pool).await?;
    self.ensure_papers_index().await?;
    tracing::debug!("papers table and unique index ensured");
    Ok(())
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let rows: Vec<SubjectRow> =
      sqlx::query_as(schema::SELECT_SUBJECTS).fetch_all(&self.pool).await?;

    let mut subjects = Vec::with_capacity(rows.len());
    for (id, name, code, syllabus_type, units) in rows {
      let Ok(syllabus_type) = syllabus_type.parse::<SyllabusType>() else {
        tracing::warn!(
          subject = %name,
          syllabus_type = %syllabus_type,
          "ignoring subject with unknown syllabus type"
        );
        continue;
      };
      let units = match units {
        Some(json) => serde_json::from_str(&json)?,
        None => serde_json::Value::Array(Vec::new()),
      };
      subjects.push(Subject { id: Uuid::parse_str(&id)?, name, code, syllabus_type, units });
    }
    Ok(subjects)
  }

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let id = Uuid::new_v4();
    sqlx::query(
      "INSERT INTO subjects (id, name, code, syllabus_type, units) VALUES (?, ?, ?, ?, JSON_ARRAY())",
    )
    .bind(id.to_string())
    .bind(&input.name)
    .bind(&input.code)
    .bind(input.syllabus_type.as_str())
    .execute(&self.pool)
    .await?;

    Ok(Subject {
      id,
      name: input.name,
      code: input.code,
      syllabus_type: input.syllabus_type,
      units: serde_json::Value::Array(Vec::new()),
    })
  }

  async fn resolve_exam_session(&self, key: &ExamSessionKey) -> Result<ExamSession> {
    if let Some(found) = self.find_exam_session(key).await? {
      return Ok(found);
    }

    let inserted = sqlx::query(schema::INSERT_EXAM_SESSION)
      .bind(key.session.as_str())
      .bind(i32::from(key.year))
      .execute(&self.pool)
      .await;
    match inserted {
      Ok(_) => tracing::info!(session = %key, "created exam session"),
      Err(e) if error_number(&e) == Some(ER_DUP_ENTRY) => {
        tracing::debug!(session = %key, "exam session created concurrently; re-reading");
      }
      Err(e) => return Err(e.into()),
    }

    self
      .find_exam_session(key)
      .await?
      .ok_or_else(|| Error::ExamSessionVanished(key.to_string()))
  }

  /// Returns MySQL's affected-row count: an insert counts once, a changed
  /// duplicate twice.
  async fn upsert_papers(&self, batch: &[NewPaper]) -> Result<u64> {
    if batch.is_empty() {
      return Ok(0);
    }
    let result = schema::upsert_papers(batch).build().execute(&self.pool).await?;
    Ok(result.rows_affected())
  }

  async fn close(&self) { self.pool.close().await; }
}

fn decode_exam_session((id, session, year): ExamSessionRow) -> Result<ExamSession> {
  let year = u16::try_from(year)
    .map_err(|_| Error::Decode { column: "year", value: year.to_string() })?;
  Ok(ExamSession { id: Uuid::parse_str(&id)?, session: Session::from(session), year })
}
