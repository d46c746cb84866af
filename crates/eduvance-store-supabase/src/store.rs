//! [`SupabaseStore`]: the PostgREST implementation of [`PaperStore`].

use std::{collections::BTreeMap, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use eduvance_core::{
  material::MaterialType,
  paper::NewPaper,
  session::{ExamSession, ExamSessionKey, Session},
  store::PaperStore,
  subject::{NewSubject, Subject, SyllabusType},
};

use crate::{Error, Result};

/// Project URL and service-role key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
  pub url:              String,
  pub service_role_key: String,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SupabaseStore {
  client: Client,
  config: SupabaseConfig,
}

#[derive(Deserialize)]
struct RawSubject {
  id:            Uuid,
  name:          String,
  code:          Option<String>,
  syllabus_type: String,
  #[serde(default)]
  units:         serde_json::Value,
}

#[derive(Deserialize)]
struct RawExamSession {
  id:      Uuid,
  session: String,
  year:    u16,
}

impl RawExamSession {
  fn into_exam_session(self) -> ExamSession {
    ExamSession { id: self.id, session: Session::from(self.session), year: self.year }
  }
}

impl SupabaseStore {
  pub fn new(config: SupabaseConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req
      .header("apikey", &self.config.service_role_key)
      .bearer_auth(&self.config.service_role_key)
  }

  fn get(&self, table: &str) -> RequestBuilder { self.auth(self.client.get(self.url(table))) }

  fn post(&self, table: &str) -> RequestBuilder { self.auth(self.client.post(self.url(table))) }

  async fn find_exam_session(&self, key: &ExamSessionKey) -> Result<Option<ExamSession>> {
    let resp = self
      .get("exam_sessions")
      .query(&[
        ("select", "id,session,year".to_owned()),
        ("session", format!("eq.{}", key.session)),
        ("year", format!("eq.{}", key.year)),
        ("limit", "1".to_owned()),
      ])
      .send()
      .await?;
    let rows: Vec<RawExamSession> = success("GET", "exam_sessions", resp).await?.json().await?;
    Ok(rows.into_iter().next().map(RawExamSession::into_exam_session))
  }
}

// ─── Paper upsert bodies ─────────────────────────────────────────────────────

const PAPER_KEY_COLUMNS: [&str; 3] = ["subject_id", "exam_session_id", "unit_code"];

/// Papers grouped by the set of link columns they carry, in a stable order.
fn group_by_links(batch: &[NewPaper]) -> BTreeMap<Vec<MaterialType>, Vec<&NewPaper>> {
  let mut groups: BTreeMap<Vec<MaterialType>, Vec<&NewPaper>> = BTreeMap::new();
  for paper in batch {
    let present = MaterialType::ALL
      .into_iter()
      .filter(|m| paper.links.get(*m).is_some())
      .collect();
    groups.entry(present).or_default().push(paper);
  }
  groups
}

/// The `columns=` value for one group: the conflict key plus its links.
fn upsert_columns(present: &[MaterialType]) -> String {
  PAPER_KEY_COLUMNS
    .into_iter()
    .chain(present.iter().map(|m| m.column()))
    .collect::<Vec<_>>()
    .join(",")
}

fn upsert_row(paper: &NewPaper, present: &[MaterialType]) -> serde_json::Value {
  let mut row = serde_json::Map::new();
  row.insert("subject_id".into(), paper.subject_id.to_string().into());
  row.insert("exam_session_id".into(), paper.exam_session_id.to_string().into());
  row.insert("unit_code".into(), paper.unit_code.clone().into());
  for material in present {
    if let Some(link) = paper.links.get(*material) {
      row.insert(material.column().into(), link.into());
    }
  }
  serde_json::Value::Object(row)
}

/// Pass 2xx responses through; turn anything else into [`Error::Status`].
async fn success(method: &'static str, path: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { method, path: path.to_owned(), status, body })
}

impl PaperStore for SupabaseStore {
  type Error = Error;

  async fn init_schema(&self) -> Result<()> { Err(Error::Unsupported("schema creation")) }

  /// PostgREST cannot create tables or indexes, so this only checks that
  /// `papers` is reachable.
  async fn prepare_schema(&self) -> Result<()> {
    let resp = self.get("papers").query(&[("select", "id"), ("limit", "1")]).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Err(Error::MissingTable("papers"));
    }
    success("GET", "papers", resp).await?;
    tracing::debug!("papers table reachable; its unique index is assumed to exist");
    Ok(())
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let resp = self
      .get("subjects")
      .query(&[("select", "id,name,code,syllabus_type,units"), ("order", "name.asc")])
      .send()
      .await?;
    let rows: Vec<RawSubject> = success("GET", "subjects", resp).await?.json().await?;

    Ok(
      rows
        .into_iter()
        .filter_map(|raw| {
          let Ok(syllabus_type) = raw.syllabus_type.parse::<SyllabusType>() else {
            tracing::warn!(
              subject = %raw.name,
              syllabus_type = %raw.syllabus_type,
              "ignoring subject with unknown syllabus type"
            );
            return None;
          };
          let units = match raw.units {
            serde_json::Value::Null => serde_json::Value::Array(Vec::new()),
            units => units,
          };
          Some(Subject { id: raw.id, name: raw.name, code: raw.code, syllabus_type, units })
        })
        .collect(),
    )
  }

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let body = serde_json::json!({
      "name": input.name,
      "code": input.code,
      "syllabus_type": input.syllabus_type,
      "units": [],
    });
    let resp = self
      .post("subjects")
      .header("Prefer", "return=representation")
      .json(&body)
      .send()
      .await?;
    let rows: Vec<RawSubject> = success("POST", "subjects", resp).await?.json().await?;
    let raw = rows
      .into_iter()
      .next()
      .ok_or_else(|| Error::EmptyResponse("POST subjects".into()))?;

    Ok(Subject {
      id:            raw.id,
      name:          raw.name,
      code:          raw.code,
      syllabus_type: input.syllabus_type,
      units:         raw.units,
    })
  }

  async fn resolve_exam_session(&self, key: &ExamSessionKey) -> Result<ExamSession> {
    if let Some(found) = self.find_exam_session(key).await? {
      return Ok(found);
    }

    let resp = self
      .post("exam_sessions")
      .query(&[("on_conflict", "session,year"), ("select", "id,session,year")])
      .header("Prefer", "resolution=ignore-duplicates,return=representation")
      .json(&serde_json::json!({ "session": key.session, "year": key.year }))
      .send()
      .await?;
    let inserted: Vec<RawExamSession> =
      success("POST", "exam_sessions", resp).await?.json().await?;
    if let Some(raw) = inserted.into_iter().next() {
      tracing::info!(session = %key, "created exam session");
      return Ok(raw.into_exam_session());
    }
    tracing::debug!(session = %key, "exam session created concurrently; re-reading");

    self
      .find_exam_session(key)
      .await?
      .ok_or_else(|| Error::ExamSessionVanished(key.to_string()))
  }

  /// `merge-duplicates` writes every column it is given, so the batch is
  /// split by which links are present and each group names only those
  /// columns. A stored link is never replaced by null. Returns the number of
  /// rows echoed back over all groups.
  async fn upsert_papers(&self, batch: &[NewPaper]) -> Result<u64> {
    let mut written = 0;
    for (present, papers) in group_by_links(batch) {
      let columns = upsert_columns(&present);
      let body: Vec<serde_json::Value> =
        papers.iter().map(|paper| upsert_row(paper, &present)).collect();
      let resp = self
        .post("papers")
        .query(&[
          ("on_conflict", "subject_id,exam_session_id,unit_code"),
          ("columns", columns.as_str()),
          ("select", "unit_code"),
        ])
        .header("Prefer", "resolution=merge-duplicates,return=representation")
        .json(&body)
        .send()
        .await?;
      let rows: Vec<serde_json::Value> = success("POST", "papers", resp).await?.json().await?;
      written += rows.len() as u64;
    }
    Ok(written)
  }

  async fn close(&self) {}
}
