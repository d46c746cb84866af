//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings; subject units as
//! compact JSON.

use eduvance_core::{
  paper::{Paper, PaperLinks},
  session::{ExamSession, Session},
  subject::{Subject, SyllabusType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Year ────────────────────────────────────────────────────────────────────

pub fn decode_year(year: i64) -> Result<u16> {
  u16::try_from(year).map_err(|_| Error::Decode { column: "year", value: year.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub id:            String,
  pub name:          String,
  pub code:          Option<String>,
  pub syllabus_type: String,
  pub units:         String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "id, name, code, syllabus_type, units";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      name:          row.get(1)?,
      code:          row.get(2)?,
      syllabus_type: row.get(3)?,
      units:         row.get(4)?,
    })
  }

  /// `Ok(None)` for rows whose syllabus type this pipeline does not handle.
  pub fn into_subject(self) -> Result<Option<Subject>> {
    let Ok(syllabus_type) = self.syllabus_type.parse::<SyllabusType>() else {
      tracing::warn!(
        subject = %self.name,
        syllabus_type = %self.syllabus_type,
        "ignoring subject with unknown syllabus type"
      );
      return Ok(None);
    };
    Ok(Some(Subject {
      id: decode_uuid(&self.id)?,
      name: self.name,
      code: self.code,
      syllabus_type,
      units: serde_json::from_str(&self.units)?,
    }))
  }
}

/// Raw values read directly from an `exam_sessions` row.
pub struct RawExamSession {
  pub id:      String,
  pub session: String,
  pub year:    i64,
}

impl RawExamSession {
  pub fn into_exam_session(self) -> Result<ExamSession> {
    Ok(ExamSession {
      id:      decode_uuid(&self.id)?,
      session: Session::from(self.session),
      year:    decode_year(self.year)?,
    })
  }
}

/// Raw values read directly from a `papers` row.
pub struct RawPaper {
  pub id:                   String,
  pub subject_id:           String,
  pub exam_session_id:      String,
  pub unit_code:            String,
  pub question_paper_link:  Option<String>,
  pub mark_scheme_link:     Option<String>,
  pub examiner_report_link: Option<String>,
}

impl RawPaper {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      subject_id:           row.get(1)?,
      exam_session_id:      row.get(2)?,
      unit_code:            row.get(3)?,
      question_paper_link:  row.get(4)?,
      mark_scheme_link:     row.get(5)?,
      examiner_report_link: row.get(6)?,
    })
  }

  pub fn into_paper(self) -> Result<Paper> {
    Ok(Paper {
      id:              decode_uuid(&self.id)?,
      subject_id:      decode_uuid(&self.subject_id)?,
      exam_session_id: decode_uuid(&self.exam_session_id)?,
      unit_code:       self.unit_code,
      links:           PaperLinks {
        question_paper_link:  self.question_paper_link,
        mark_scheme_link:     self.mark_scheme_link,
        examiner_report_link: self.examiner_report_link,
      },
    })
  }
}
