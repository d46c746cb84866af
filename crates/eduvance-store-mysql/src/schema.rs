//! DDL and statement builders for the MySQL store.
//!
//! UUIDs are `CHAR(36)` filled by the server's `UUID()`; syllabus types are an
//! `ENUM`; subject units are `JSON`. Parenthesised column defaults need
//! MySQL 8.0.13 or later.

use eduvance_core::paper::NewPaper;
use sqlx::{MySql, QueryBuilder};

use crate::{Error, Result};

pub const CREATE_SUBJECTS: &str = "
CREATE TABLE IF NOT EXISTS subjects (
  id            CHAR(36) NOT NULL DEFAULT (UUID()),
  name          TEXT NOT NULL,
  code          TEXT,
  syllabus_type ENUM('IGCSE','IAL') NOT NULL,
  units         JSON DEFAULT (JSON_ARRAY()),
  PRIMARY KEY (id)
) ENGINE=InnoDB";

pub const CREATE_EXAM_SESSIONS: &str = "
CREATE TABLE IF NOT EXISTS exam_sessions (
  id      CHAR(36) NOT NULL DEFAULT (UUID()),
  session VARCHAR(50) NOT NULL,
  year    INT NOT NULL,
  PRIMARY KEY (id),
  UNIQUE KEY uq_exam_sessions (session, year)
) ENGINE=InnoDB";

pub const CREATE_PAPERS: &str = "
CREATE TABLE IF NOT EXISTS papers (
  id                   CHAR(36) NOT NULL DEFAULT (UUID()),
  subject_id           CHAR(36) NOT NULL,
  exam_session_id      CHAR(36) NOT NULL,
  unit_code            VARCHAR(100) NOT NULL,
  question_paper_link  TEXT,
  mark_scheme_link     TEXT,
  examiner_report_link TEXT,
  PRIMARY KEY (id),
  CONSTRAINT papers_subject_id_fkey FOREIGN KEY (subject_id) REFERENCES subjects(id)
    ON UPDATE CASCADE ON DELETE CASCADE,
  CONSTRAINT papers_exam_session_id_fkey FOREIGN KEY (exam_session_id) REFERENCES exam_sessions(id)
    ON UPDATE CASCADE ON DELETE CASCADE
) ENGINE=InnoDB";

/// MariaDB accepts this; MySQL answers with a parse error and gets
/// [`CREATE_PAPERS_INDEX`] instead.
pub const CREATE_PAPERS_INDEX_GUARDED: &str =
  "CREATE UNIQUE INDEX IF NOT EXISTS idx_papers_unique ON papers (subject_id, exam_session_id, unit_code)";

pub const CREATE_PAPERS_INDEX: &str =
  "CREATE UNIQUE INDEX idx_papers_unique ON papers (subject_id, exam_session_id, unit_code)";

pub const SELECT_SUBJECTS: &str = "
SELECT id, name, code, CAST(syllabus_type AS CHAR), CAST(units AS CHAR)
FROM subjects
ORDER BY name";

pub const SELECT_EXAM_SESSION: &str =
  "SELECT id, session, year FROM exam_sessions WHERE session = ? AND year = ? LIMIT 1";

pub const INSERT_EXAM_SESSION: &str =
  "INSERT INTO exam_sessions (id, session, year) VALUES (UUID(), ?, ?)";

/// `CREATE DATABASE IF NOT EXISTS` for a backtick-quoted name.
///
/// Identifiers cannot be bound, so the name is restricted to the characters
/// MySQL allows unquoted.
pub fn create_database(name: &str) -> Result<String> {
  let valid = !name.is_empty()
    && name.len() <= 64
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
  if !valid {
    return Err(Error::InvalidDatabaseName(name.to_owned()));
  }
  Ok(format!("CREATE DATABASE IF NOT EXISTS `{name}`"))
}

/// One multi-row `INSERT … ON DUPLICATE KEY UPDATE` for `batch`.
///
/// On conflict a link is only replaced when the incoming value is non-null.
pub fn upsert_papers(batch: &[NewPaper]) -> QueryBuilder<'static, MySql> {
  let mut qb = QueryBuilder::new(
    "INSERT INTO papers (id, subject_id, exam_session_id, unit_code, \
     question_paper_link, mark_scheme_link, examiner_report_link) ",
  );
  qb.push_values(batch, |mut b, paper| {
    b.push("UUID()")
      .push_bind(paper.subject_id.to_string())
      .push_bind(paper.exam_session_id.to_string())
      .push_bind(paper.unit_code.clone())
      .push_bind(paper.links.question_paper_link.clone())
      .push_bind(paper.links.mark_scheme_link.clone())
      .push_bind(paper.links.examiner_report_link.clone());
  });
  qb.push(
    " ON DUPLICATE KEY UPDATE \
     question_paper_link = COALESCE(VALUES(question_paper_link), question_paper_link), \
     mark_scheme_link = COALESCE(VALUES(mark_scheme_link), mark_scheme_link), \
     examiner_report_link = COALESCE(VALUES(examiner_report_link), examiner_report_link)",
  );
  qb
}

#[cfg(test)]
mod tests {
  use eduvance_core::paper::PaperLinks;
  use uuid::Uuid;

  use super::*;

  fn paper(unit: &str) -> NewPaper {
    NewPaper {
      subject_id:      Uuid::new_v4(),
      exam_session_id: Uuid::new_v4(),
      unit_code:       unit.into(),
      links:           PaperLinks {
        question_paper_link: Some(format!("http://x/{unit}.pdf")),
        ..Default::default()
      },
    }
  }

  #[test]
  fn upsert_has_one_tuple_per_paper() {
    let batch = [paper("WPH11"), paper("WPH12"), paper("WPH13")];
    let qb = upsert_papers(&batch);
    let sql = qb.sql();

    assert!(sql.starts_with("INSERT INTO papers (id, subject_id"));
    assert_eq!(sql.matches("(UUID(), ?, ?, ?, ?, ?, ?)").count(), 3);
    assert_eq!(sql.matches('?').count(), 18);
    assert!(sql.contains("ON DUPLICATE KEY UPDATE"));
    assert!(sql.contains("COALESCE(VALUES(mark_scheme_link), mark_scheme_link)"));
  }

  #[test]
  fn conflict_clause_never_touches_the_key_columns() {
    let qb = upsert_papers(&[paper("1PR")]);
    let (_, update) = qb.sql().split_once("ON DUPLICATE KEY UPDATE").unwrap();
    for column in ["id =", "subject_id =", "exam_session_id =", "unit_code ="] {
      assert!(!update.contains(column), "{column} in {update}");
    }
  }

  #[test]
  fn id_columns_use_expression_defaults() {
    for ddl in [CREATE_SUBJECTS, CREATE_EXAM_SESSIONS, CREATE_PAPERS] {
      assert!(ddl.contains("CHAR(36) NOT NULL DEFAULT (UUID())"), "{ddl}");
    }
    assert!(CREATE_SUBJECTS.contains("DEFAULT (JSON_ARRAY())"));
  }

  #[test]
  fn database_names_are_checked_before_quoting() {
    assert_eq!(
      create_database("eduvance_db").unwrap(),
      "CREATE DATABASE IF NOT EXISTS `eduvance_db`"
    );
    assert!(matches!(create_database("x`; DROP"), Err(Error::InvalidDatabaseName(_))));
    assert!(create_database("").is_err());
  }
}
