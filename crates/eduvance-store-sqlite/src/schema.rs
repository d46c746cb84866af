//! SQL schema for the Eduvance SQLite store.
//!
//! Mirrors the hosted schema: text UUID primary keys, a `(session, year)`
//! unique key on exam sessions and the `(subject_id, exam_session_id,
//! unit_code)` conflict key on papers.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    code          TEXT,
    syllabus_type TEXT NOT NULL CHECK (syllabus_type IN ('IAL', 'IGCSE')),
    units         TEXT NOT NULL DEFAULT '[]'   -- JSON
);

CREATE TABLE IF NOT EXISTS exam_sessions (
    id      TEXT PRIMARY KEY,
    session TEXT NOT NULL,
    year    INTEGER NOT NULL,
    UNIQUE (session, year)
);

PRAGMA user_version = 1;
";

/// The `papers` table and its conflict key; run before every ingestion.
pub const PAPERS: &str = "
CREATE TABLE IF NOT EXISTS papers (
    id                   TEXT PRIMARY KEY,
    subject_id           TEXT NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
    exam_session_id      TEXT NOT NULL REFERENCES exam_sessions(id) ON DELETE CASCADE,
    unit_code            TEXT NOT NULL,
    question_paper_link  TEXT,
    mark_scheme_link     TEXT,
    examiner_report_link TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_papers_unique
    ON papers (subject_id, exam_session_id, unit_code);
";

/// Multi-row upsert prefix; `VALUES` tuples are appended per batch.
pub const UPSERT_PAPERS_HEAD: &str = "INSERT INTO papers (
    id, subject_id, exam_session_id, unit_code,
    question_paper_link, mark_scheme_link, examiner_report_link
  ) VALUES ";

/// Conflict clause: links are only replaced by non-null values, and rows
/// whose links would not change are left untouched so `changes()` counts
/// real writes only.
pub const UPSERT_PAPERS_TAIL: &str = "
  ON CONFLICT (subject_id, exam_session_id, unit_code) DO UPDATE SET
    question_paper_link  = COALESCE(excluded.question_paper_link,  papers.question_paper_link),
    mark_scheme_link     = COALESCE(excluded.mark_scheme_link,     papers.mark_scheme_link),
    examiner_report_link = COALESCE(excluded.examiner_report_link, papers.examiner_report_link)
  WHERE COALESCE(excluded.question_paper_link,  papers.question_paper_link)  IS NOT papers.question_paper_link
     OR COALESCE(excluded.mark_scheme_link,     papers.mark_scheme_link)     IS NOT papers.mark_scheme_link
     OR COALESCE(excluded.examiner_report_link, papers.examiner_report_link) IS NOT papers.examiner_report_link";
