//! Exam sessions: filename parsing and session-label normalisation.
//!
//! Data-import files are named after the sitting they cover, e.g.
//! `Jan-2021.json`, `May-June-2019.json` or `Oct/Nov-2020.json`. The stem is
//! split into one or two month tokens plus a year, and the tokens collapse
//! onto one of three canonical session names.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static FILE_STEM_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^([A-Za-z]+)(?:[/-]([A-Za-z]+))?[-/]((?:19|20)\d{2})$")
    .expect("valid file stem regex")
});

// ─── Filename parser ─────────────────────────────────────────────────────────

/// The pieces of a well-formed data-import file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStem {
  pub part1: String,
  /// Second month token of a cross-month sitting (`"June"` in `May-June-2019`).
  pub part2: Option<String>,
  pub year:  u16,
}

impl FileStem {
  /// The raw session string fed to [`normalize_session`]: `part1` or
  /// `"part1/part2"`.
  pub fn raw_session(&self) -> String {
    match &self.part2 {
      Some(part2) => format!("{}/{}", self.part1, part2),
      None => self.part1.clone(),
    }
  }

  /// Normalised session plus year.
  pub fn session_key(&self) -> ExamSessionKey {
    ExamSessionKey { session: normalize_session(&self.raw_session()), year: self.year }
  }
}

/// Parse a file base name (extension already stripped).
///
/// Returns `None` for anything that does not look like
/// `Month[-Month]-YYYY` with a 19xx/20xx year.
pub fn parse_file_stem(stem: &str) -> Option<FileStem> {
  let caps = FILE_STEM_RE.captures(stem)?;
  let year = caps[3].parse().ok()?;
  Some(FileStem {
    part1: caps[1].to_owned(),
    part2: caps.get(2).map(|m| m.as_str().to_owned()),
    year,
  })
}

// ─── Session normaliser ──────────────────────────────────────────────────────

/// A sitting window. Unrecognised labels are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Session {
  January,
  MayJune,
  OctNov,
  Other(String),
}

impl Session {
  pub fn as_str(&self) -> &str {
    match self {
      Session::January => "January",
      Session::MayJune => "May/June",
      Session::OctNov => "Oct/Nov",
      Session::Other(label) => label,
    }
  }

  pub fn is_canonical(&self) -> bool { !matches!(self, Session::Other(_)) }
}

impl fmt::Display for Session {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl From<Session> for String {
  fn from(s: Session) -> Self { s.as_str().to_owned() }
}

/// Stored labels map back exactly; no fuzzy matching on the read side.
impl From<String> for Session {
  fn from(s: String) -> Self {
    match s.as_str() {
      "January" => Session::January,
      "May/June" => Session::MayJune,
      "Oct/Nov" => Session::OctNov,
      _ => Session::Other(s),
    }
  }
}

/// Collapse a raw month token (or `"tok1/tok2"`) onto a canonical session.
///
/// Case-insensitive substring checks, first match wins: `jan`, then
/// `june`/`may`, then `oct`/`nov`. Anything else passes through unchanged.
pub fn normalize_session(raw: &str) -> Session {
  let lower = raw.to_lowercase();
  if lower.contains("jan") {
    Session::January
  } else if lower.contains("june") || lower.contains("may") {
    Session::MayJune
  } else if lower.contains("oct") || lower.contains("nov") {
    Session::OctNov
  } else {
    Session::Other(raw.to_owned())
  }
}

// ─── Exam session rows ───────────────────────────────────────────────────────

/// The natural key of an exam session, `"{session}-{year}"` when displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExamSessionKey {
  pub session: Session,
  pub year:    u16,
}

impl fmt::Display for ExamSessionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.session, self.year)
  }
}

/// A persisted exam session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSession {
  pub id:      Uuid,
  pub session: Session,
  pub year:    u16,
}

impl ExamSession {
  pub fn key(&self) -> ExamSessionKey {
    ExamSessionKey { session: self.session.clone(), year: self.year }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_month_stem() {
    let stem = parse_file_stem("Jan-2021").unwrap();
    assert_eq!(stem.part1, "Jan");
    assert_eq!(stem.part2, None);
    assert_eq!(stem.year, 2021);
    assert_eq!(stem.raw_session(), "Jan");
  }

  #[test]
  fn cross_month_stem_keeps_both_tokens() {
    let dashed = parse_file_stem("May-June-2019").unwrap();
    assert_eq!(dashed.part2.as_deref(), Some("June"));
    assert_eq!(dashed.raw_session(), "May/June");

    let slashed = parse_file_stem("Jan/Feb-2021").unwrap();
    assert_eq!(slashed.part1, "Jan");
    assert_eq!(slashed.part2.as_deref(), Some("Feb"));
  }

  #[test]
  fn year_is_always_19xx_or_20xx() {
    for stem in ["Jan-1999", "Oct-2000", "Nov-2099"] {
      let year = parse_file_stem(stem).unwrap().year;
      assert!((1900..=2099).contains(&year), "{stem} → {year}");
    }
  }

  #[test]
  fn malformed_stems_are_rejected() {
    for stem in [
      "Jan2021",
      "Jan-1899",
      "Jan-2100",
      "Jan-21",
      "2021-Jan",
      "Jan-Feb-Mar-2021",
      "Jan 2021",
      "",
      "Jan-2021.json",
    ] {
      assert_eq!(parse_file_stem(stem), None, "{stem:?} should not parse");
    }
  }

  #[test]
  fn normalizer_canonical_labels() {
    assert_eq!(normalize_session("Jan"), Session::January);
    assert_eq!(normalize_session("June"), Session::MayJune);
    assert_eq!(normalize_session("May"), Session::MayJune);
    assert_eq!(normalize_session("Oct"), Session::OctNov);
    assert_eq!(normalize_session("Nov"), Session::OctNov);
  }

  #[test]
  fn normalizer_is_case_insensitive_and_ordered() {
    assert_eq!(normalize_session("JANUARY"), Session::January);
    assert_eq!(normalize_session("May/June"), Session::MayJune);
    // "jan" is checked before "june".
    assert_eq!(normalize_session("Jan/June"), Session::January);
    assert_eq!(normalize_session("Oct/Nov"), Session::OctNov);
  }

  #[test]
  fn normalizer_passes_unknown_labels_through() {
    let session = normalize_session("Mar");
    assert_eq!(session, Session::Other("Mar".into()));
    assert_eq!(session.as_str(), "Mar");
    assert!(!session.is_canonical());
  }

  #[test]
  fn session_key_display() {
    let key = parse_file_stem("May-June-2019").unwrap().session_key();
    assert_eq!(key.to_string(), "May/June-2019");
  }

  #[test]
  fn stored_labels_map_back_to_variants() {
    assert_eq!(Session::from("Oct/Nov".to_owned()), Session::OctNov);
    assert_eq!(Session::from("Mar".to_owned()), Session::Other("Mar".into()));
  }
}
