//! Subject, the pre-existing dimension row papers hang off.
//!
//! Subjects are never created by paper ingestion. They are matched against
//! the data-import catalog by `(name, syllabus_type)`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// The qualification track a subject belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SyllabusType {
  #[serde(rename = "IAL")]
  Ial,
  #[serde(rename = "IGCSE")]
  Igcse,
}

impl SyllabusType {
  pub const ALL: [SyllabusType; 2] = [SyllabusType::Ial, SyllabusType::Igcse];

  /// The label used in database rows and data-import directory names.
  pub fn as_str(self) -> &'static str {
    match self {
      SyllabusType::Ial => "IAL",
      SyllabusType::Igcse => "IGCSE",
    }
  }
}

impl fmt::Display for SyllabusType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SyllabusType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "IAL" => Ok(SyllabusType::Ial),
      "IGCSE" => Ok(SyllabusType::Igcse),
      other => Err(Error::UnknownSyllabusType(other.to_owned())),
    }
  }
}

/// A subject row as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub id:            Uuid,
  pub name:          String,
  pub code:          Option<String>,
  pub syllabus_type: SyllabusType,
  /// Opaque unit metadata maintained by the admin dashboard.
  #[serde(default)]
  pub units:         serde_json::Value,
}

/// Input for [`PaperStore::add_subject`](crate::store::PaperStore::add_subject).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
  pub name:          String,
  pub code:          Option<String>,
  pub syllabus_type: SyllabusType,
}
