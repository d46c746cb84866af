//! Material classification of scraped link names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three link categories tracked per paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
  QuestionPaper,
  MarkScheme,
  ExaminerReport,
}

impl MaterialType {
  pub const ALL: [MaterialType; 3] =
    [MaterialType::QuestionPaper, MaterialType::MarkScheme, MaterialType::ExaminerReport];

  /// Column name of the link this material fills.
  pub fn column(self) -> &'static str {
    match self {
      MaterialType::QuestionPaper => "question_paper_link",
      MaterialType::MarkScheme => "mark_scheme_link",
      MaterialType::ExaminerReport => "examiner_report_link",
    }
  }
}

impl fmt::Display for MaterialType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.column()) }
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
  /// An "unused" item; dropped silently regardless of other keywords.
  Unused,
  Material(MaterialType),
  Unknown,
}

impl Classification {
  pub fn material(self) -> Option<MaterialType> {
    match self {
      Classification::Material(m) => Some(m),
      _ => None,
    }
  }
}

/// Decide what kind of material an item is from its display name.
///
/// Lower-cased substring checks, first match wins. The short forms (`qp`,
/// `ms`, `er`) are deliberately loose: any name containing `er` that is not
/// already a question paper or mark scheme counts as an examiner report.
pub fn classify(name: &str) -> Classification {
  let lower = name.to_lowercase();

  if lower.contains("unused") {
    return Classification::Unused;
  }

  let material = if lower.contains("question paper") || lower.contains("qp") {
    MaterialType::QuestionPaper
  } else if lower.contains("mark scheme") || lower.contains("ms") {
    MaterialType::MarkScheme
  } else if lower.contains("examiner report") || lower.contains("er") {
    MaterialType::ExaminerReport
  } else if lower.contains("provisional mark scheme") {
    MaterialType::MarkScheme
  } else {
    return Classification::Unknown;
  };

  Classification::Material(material)
}
