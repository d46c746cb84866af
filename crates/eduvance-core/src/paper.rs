//! Paper: the fact row, one unit of one subject in one exam session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::material::MaterialType;

/// The three optional links a paper carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperLinks {
  pub question_paper_link:  Option<String>,
  pub mark_scheme_link:     Option<String>,
  pub examiner_report_link: Option<String>,
}

impl PaperLinks {
  pub fn get(&self, material: MaterialType) -> Option<&str> {
    match material {
      MaterialType::QuestionPaper => self.question_paper_link.as_deref(),
      MaterialType::MarkScheme => self.mark_scheme_link.as_deref(),
      MaterialType::ExaminerReport => self.examiner_report_link.as_deref(),
    }
  }

  /// Set one link, returning the value it replaced.
  pub fn set(&mut self, material: MaterialType, link: String) -> Option<String> {
    let slot = match material {
      MaterialType::QuestionPaper => &mut self.question_paper_link,
      MaterialType::MarkScheme => &mut self.mark_scheme_link,
      MaterialType::ExaminerReport => &mut self.examiner_report_link,
    };
    slot.replace(link)
  }
}

/// A paper row ready for upsert; the store assigns `id` on insert.
///
/// `(subject_id, exam_session_id, unit_code)` is the conflict key and is
/// never rewritten on conflict; only the links are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaper {
  pub subject_id:      Uuid,
  pub exam_session_id: Uuid,
  pub unit_code:       String,
  #[serde(flatten)]
  pub links:           PaperLinks,
}

/// A persisted paper row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
  pub id:              Uuid,
  pub subject_id:      Uuid,
  pub exam_session_id: Uuid,
  pub unit_code:       String,
  #[serde(flatten)]
  pub links:           PaperLinks,
}
