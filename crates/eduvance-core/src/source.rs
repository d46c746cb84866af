//! Loading one data-import JSON file.
//!
//! Each file is an array of `{"Name": …, "Link": …}` objects named after the
//! exam session it covers. Anything that does not fit that shape is a
//! [`Skip`], never an error.

use std::path::Path;

use serde_json::Value;

use crate::{
  session::{ExamSessionKey, parse_file_stem},
  skip::Skip,
};

/// One `{Name, Link}` entry. Fields are kept raw so that a single bad entry
/// does not reject the whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem(pub Value);

impl SourceItem {
  /// Both fields as non-empty strings, or `None`.
  pub fn name_and_link(&self) -> Option<(&str, &str)> {
    let name = self.0.get("Name")?.as_str().filter(|s| !s.is_empty())?;
    let link = self.0.get("Link")?.as_str().filter(|s| !s.is_empty())?;
    Some((name, link))
  }
}

/// A parsed data-import file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
  pub file_name: String,
  pub session:   ExamSessionKey,
  pub items:     Vec<SourceItem>,
}

impl SourceFile {
  /// Build from an already-read file body. Used by [`load_source_file`] and
  /// directly by tests.
  pub fn from_contents(file_name: &str, contents: &str) -> Result<Self, Skip> {
    let stem = file_name.strip_suffix(".json").unwrap_or(file_name);
    let session = parse_file_stem(stem)
      .ok_or_else(|| Skip::MalformedFilename { file: file_name.to_owned() })?
      .session_key();

    let value: Value = serde_json::from_str(contents).map_err(|e| Skip::NotJson {
      file:   file_name.to_owned(),
      reason: e.to_string(),
    })?;

    let items = match value {
      Value::Array(items) if items.is_empty() => {
        return Err(Skip::EmptyArray { file: file_name.to_owned() });
      }
      Value::Array(items) => items.into_iter().map(SourceItem).collect(),
      _ => return Err(Skip::NotArray { file: file_name.to_owned() }),
    };

    if !session.session.is_canonical() {
      tracing::warn!(
        file = file_name,
        session = %session.session,
        "non-canonical session label; it will be stored verbatim"
      );
    }

    Ok(Self { file_name: file_name.to_owned(), session, items })
  }
}

/// Read and parse one data-import file.
pub fn load_source_file(path: &Path) -> Result<SourceFile, Skip> {
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string());

  let contents = std::fs::read_to_string(path).map_err(|e| Skip::Unreadable {
    file:   file_name.clone(),
    reason: e.to_string(),
  })?;

  SourceFile::from_contents(&file_name, &contents)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::Session;

  #[test]
  fn parses_session_and_items() {
    let file = SourceFile::from_contents(
      "Jan-2021.json",
      r#"[{"Name":"Question Paper (WAC11)","Link":"http://x/qp.pdf"}]"#,
    )
    .unwrap();
    assert_eq!(file.session.session, Session::January);
    assert_eq!(file.session.year, 2021);
    assert_eq!(file.items.len(), 1);
    assert_eq!(
      file.items[0].name_and_link(),
      Some(("Question Paper (WAC11)", "http://x/qp.pdf"))
    );
  }

  #[test]
  fn malformed_filename_is_skipped() {
    let skip = SourceFile::from_contents("notes.json", "[]").unwrap_err();
    assert_eq!(skip, Skip::MalformedFilename { file: "notes.json".into() });
  }

  #[test]
  fn shape_problems_are_skipped() {
    assert!(matches!(
      SourceFile::from_contents("Jan-2021.json", "{not json"),
      Err(Skip::NotJson { .. })
    ));
    assert!(matches!(
      SourceFile::from_contents("Jan-2021.json", r#"{"Name":"x"}"#),
      Err(Skip::NotArray { .. })
    ));
    assert!(matches!(
      SourceFile::from_contents("Jan-2021.json", "[]"),
      Err(Skip::EmptyArray { .. })
    ));
  }

  #[test]
  fn items_without_string_fields_have_no_name_and_link() {
    let item = SourceItem(serde_json::json!({"Name": "Mark Scheme"}));
    assert_eq!(item.name_and_link(), None);
    let item = SourceItem(serde_json::json!({"Name": 7, "Link": "http://x"}));
    assert_eq!(item.name_and_link(), None);
    let item = SourceItem(serde_json::json!({"Name": "", "Link": "http://x"}));
    assert_eq!(item.name_and_link(), None);
  }

  #[test]
  fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Oct-Nov-2020.json");
    std::fs::write(&path, r#"[{"Name":"Mark Scheme (WPH11)","Link":"http://x/ms.pdf"}]"#)
      .unwrap();

    let file = load_source_file(&path).unwrap();
    assert_eq!(file.file_name, "Oct-Nov-2020.json");
    assert_eq!(file.session.to_string(), "Oct/Nov-2020");
  }

  #[test]
  fn missing_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let skip = load_source_file(&dir.path().join("Jan-2021.json")).unwrap_err();
    assert!(matches!(skip, Skip::Unreadable { .. }));
  }
}
