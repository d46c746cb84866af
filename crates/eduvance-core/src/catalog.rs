//! Data-import catalog: which subjects have scraped files on disk.
//!
//! Layout: `{root}/{syllabus_type}/{subject name} ({year})/*.json`.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
  Error, Result,
  subject::{Subject, SyllabusType},
};

static SUBJECT_DIR_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^(.+?)\s*\(\d{4}\)$").expect("valid subject directory regex"));

/// All JSON files found for one `(name, syllabus_type)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
  pub name:          String,
  pub syllabus_type: SyllabusType,
  pub directories:   Vec<PathBuf>,
  /// Sorted by directory, then file name, so processing order is stable.
  pub files:         Vec<PathBuf>,
}

/// A database subject paired with its catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSubject {
  pub subject: Subject,
  pub files:   Vec<PathBuf>,
}

/// `"Physics (2018)"` → `"Physics"`; names without a year suffix pass through.
pub fn subject_name_from_dir(dir_name: &str) -> &str {
  SUBJECT_DIR_RE
    .captures(dir_name)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().trim())
    .unwrap_or(dir_name)
}

/// Scan `root`. A missing root yields an empty catalog.
pub fn scan(root: &Path) -> Result<Vec<CatalogEntry>> {
  if !root.is_dir() {
    tracing::warn!(root = %root.display(), "data-import directory not found");
    return Ok(Vec::new());
  }

  let mut entries: BTreeMap<(SyllabusType, String), CatalogEntry> = BTreeMap::new();

  for type_dir in sorted_subdirs(root)? {
    let type_name = dir_name(&type_dir);
    let Ok(syllabus_type) = type_name.parse::<SyllabusType>() else {
      tracing::warn!(dir = %type_dir.display(), "not a known syllabus type; skipping");
      continue;
    };
    tracing::info!(syllabus_type = %syllabus_type, "scanning");

    let subject_dirs = sorted_subdirs(&type_dir)?;
    if subject_dirs.is_empty() {
      tracing::warn!(dir = %type_dir.display(), "no subject directories; skipping");
      continue;
    }

    for subject_dir in subject_dirs {
      let folder = dir_name(&subject_dir);
      let name = subject_name_from_dir(&folder).to_owned();
      let files = json_files(&subject_dir)?;
      if files.is_empty() {
        continue;
      }
      tracing::info!(folder = %folder, name = %name, files = files.len(), "found subject data");

      let entry = entries
        .entry((syllabus_type, name.clone()))
        .or_insert_with(|| CatalogEntry {
          name,
          syllabus_type,
          directories: Vec::new(),
          files: Vec::new(),
        });
      if !entry.directories.is_empty() {
        tracing::warn!(
          folder = %folder,
          "several folders map to {} ({}); merging their files",
          entry.name,
          entry.syllabus_type
        );
      }
      entry.directories.push(subject_dir);
      entry.files.extend(files);
    }
  }

  Ok(entries.into_values().collect())
}

/// Pair database subjects with catalog entries by exact `(name, syllabus_type)`,
/// preserving the order of `subjects`.
pub fn match_subjects(subjects: &[Subject], catalog: &[CatalogEntry]) -> Vec<MatchedSubject> {
  subjects
    .iter()
    .filter_map(|subject| {
      catalog
        .iter()
        .find(|entry| entry.name == subject.name && entry.syllabus_type == subject.syllabus_type)
        .map(|entry| MatchedSubject { subject: subject.clone(), files: entry.files.clone() })
    })
    .collect()
}

/// Catalog entries with no subject row yet.
pub fn missing_subjects<'a>(
  subjects: &[Subject],
  catalog: &'a [CatalogEntry],
) -> Vec<&'a CatalogEntry> {
  catalog
    .iter()
    .filter(|entry| {
      !subjects
        .iter()
        .any(|s| s.name == entry.name && s.syllabus_type == entry.syllabus_type)
    })
    .collect()
}

fn dir_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut dirs = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
    let entry = entry.map_err(|e| Error::io(dir, e))?;
    if entry.file_type().map_err(|e| Error::io(entry.path(), e))?.is_dir() {
      dirs.push(entry.path());
    }
  }
  dirs.sort();
  Ok(dirs)
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
    let path = entry.map_err(|e| Error::io(dir, e))?.path();
    if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "[]").unwrap();
  }

  fn subject(name: &str, syllabus_type: SyllabusType) -> Subject {
    Subject {
      id: Uuid::new_v4(),
      name: name.into(),
      code: None,
      syllabus_type,
      units: serde_json::Value::Null,
    }
  }

  #[test]
  fn subject_names_drop_year_suffix() {
    assert_eq!(subject_name_from_dir("Physics (2018)"), "Physics");
    assert_eq!(subject_name_from_dir("English Language A(2016)"), "English Language A");
    assert_eq!(subject_name_from_dir("Biology"), "Biology");
    assert_eq!(subject_name_from_dir("Maths (new)"), "Maths (new)");
  }

  #[test]
  fn scan_finds_subjects_with_json_files() {
    let root = tempfile::tempdir().unwrap();
    touch(&root.path().join("IAL/Physics (2018)/Jan-2021.json"));
    touch(&root.path().join("IAL/Physics (2018)/Oct-2020.json"));
    touch(&root.path().join("IAL/Physics (2018)/notes.txt"));
    touch(&root.path().join("IGCSE/Chemistry (2017)/May-June-2019.json"));
    std::fs::create_dir_all(root.path().join("IAL/Empty (2019)")).unwrap();
    touch(&root.path().join("GCSE/History (2015)/Jan-2021.json"));

    let catalog = scan(root.path()).unwrap();

    assert_eq!(catalog.len(), 2);
    let physics = catalog.iter().find(|e| e.name == "Physics").unwrap();
    assert_eq!(physics.syllabus_type, SyllabusType::Ial);
    let names: Vec<_> = physics
      .files
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, ["Jan-2021.json", "Oct-2020.json"]);
    assert!(catalog.iter().any(|e| e.name == "Chemistry" && e.syllabus_type == SyllabusType::Igcse));
  }

  #[test]
  fn folders_for_the_same_subject_are_merged() {
    let root = tempfile::tempdir().unwrap();
    touch(&root.path().join("IAL/Physics (2013)/Jan-2017.json"));
    touch(&root.path().join("IAL/Physics (2018)/Jan-2021.json"));

    let catalog = scan(root.path()).unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].directories.len(), 2);
    assert_eq!(catalog[0].files.len(), 2);
  }

  #[test]
  fn missing_root_is_empty() {
    let root = tempfile::tempdir().unwrap();
    assert!(scan(&root.path().join("nope")).unwrap().is_empty());
  }

  #[test]
  fn matching_is_by_name_and_syllabus_type() {
    let root = tempfile::tempdir().unwrap();
    touch(&root.path().join("IAL/Physics (2018)/Jan-2021.json"));
    touch(&root.path().join("IGCSE/Biology (2017)/Jan-2021.json"));
    let catalog = scan(root.path()).unwrap();

    let subjects = vec![
      subject("Physics", SyllabusType::Ial),
      subject("Physics", SyllabusType::Igcse),
      subject("Chemistry", SyllabusType::Ial),
    ];

    let matched = match_subjects(&subjects, &catalog);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].subject.name, "Physics");
    assert_eq!(matched[0].subject.syllabus_type, SyllabusType::Ial);
    assert_eq!(matched[0].files.len(), 1);

    let missing = missing_subjects(&subjects, &catalog);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].name, "Biology");
  }
}
