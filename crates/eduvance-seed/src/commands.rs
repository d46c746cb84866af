//! The operator commands, generic over the backend.

use anyhow::{Context as _, Result};
use eduvance_core::{
  aggregate::{Aggregation, fold_files},
  catalog::{self, MatchedSubject},
  ingest::{IngestReport, ingest},
  store::PaperStore,
  subject::{NewSubject, SyllabusType},
};

use crate::{Command, prompt, settings::Settings};

/// Run `command` and release the store whatever the outcome.
pub async fn dispatch<S: PaperStore>(
  store: &S,
  command: &Command,
  settings: &Settings,
) -> Result<()> {
  let result = match command {
    Command::Papers { subject } => papers(store, settings, subject.as_deref()).await,
    Command::Subjects => subjects(store, settings).await,
    Command::InitSchema => init_schema(store).await,
    Command::Check => check(store).await,
  };
  store.close().await;
  result
}

// ─── papers ──────────────────────────────────────────────────────────────────

async fn papers<S: PaperStore>(
  store: &S,
  settings: &Settings,
  wanted: Option<&str>,
) -> Result<()> {
  store.prepare_schema().await.context("failed to prepare the papers table")?;

  let subjects = store.list_subjects().await.context("failed to list subjects")?;
  if subjects.is_empty() {
    println!("ℹ️ No subjects found in the database. Run `eduvance-seed subjects` first.");
    return Ok(());
  }

  let catalog = catalog::scan(&settings.data_dir)?;
  let matches = catalog::match_subjects(&subjects, &catalog);
  if matches.is_empty() {
    println!(
      "ℹ️ No matching subjects between the database and {}.",
      settings.data_dir.display()
    );
    return Ok(());
  }

  let Some(selected) = select(&matches, wanted)? else {
    println!("ℹ️ Nothing selected; exiting.");
    return Ok(());
  };
  let subject = &selected.subject;
  println!("\n📋 Processing papers for: {} ({})", subject.name, subject.syllabus_type);

  let aggregation = fold_files(subject, &selected.files);
  println!("ℹ️ Exam sessions found: {}", aggregation.sessions.len());
  println!("ℹ️ Paper units to insert: {}", aggregation.papers.len());
  if aggregation.papers.is_empty() {
    println!("ℹ️ Nothing to insert.");
    print_skips(&aggregation);
    return Ok(());
  }

  let report = ingest(store, &aggregation, settings.batch_size)
    .await
    .context("paper ingestion failed")?;

  println!("\n🎉 Seeding finished for {} ({})", subject.name, subject.syllabus_type);
  print_report(&aggregation, &report);
  Ok(())
}

fn select<'a>(
  matches: &'a [MatchedSubject],
  wanted: Option<&str>,
) -> Result<Option<&'a MatchedSubject>> {
  let Some(wanted) = wanted else {
    return prompt::choose_subject(matches);
  };
  match find_subject(matches, wanted) {
    Lookup::Found(found) => Ok(Some(found)),
    Lookup::Missing => {
      println!("⚠️ No subject named {wanted:?} has files under the data-import directory.");
      Ok(None)
    }
    Lookup::Ambiguous(types) => {
      let choices: Vec<String> = types.iter().map(|t| format!("\"{wanted} ({t})\"")).collect();
      println!("⚠️ {wanted:?} exists for several syllabus types; use {}.", choices.join(" or "));
      Ok(None)
    }
  }
}

#[derive(Debug, PartialEq)]
enum Lookup<'a> {
  Found(&'a MatchedSubject),
  Missing,
  Ambiguous(Vec<SyllabusType>),
}

/// Case-insensitive lookup of `Name` or `Name (IAL)`. A bare name shared by
/// several syllabus types is ambiguous.
fn find_subject<'a>(matches: &'a [MatchedSubject], wanted: &str) -> Lookup<'a> {
  let (name, syllabus_type) = split_qualifier(wanted.trim());
  let hits: Vec<&MatchedSubject> = matches
    .iter()
    .filter(|m| m.subject.name.eq_ignore_ascii_case(name))
    .filter(|m| syllabus_type.is_none_or(|t| m.subject.syllabus_type == t))
    .collect();
  match hits.as_slice() {
    [] => Lookup::Missing,
    [one] => Lookup::Found(one),
    many => Lookup::Ambiguous(many.iter().map(|m| m.subject.syllabus_type).collect()),
  }
}

/// `"Physics (IGCSE)"` → `("Physics", Some(Igcse))`. Unknown suffixes stay
/// part of the name.
fn split_qualifier(wanted: &str) -> (&str, Option<SyllabusType>) {
  let qualified = wanted
    .strip_suffix(')')
    .and_then(|rest| rest.rsplit_once('('))
    .and_then(|(name, tag)| {
      tag.trim().to_ascii_uppercase().parse::<SyllabusType>().ok().map(|t| (name.trim_end(), t))
    });
  match qualified {
    Some((name, syllabus_type)) => (name, Some(syllabus_type)),
    None => (wanted, None),
  }
}

fn print_report(aggregation: &Aggregation, report: &IngestReport) {
  println!("  - Exam sessions processed: {}", report.sessions_resolved);
  println!("  - Papers processed: {}", report.papers_prepared);
  println!("  - Rows written: {} in {} batch(es)", report.rows_written, report.batches);
  println!("  - Files processed: {}", aggregation.files_processed);
  if aggregation.overwrites > 0 {
    println!("  - Links overwritten by later files: {}", aggregation.overwrites);
  }
  print_skips(aggregation);
}

fn print_skips(aggregation: &Aggregation) {
  let skips = &aggregation.skips;
  println!("  - Files skipped: {}", skips.files());
  println!("  - Items skipped: {}", skips.items());
  for (kind, count) in skips.iter() {
    println!("      {}: {count}", kind.label());
  }
}

// ─── subjects ────────────────────────────────────────────────────────────────

async fn subjects<S: PaperStore>(store: &S, settings: &Settings) -> Result<()> {
  let existing = store.list_subjects().await.context("failed to list subjects")?;
  let catalog = catalog::scan(&settings.data_dir)?;
  let missing = catalog::missing_subjects(&existing, &catalog);

  if missing.is_empty() {
    println!("ℹ️ All {} catalog subjects already exist.", catalog.len());
    return Ok(());
  }

  for entry in &missing {
    let subject = store
      .add_subject(NewSubject {
        name:          entry.name.clone(),
        code:          None,
        syllabus_type: entry.syllabus_type,
      })
      .await
      .with_context(|| {
        format!("failed to add subject {} ({})", entry.name, entry.syllabus_type)
      })?;
    tracing::info!(id = %subject.id, name = %subject.name, "subject added");
    println!("✅ Added {} ({})", subject.name, subject.syllabus_type);
  }
  println!("🎉 Inserted {} subject(s).", missing.len());
  Ok(())
}

// ─── init-schema / check ─────────────────────────────────────────────────────

async fn init_schema<S: PaperStore>(store: &S) -> Result<()> {
  store.init_schema().await.context("failed to create schema")?;
  println!("✅ Schema is in place.");
  Ok(())
}

async fn check<S: PaperStore>(store: &S) -> Result<()> {
  let subjects = store.list_subjects().await.context("connection check failed")?;
  println!("✅ Connected. {} subject(s) in the database.", subjects.len());
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
  };

  use eduvance_core::{
    paper::NewPaper,
    session::{ExamSession, ExamSessionKey},
    subject::Subject,
  };
  use eduvance_store_mysql::MysqlConfig;
  use uuid::Uuid;

  use super::*;
  use crate::settings::{SqliteSettings, SupabaseSettings};

  #[derive(Default)]
  struct FakeStore {
    subjects:     Vec<Subject>,
    fail_prepare: bool,
    closes:       AtomicUsize,
    batches:      AtomicUsize,
  }

  fn fake_error() -> std::io::Error { std::io::Error::other("fake store failure") }

  impl PaperStore for FakeStore {
    type Error = std::io::Error;

    async fn init_schema(&self) -> Result<(), Self::Error> { Ok(()) }

    async fn prepare_schema(&self) -> Result<(), Self::Error> {
      if self.fail_prepare { Err(fake_error()) } else { Ok(()) }
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, Self::Error> {
      Ok(self.subjects.clone())
    }

    async fn add_subject(&self, _: NewSubject) -> Result<Subject, Self::Error> {
      Err(fake_error())
    }

    async fn resolve_exam_session(&self, key: &ExamSessionKey) -> Result<ExamSession, Self::Error> {
      Ok(ExamSession { id: Uuid::new_v4(), session: key.session.clone(), year: key.year })
    }

    async fn upsert_papers(&self, batch: &[NewPaper]) -> Result<u64, Self::Error> {
      self.batches.fetch_add(1, Ordering::SeqCst);
      Ok(batch.len() as u64)
    }

    async fn close(&self) { self.closes.fetch_add(1, Ordering::SeqCst); }
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

  fn settings(data_dir: &Path) -> Settings {
    Settings {
      backend:    None,
      data_dir:   data_dir.to_path_buf(),
      batch_size: 500,
      mysql:      MysqlConfig::default(),
      supabase:   SupabaseSettings::default(),
      sqlite:     SqliteSettings { path: data_dir.join("eduvance.sqlite3") },
    }
  }

  /// One IAL Physics file with a single question paper.
  fn physics_tree(root: &Path) {
    let dir = root.join("IAL").join("Physics (2018)");
    fs::create_dir_all(&dir).unwrap();
    let body = serde_json::json!([{"Name": "Question Paper (WPH11)", "Link": "http://x/qp"}]);
    fs::write(dir.join("Jan-2021.json"), body.to_string()).unwrap();
  }

  fn matched(name: &str, syllabus_type: SyllabusType) -> MatchedSubject {
    MatchedSubject { subject: subject(name, syllabus_type), files: Vec::new() }
  }

  // ─── dispatch ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn store_is_closed_when_the_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = FakeStore { fail_prepare: true, ..Default::default() };
    let command = Command::Papers { subject: None };

    let result = dispatch(&store, &command, &settings(dir.path())).await;
    assert!(result.is_err());
    assert_eq!(store.closes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn store_is_closed_after_a_successful_command() {
    let dir = tempfile::tempdir().unwrap();
    let store = FakeStore::default();

    dispatch(&store, &Command::Check, &settings(dir.path())).await.unwrap();
    assert_eq!(store.closes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn full_papers_run_writes_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    physics_tree(dir.path());
    let store =
      FakeStore { subjects: vec![subject("Physics", SyllabusType::Ial)], ..Default::default() };
    let command = Command::Papers { subject: Some("physics".into()) };

    dispatch(&store, &command, &settings(dir.path())).await.unwrap();
    assert_eq!(store.batches.load(Ordering::SeqCst), 1);
    assert_eq!(store.closes.load(Ordering::SeqCst), 1);
  }

  // ─── papers: nothing-to-do exits ───────────────────────────────────────────

  #[tokio::test]
  async fn no_subjects_in_the_database_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    physics_tree(dir.path());
    let store = FakeStore::default();

    papers(&store, &settings(dir.path()), Some("Physics")).await.unwrap();
    assert_eq!(store.batches.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn subjects_without_catalog_files_are_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store =
      FakeStore { subjects: vec![subject("Physics", SyllabusType::Ial)], ..Default::default() };

    papers(&store, &settings(dir.path()), Some("Physics")).await.unwrap();
    assert_eq!(store.batches.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn unknown_subject_flag_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    physics_tree(dir.path());
    let store =
      FakeStore { subjects: vec![subject("Physics", SyllabusType::Ial)], ..Default::default() };

    papers(&store, &settings(dir.path()), Some("X")).await.unwrap();
    assert_eq!(store.batches.load(Ordering::SeqCst), 0);
  }

  // ─── subject lookup ────────────────────────────────────────────────────────

  #[test]
  fn bare_name_matches_case_insensitively() {
    let matches = [matched("Physics", SyllabusType::Ial), matched("Chemistry", SyllabusType::Ial)];
    assert_eq!(find_subject(&matches, "physics"), Lookup::Found(&matches[0]));
    assert_eq!(find_subject(&matches, "Biology"), Lookup::Missing);
  }

  #[test]
  fn shared_name_needs_a_syllabus_type() {
    let matches = [matched("Physics", SyllabusType::Ial), matched("Physics", SyllabusType::Igcse)];
    assert_eq!(
      find_subject(&matches, "Physics"),
      Lookup::Ambiguous(vec![SyllabusType::Ial, SyllabusType::Igcse])
    );
    assert_eq!(find_subject(&matches, "Physics (IGCSE)"), Lookup::Found(&matches[1]));
    assert_eq!(find_subject(&matches, "physics (ial)"), Lookup::Found(&matches[0]));
  }

  #[test]
  fn qualifier_must_match_the_syllabus_type() {
    let matches = [matched("Physics", SyllabusType::Ial)];
    assert_eq!(find_subject(&matches, "Physics (IGCSE)"), Lookup::Missing);
  }

  #[test]
  fn unknown_parenthesised_suffix_stays_in_the_name() {
    assert_eq!(split_qualifier("Further Pure (FP1)"), ("Further Pure (FP1)", None));
    assert_eq!(split_qualifier("Physics(IAL)"), ("Physics", Some(SyllabusType::Ial)));
  }
}
