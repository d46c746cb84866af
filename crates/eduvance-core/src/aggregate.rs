//! Paper aggregation: fold classified, unit-coded items into one record per
//! `(subject, exam session, unit code)`.
//!
//! The aggregator is plain state threaded through [`PaperAggregator::fold_file`];
//! it does no I/O of its own, so the merge rules are testable without a
//! filesystem or a database.

use std::{
  collections::{BTreeMap, BTreeSet},
  path::PathBuf,
};

use uuid::Uuid;

use crate::{
  material::Classification,
  paper::PaperLinks,
  session::ExamSessionKey,
  skip::{Skip, SkipTally},
  source::{SourceFile, load_source_file},
  subject::Subject,
  unit_code::extract_unit_code,
};

/// `"{session}-{year}-{unit_code}"`, scoped by subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaperKey {
  pub subject_id: Uuid,
  pub session:    ExamSessionKey,
  pub unit_code:  String,
}

/// One merged paper awaiting exam-session id resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPaper {
  pub key:   PaperKey,
  pub links: PaperLinks,
}

/// Accumulated state of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct PaperAggregator {
  sessions:        BTreeSet<ExamSessionKey>,
  papers:          BTreeMap<PaperKey, PaperLinks>,
  files_processed: usize,
  overwrites:      usize,
  skips:           SkipTally,
}

impl PaperAggregator {
  pub fn new() -> Self { Self::default() }

  /// Merge every usable item of `file` into the aggregate.
  ///
  /// Links merge per material type: a later item only replaces the link of
  /// its own type, and a replaced non-identical link is logged.
  pub fn fold_file(mut self, subject: &Subject, file: &SourceFile) -> Self {
    self.files_processed += 1;
    if self.sessions.insert(file.session.clone()) {
      tracing::info!(file = %file.file_name, session = %file.session, "found new exam session");
    }

    for item in &file.items {
      let Some((name, link)) = item.name_and_link() else {
        self = self.skip(Skip::MissingField {
          file: file.file_name.clone(),
          item: item.0.to_string(),
        });
        continue;
      };

      let material = match crate::material::classify(name) {
        Classification::Material(m) => m,
        Classification::Unused => {
          self = self.skip(Skip::Unused { name: name.to_owned() });
          continue;
        }
        Classification::Unknown => {
          self = self.skip(Skip::UnknownMaterial { name: name.to_owned() });
          continue;
        }
      };

      let Some(unit_code) = extract_unit_code(name, subject.syllabus_type) else {
        self = self.skip(Skip::NoUnitCode { name: name.to_owned() });
        continue;
      };

      let key = PaperKey {
        subject_id: subject.id,
        session:    file.session.clone(),
        unit_code,
      };
      let links = self.papers.entry(key).or_default();
      if let Some(previous) = links.set(material, link.to_owned())
        && previous != link
      {
        tracing::warn!(
          file = %file.file_name,
          name,
          material = %material,
          old = %previous,
          new = link,
          "duplicate link for paper; overwriting old link"
        );
        self.overwrites += 1;
      }
    }

    self
  }

  /// Record a file or item that was left out.
  pub fn skip(mut self, skip: Skip) -> Self {
    skip.log();
    self.skips.record(&skip);
    self
  }

  pub fn finish(self) -> Aggregation {
    Aggregation {
      sessions:        self.sessions,
      papers:          self
        .papers
        .into_iter()
        .map(|(key, links)| AggregatedPaper { key, links })
        .collect(),
      files_processed: self.files_processed,
      overwrites:      self.overwrites,
      skips:           self.skips,
    }
  }
}

/// Result of aggregation, handed to [`crate::ingest::ingest`].
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
  /// Every distinct exam session seen in a well-formed file.
  pub sessions:        BTreeSet<ExamSessionKey>,
  /// Merged papers in key order.
  pub papers:          Vec<AggregatedPaper>,
  pub files_processed: usize,
  pub overwrites:      usize,
  pub skips:           SkipTally,
}

/// Load each file in order and fold it into a fresh aggregator.
///
/// Later files win link conflicts, so callers should pass `files` in a
/// stable order; [`crate::catalog`] sorts them by name.
pub fn fold_files(subject: &Subject, files: &[PathBuf]) -> Aggregation {
  files
    .iter()
    .fold(PaperAggregator::new(), |agg, path| {
      tracing::info!(file = %path.display(), "processing file");
      match load_source_file(path) {
        Ok(file) => agg.fold_file(subject, &file),
        Err(skip) => agg.skip(skip),
      }
    })
    .finish()
}
