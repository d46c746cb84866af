//! Skip-and-log outcomes.
//!
//! Nothing here aborts a run. Each value names one file or item that was
//! left out and why; the aggregator logs it and tallies it for the report.

use std::{collections::BTreeMap, fmt};

/// Why a file or item was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
  /// File stem is not `Month[-Month]-YYYY`.
  MalformedFilename { file: String },
  Unreadable { file: String, reason: String },
  NotJson { file: String, reason: String },
  NotArray { file: String },
  EmptyArray { file: String },
  /// Item without a non-empty string `Name` and `Link`.
  MissingField { file: String, item: String },
  Unused { name: String },
  UnknownMaterial { name: String },
  NoUnitCode { name: String },
}

impl Skip {
  /// Stable tally key.
  pub fn kind(&self) -> SkipKind {
    match self {
      Skip::MalformedFilename { .. } => SkipKind::MalformedFilename,
      Skip::Unreadable { .. } => SkipKind::Unreadable,
      Skip::NotJson { .. } => SkipKind::NotJson,
      Skip::NotArray { .. } => SkipKind::NotArray,
      Skip::EmptyArray { .. } => SkipKind::EmptyArray,
      Skip::MissingField { .. } => SkipKind::MissingField,
      Skip::Unused { .. } => SkipKind::Unused,
      Skip::UnknownMaterial { .. } => SkipKind::UnknownMaterial,
      Skip::NoUnitCode { .. } => SkipKind::NoUnitCode,
    }
  }

  /// Whether this skip drops a whole file rather than one item.
  pub fn is_file_level(&self) -> bool { self.kind().is_file_level() }

  pub(crate) fn log(&self) {
    match self {
      Skip::Unused { name } => tracing::debug!(name = %name, "skipping unused entry"),
      other => tracing::warn!("{other}"),
    }
  }
}

impl fmt::Display for Skip {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Skip::MalformedFilename { file } => write!(
        f,
        "malformed filename {file:?}, expected Month-Year.json or Month-Month-Year.json"
      ),
      Skip::Unreadable { file, reason } => write!(f, "could not read {file:?}: {reason}"),
      Skip::NotJson { file, reason } => write!(f, "could not parse {file:?} as JSON: {reason}"),
      Skip::NotArray { file } => write!(f, "{file:?} is not a JSON array"),
      Skip::EmptyArray { file } => write!(f, "{file:?} is an empty JSON array"),
      Skip::MissingField { file, item } => {
        write!(f, "entry in {file:?} is missing 'Name' or 'Link': {item}")
      }
      Skip::Unused { name } => write!(f, "unused entry {name:?}"),
      Skip::UnknownMaterial { name } => write!(f, "unknown material type in name {name:?}"),
      Skip::NoUnitCode { name } => write!(f, "no recognised unit code in name {name:?}"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipKind {
  MalformedFilename,
  Unreadable,
  NotJson,
  NotArray,
  EmptyArray,
  MissingField,
  Unused,
  UnknownMaterial,
  NoUnitCode,
}

impl SkipKind {
  pub fn is_file_level(self) -> bool {
    matches!(
      self,
      SkipKind::MalformedFilename
        | SkipKind::Unreadable
        | SkipKind::NotJson
        | SkipKind::NotArray
        | SkipKind::EmptyArray
    )
  }

  pub fn label(self) -> &'static str {
    match self {
      SkipKind::MalformedFilename => "malformed filename",
      SkipKind::Unreadable => "unreadable file",
      SkipKind::NotJson => "invalid JSON",
      SkipKind::NotArray => "not a JSON array",
      SkipKind::EmptyArray => "empty JSON array",
      SkipKind::MissingField => "missing Name/Link",
      SkipKind::Unused => "unused entry",
      SkipKind::UnknownMaterial => "unknown material type",
      SkipKind::NoUnitCode => "no unit code",
    }
  }
}

/// Per-kind skip counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipTally {
  counts: BTreeMap<SkipKind, usize>,
}

impl SkipTally {
  pub fn record(&mut self, skip: &Skip) { *self.counts.entry(skip.kind()).or_default() += 1; }

  pub fn count(&self, kind: SkipKind) -> usize { self.counts.get(&kind).copied().unwrap_or(0) }

  pub fn files(&self) -> usize {
    self
      .counts
      .iter()
      .filter(|(kind, _)| kind.is_file_level())
      .map(|(_, n)| n)
      .sum()
  }

  pub fn items(&self) -> usize {
    self
      .counts
      .iter()
      .filter(|(kind, _)| !kind.is_file_level())
      .map(|(_, n)| n)
      .sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (SkipKind, usize)> + '_ {
    self.counts.iter().map(|(k, n)| (*k, *n))
  }
}
