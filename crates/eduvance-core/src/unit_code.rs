//! Unit-code extraction, one strategy per syllabus type.
//!
//! The exam board encodes unit identifiers differently per qualification:
//! IAL names carry a parenthesised `W…` code (`"Question Paper (WAC11/01)"`),
//! IGCSE names carry a component token after the word "paper"
//! (`"Paper 1PR Mark Scheme"`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::subject::SyllabusType;

static IAL_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"\((W[A-Z0-9]+)(?:/[0-9]+)?\)").expect("valid IAL unit code regex")
});

static IGCSE_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"paper\s*(\b(?:1p|1pr|2p|2pr|pr|1c|1cr|2c|2cr|1b|1br|2b|2br|1|1r|2|2r|01|02)\b)",
  )
  .expect("valid IGCSE unit code regex")
});

/// Pulls a unit code out of an item display name.
pub type Extractor = fn(&str) -> Option<String>;

/// Syllabus type → extraction strategy. A syllabus type missing from this
/// table yields no unit codes, so all of its items are dropped.
pub const EXTRACTORS: &[(SyllabusType, Extractor)] = &[
  (SyllabusType::Ial, extract_ial),
  (SyllabusType::Igcse, extract_igcse),
];

pub fn extractor_for(syllabus_type: SyllabusType) -> Option<Extractor> {
  EXTRACTORS
    .iter()
    .find(|(ty, _)| *ty == syllabus_type)
    .map(|(_, f)| *f)
}

/// Extract the unit code for `name` under `syllabus_type`'s conventions.
pub fn extract_unit_code(name: &str, syllabus_type: SyllabusType) -> Option<String> {
  extractor_for(syllabus_type).and_then(|extract| extract(name))
}

/// `"(WAC11)"` / `"(WAC11/01)"` → `"WAC11"`. Case-sensitive.
pub fn extract_ial(name: &str) -> Option<String> {
  IAL_UNIT_RE.captures(name).map(|caps| caps[1].to_owned())
}

/// `"Paper 1PR"` → `"1PR"`. A bare `PR` means paper 2's practical, `"2PR"`.
pub fn extract_igcse(name: &str) -> Option<String> {
  let lower = name.to_lowercase();
  let caps = IGCSE_UNIT_RE.captures(&lower)?;
  let code = caps[1].to_uppercase();
  Some(if code == "PR" { "2PR".to_owned() } else { code })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ial_codes() {
    assert_eq!(
      extract_unit_code("Question Paper (WAC11/01)", SyllabusType::Ial).as_deref(),
      Some("WAC11")
    );
    assert_eq!(
      extract_unit_code("Mark Scheme (WPH14)", SyllabusType::Ial).as_deref(),
      Some("WPH14")
    );
  }

  #[test]
  fn ial_requires_parenthesised_w_code() {
    assert_eq!(extract_ial("Question Paper WAC11"), None);
    assert_eq!(extract_ial("Question Paper (XAC11)"), None);
    assert_eq!(extract_ial("Question Paper (wac11)"), None);
  }

  #[test]
  fn igcse_codes() {
    assert_eq!(
      extract_unit_code("Paper 1PR", SyllabusType::Igcse).as_deref(),
      Some("1PR")
    );
    assert_eq!(extract_igcse("Paper 2C Question Paper").as_deref(), Some("2C"));
    assert_eq!(extract_igcse("Paper 01 Mark Scheme").as_deref(), Some("01"));
    // The token must start on a word boundary.
    assert_eq!(extract_igcse("paper01 mark scheme"), None);
    assert_eq!(extract_igcse("Paper 1 (Foundation)").as_deref(), Some("1"));
    assert_eq!(extract_igcse("Paper 1P").as_deref(), Some("1P"));
  }

  #[test]
  fn igcse_bare_pr_means_paper_two() {
    assert_eq!(extract_unit_code("Paper PR", SyllabusType::Igcse).as_deref(), Some("2PR"));
  }

  #[test]
  fn igcse_unknown_tokens_are_rejected() {
    assert_eq!(extract_unit_code("Paper 9Z", SyllabusType::Igcse), None);
    assert_eq!(extract_igcse("Paper 3"), None);
    assert_eq!(extract_igcse("Question Paper (WAC11)"), None);
  }

  #[test]
  fn strategies_do_not_cross_syllabus_types() {
    assert_eq!(extract_unit_code("Paper 1PR", SyllabusType::Ial), None);
    assert_eq!(extract_unit_code("Question Paper (WAC11)", SyllabusType::Igcse), None);
  }

  #[test]
  fn every_syllabus_type_has_a_strategy() {
    for ty in SyllabusType::ALL {
      assert!(extractor_for(ty).is_some(), "{ty} has no extractor");
    }
  }
}
