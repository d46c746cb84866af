//! Interactive stdin prompts: backend menu, subject menu, MySQL password.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use eduvance_core::catalog::MatchedSubject;

use crate::settings::Backend;

/// A parsed menu answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
  Pick(usize),
  Exit,
  Invalid,
}

/// `"1"`..`"len"` pick an entry (zero-based in the result); `"exit"` or `"0"`
/// leave.
pub fn parse_choice(input: &str, len: usize) -> Choice {
  let input = input.trim();
  if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("q") {
    return Choice::Exit;
  }
  match input.parse::<usize>() {
    Ok(0) => Choice::Exit,
    Ok(n) if n <= len => Choice::Pick(n - 1),
    _ => Choice::Invalid,
  }
}

/// Print `prompt` and read one line. `None` at end of input.
pub fn read_line(prompt: &str) -> Result<Option<String>> {
  print!("{prompt}");
  io::stdout().flush().ok();
  let mut line = String::new();
  if io::stdin().lock().read_line(&mut line)? == 0 {
    return Ok(None);
  }
  Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
}

/// Read a password from stdin. Input is echoed.
pub fn password(prompt: &str) -> Result<String> {
  Ok(read_line(prompt)?.unwrap_or_default())
}

pub fn choose_backend() -> Result<Option<Backend>> {
  const BACKENDS: [(Backend, &str); 3] = [
    (Backend::Supabase, "Supabase (PostgreSQL)"),
    (Backend::Mysql, "MySQL"),
    (Backend::Sqlite, "SQLite (local file)"),
  ];

  println!("\n📋 Select a database backend:");
  for (i, (_, label)) in BACKENDS.iter().enumerate() {
    println!("{}. {label}", i + 1);
  }
  let Some(answer) = read_line("\nYour choice (number or \"exit\"): ")? else {
    return Ok(None);
  };
  Ok(pick(&answer, &BACKENDS).map(|(backend, _)| *backend))
}

pub fn choose_subject(matches: &[MatchedSubject]) -> Result<Option<&MatchedSubject>> {
  println!("\n📋 Available subjects to add papers for:");
  for (i, m) in matches.iter().enumerate() {
    println!(
      "{}. {} ({}) - {} files",
      i + 1,
      m.subject.name,
      m.subject.syllabus_type,
      m.files.len()
    );
  }
  let Some(answer) = read_line("\nYour choice (number or \"exit\"): ")? else {
    return Ok(None);
  };
  Ok(pick(&answer, matches))
}

fn pick<'a, T>(answer: &str, options: &'a [T]) -> Option<&'a T> {
  match parse_choice(answer, options.len()) {
    Choice::Pick(i) => options.get(i),
    Choice::Exit => None,
    Choice::Invalid => {
      println!("⚠️ Invalid selection.");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numbers_pick_one_based_entries() {
    assert_eq!(parse_choice("1", 3), Choice::Pick(0));
    assert_eq!(parse_choice(" 3 \n", 3), Choice::Pick(2));
  }

  #[test]
  fn exit_words_and_zero_leave() {
    assert_eq!(parse_choice("exit", 3), Choice::Exit);
    assert_eq!(parse_choice("EXIT", 3), Choice::Exit);
    assert_eq!(parse_choice("0", 3), Choice::Exit);
  }

  #[test]
  fn out_of_range_and_garbage_are_invalid() {
    assert_eq!(parse_choice("4", 3), Choice::Invalid);
    assert_eq!(parse_choice("-1", 3), Choice::Invalid);
    assert_eq!(parse_choice("physics", 3), Choice::Invalid);
    assert_eq!(parse_choice("", 3), Choice::Invalid);
  }
}
