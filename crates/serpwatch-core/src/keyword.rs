//! Keywords — the search phrases whose rankings are tracked.
//!
//! A keyword's identity is its normalised phrase: surrounding whitespace is
//! trimmed, inner runs of whitespace collapse to a single space and the
//! phrase is lower-cased. Every read and write goes through
//! [`normalize_phrase`] so `"Rust  Books"` and `"rust books"` are one keyword.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Normalise a raw search phrase into its canonical keyword identity.
///
/// Returns [`Error::EmptyPhrase`] if nothing but whitespace remains.
pub fn normalize_phrase(raw: &str) -> Result<String> {
  let phrase = raw
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();
  if phrase.is_empty() {
    return Err(Error::EmptyPhrase);
  }
  Ok(phrase)
}

/// Normalise a list of raw phrases, dropping blanks and repeats. The first
/// occurrence of each keyword keeps its position.
pub fn normalize_keywords<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
  let mut seen = HashSet::new();
  raw
    .iter()
    .filter_map(|phrase| normalize_phrase(phrase.as_ref()).ok())
    .filter(|phrase| seen.insert(phrase.clone()))
    .collect()
}

// ─── Keyword ─────────────────────────────────────────────────────────────────

/// A catalogued keyword with its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
  pub phrase:     String,
  /// Free-form category used to select subsets of the catalog.
  pub genre:      Option<String>,
  /// The page the keyword is meant to rank, if known.
  pub url:        Option<String>,
  pub priority:   Option<String>,
  pub note:       Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── NewKeyword ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::KeywordCatalog::upsert_keyword`].
/// Timestamps are always set by the store.
#[derive(Debug, Clone, Default)]
pub struct NewKeyword {
  pub phrase:   String,
  pub genre:    Option<String>,
  pub url:      Option<String>,
  pub priority: Option<String>,
  pub note:     Option<String>,
}

impl NewKeyword {
  /// Convenience constructor with all optional fields unset.
  pub fn new(phrase: impl Into<String>) -> Self {
    Self { phrase: phrase.into(), ..Self::default() }
  }

  pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
    self.genre = Some(genre.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collapses_whitespace_and_case() {
    assert_eq!(normalize_phrase("  Rust \t  Books ").unwrap(), "rust books");
  }

  #[test]
  fn non_ascii_phrases_survive() {
    assert_eq!(normalize_phrase("東京　ラーメン").unwrap(), "東京 ラーメン");
  }

  #[test]
  fn blank_phrase_is_rejected() {
    assert!(matches!(normalize_phrase(" \n "), Err(Error::EmptyPhrase)));
  }

  #[test]
  fn keyword_lists_keep_first_occurrence_order() {
    let out = normalize_keywords(&["B", "a", "b", "   ", "A  ", "c"]);
    assert_eq!(out, vec!["b", "a", "c"]);
  }
}
