//! The `RankHistoryStore` and `KeywordCatalog` traits.
//!
//! Both are implemented by storage backends (e.g. `serpwatch-store-sqlite`).
//! The check engine depends on these abstractions, not on any concrete
//! backend. Keyword phrases passed in are normalised by the backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  history::{CompetitorSnapshot, KeywordStatus, RankRecord},
  keyword::{Keyword, NewKeyword},
  observation::RankObservation,
};

// ─── Rank history ────────────────────────────────────────────────────────────

/// Durable "last known rank" per keyword plus historical competitor rows.
///
/// Nothing is ever deleted implicitly; only
/// [`KeywordCatalog::delete_keyword`] removes history.
pub trait RankHistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The record written by the most recent commit for `keyword`, if any.
  fn get_previous<'a>(
    &'a self,
    keyword: &'a str,
  ) -> impl Future<Output = Result<Option<RankRecord>, Self::Error>> + Send + 'a;

  /// Overwrite the keyword's [`RankRecord`] and append one competitor row per
  /// competitor, atomically.
  ///
  /// Idempotent for a repeated `(keyword, checked_at)`: the record is
  /// rewritten with the same values and competitor rows are collapsed on
  /// `(keyword, url, checked_at)`.
  fn commit<'a>(
    &'a self,
    keyword: &'a str,
    observation: &'a RankObservation,
    checked_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every current rank record, ordered by keyword.
  fn list_records(
    &self,
  ) -> impl Future<Output = Result<Vec<RankRecord>, Self::Error>> + Send + '_;

  /// The competitor rows of the most recent snapshot for `keyword`, best rank
  /// first, at most `limit` of them.
  fn latest_competitors<'a>(
    &'a self,
    keyword: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<CompetitorSnapshot>, Self::Error>> + Send + 'a;
}

// ─── Keyword catalog ─────────────────────────────────────────────────────────

/// The set of keywords a check runs over by default.
pub trait KeywordCatalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert or update one keyword. `created_at` survives updates.
  fn upsert_keyword(
    &self,
    input: NewKeyword,
  ) -> impl Future<Output = Result<Keyword, Self::Error>> + Send + '_;

  /// Insert or update many keywords in a single transaction and return how
  /// many were written. Blank phrases are skipped.
  fn upsert_keywords(
    &self,
    inputs: Vec<NewKeyword>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn get_keyword<'a>(
    &'a self,
    phrase: &'a str,
  ) -> impl Future<Output = Result<Option<Keyword>, Self::Error>> + Send + 'a;

  /// All keywords ordered by phrase, optionally restricted to one genre.
  fn list_keywords<'a>(
    &'a self,
    genre: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Keyword>, Self::Error>> + Send + 'a;

  /// Distinct non-null genres, sorted.
  fn list_genres(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Remove a keyword together with its rank record and competitor history.
  /// Returns `false` if nothing was catalogued under that phrase.
  fn delete_keyword<'a>(
    &'a self,
    phrase: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Catalogued keywords joined with their last known ranking.
  fn keywords_with_rankings<'a>(
    &'a self,
    genre: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<KeywordStatus>, Self::Error>> + Send + 'a;
}
