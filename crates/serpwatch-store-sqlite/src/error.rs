//! Error type for `serpwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] serpwatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored rank does not fit the domain type.
  #[error("invalid stored rank: {0}")]
  InvalidRank(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
