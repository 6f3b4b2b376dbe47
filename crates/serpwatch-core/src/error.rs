//! Error types for `serpwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("keyword phrase is empty after normalisation")]
  EmptyPhrase,

  #[error("unknown device: {0:?}")]
  UnknownDevice(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
