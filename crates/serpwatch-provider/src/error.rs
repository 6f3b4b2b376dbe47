//! Error type for `serpwatch-provider`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The response envelope carried a non-success status code.
  #[error("provider error {code}: {message}")]
  Api { code: u32, message: String },

  #[error("malformed response: {0}")]
  Malformed(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
