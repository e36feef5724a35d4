//! Error types for `trestle-client`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status.
  #[error("{path} returned {status}")]
  Status { path: String, status: StatusCode },

  #[error(transparent)]
  Core(#[from] trestle_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid token: {0}")]
  Token(String),

  #[error("not logged in")]
  NotAuthenticated,

  #[error("geometry worker has shut down")]
  WorkerGone,

  #[error("geometry worker dropped {0} responses before ours")]
  WorkerLagged(u64),

  #[error("invalid client configuration: {0}")]
  Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
