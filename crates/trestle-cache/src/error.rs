//! Error type for `trestle-cache`.

use std::sync::Arc;

use thiserror::Error;

/// Why a cache lookup produced no value. `E` is the error type of the
/// fallback fetch.
#[derive(Debug, Error)]
pub enum CacheError<E> {
  /// No fresh entry, no fetch in flight, and no fallback was supplied.
  #[error("no cached or in-flight value for key")]
  Miss,

  /// The fetch failed. Every caller waiting on it receives the same error.
  #[error("fetch failed: {0}")]
  Fetch(Arc<E>),

  /// The caller driving the fetch was dropped before it settled.
  #[error("in-flight fetch was dropped before it settled")]
  Abandoned,
}

impl<E> CacheError<E> {
  /// The underlying fetch error, if this is [`CacheError::Fetch`].
  pub fn fetch_error(&self) -> Option<&E> {
    match self {
      Self::Fetch(e) => Some(e.as_ref()),
      _ => None,
    }
  }
}
