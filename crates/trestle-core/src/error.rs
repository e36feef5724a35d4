//! Error types for `trestle-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::wkt::WktError;

#[derive(Debug, Error)]
pub enum Error {
  /// The individual has neither a MERGED nor a CREATED event.
  #[error("individual {0} has no start event")]
  NoStartEvent(String),

  /// The individual was expected to have ended (SPLIT or DESTROYED) but has
  /// no end event.
  #[error("individual {0} has no end event")]
  NoEndEvent(String),

  #[error("individual {0} has no spatial fact")]
  NotSpatial(String),

  #[error("temporal {id}: end {to} is not after start {from}")]
  InvalidInterval {
    id:   String,
    from: DateTime<Utc>,
    to:   DateTime<Utc>,
  },

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("wkt error: {0}")]
  Wkt(#[from] WktError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
