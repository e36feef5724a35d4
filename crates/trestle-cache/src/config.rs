//! Expiry and capacity settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Which timestamp an entry's age is measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryMode {
  /// Age since the value was last written.
  #[default]
  #[serde(rename = "write")]
  SinceWrite,
  /// Age since the value was last read or written.
  #[serde(rename = "read")]
  SinceRead,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
  pub max_age:     Duration,
  pub mode:        ExpiryMode,
  /// When set, the least-recently-used entry is evicted once the cache holds
  /// more than this many values.
  pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      max_age:     Duration::from_secs(30),
      mode:        ExpiryMode::SinceWrite,
      max_entries: None,
    }
  }
}

impl CacheConfig {
  pub fn with_max_age(mut self, max_age: Duration) -> Self {
    self.max_age = max_age;
    self
  }

  pub fn with_mode(mut self, mode: ExpiryMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_max_entries(mut self, max_entries: usize) -> Self {
    self.max_entries = Some(max_entries);
    self
  }

  pub(crate) fn is_expired(
    &self,
    written: Instant,
    touched: Instant,
    now: Instant,
  ) -> bool {
    let since = match self.mode {
      ExpiryMode::SinceWrite => written,
      ExpiryMode::SinceRead => touched,
    };
    now.saturating_duration_since(since) >= self.max_age
  }
}
