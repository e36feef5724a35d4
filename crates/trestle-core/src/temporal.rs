//! Half-open time intervals.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::{Error, Result, record::TemporalRecord};

/// Parse a wire instant.
///
/// Accepts RFC 3339 (`2016-01-01T00:00:00Z`), a naive date-time
/// (`2016-01-01T00:00:00`, read as UTC), or a bare date (`2016-01-01`,
/// midnight UTC).
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
    return Ok(naive.and_utc());
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    && let Some(naive) = date.and_hms_opt(0, 0, 0)
  {
    return Ok(naive.and_utc());
  }
  Err(Error::InvalidTimestamp(raw.to_string()))
}

/// The interval `[from, to)`. A missing `to` means the interval is still
/// open ("continuing").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrestleTemporal {
  id:   String,
  from: DateTime<Utc>,
  to:   Option<DateTime<Utc>>,
}

impl TrestleTemporal {
  /// Fails with [`Error::InvalidInterval`] unless `to` is strictly after
  /// `from`.
  pub fn new(
    id: impl Into<String>,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
  ) -> Result<Self> {
    let id = id.into();
    if let Some(to) = to
      && to <= from
    {
      return Err(Error::InvalidInterval { id, from, to });
    }
    Ok(Self { id, from, to })
  }

  pub fn id(&self) -> &str { &self.id }

  pub fn from(&self) -> DateTime<Utc> { self.from }

  pub fn to(&self) -> Option<DateTime<Utc>> { self.to }

  pub fn is_continuing(&self) -> bool { self.to.is_none() }

  /// True iff `from <= at` and the interval has not closed by `at`.
  pub fn is_active(&self, at: DateTime<Utc>) -> bool {
    self.from <= at && self.to.is_none_or(|to| at < to)
  }
}

impl TryFrom<TemporalRecord> for TrestleTemporal {
  type Error = Error;

  fn try_from(record: TemporalRecord) -> Result<Self> {
    let from = parse_instant(&record.from)?;
    let to = record.to.as_deref().map(parse_instant).transpose()?;
    Self::new(record.id, from, to)
  }
}
