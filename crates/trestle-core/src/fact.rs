//! Facts: named, bitemporal attribute values on an individual.
//!
//! Every fact carries two independent intervals: the *valid* temporal (when
//! the value was true in the world) and the *database* temporal (when the
//! system recorded it).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result, record::FactRecord, temporal::TrestleTemporal};

/// Name of the fact holding an individual's geometry as WKT.
pub const SPATIAL_FACT_NAME: &str = "asWKT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrestleFact {
  id:                String,
  name:              String,
  fact_type:         String,
  value:             String,
  database_temporal: TrestleTemporal,
  valid_temporal:    TrestleTemporal,
}

impl TrestleFact {
  pub fn new(
    id: impl Into<String>,
    name: impl Into<String>,
    fact_type: impl Into<String>,
    value: impl Into<String>,
    database_temporal: TrestleTemporal,
    valid_temporal: TrestleTemporal,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      fact_type: fact_type.into(),
      value: value.into(),
      database_temporal,
      valid_temporal,
    }
  }

  pub fn id(&self) -> &str { &self.id }

  pub fn name(&self) -> &str { &self.name }

  pub fn fact_type(&self) -> &str { &self.fact_type }

  pub fn value(&self) -> &str { &self.value }

  pub fn database_temporal(&self) -> &TrestleTemporal { &self.database_temporal }

  pub fn valid_temporal(&self) -> &TrestleTemporal { &self.valid_temporal }

  pub fn is_spatial(&self) -> bool { self.name == SPATIAL_FACT_NAME }

  /// True iff the value held in the real world at `at`.
  pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
    self.valid_temporal.is_active(at)
  }

  /// True iff the database considered this version current at `at`.
  pub fn is_current_at(&self, at: DateTime<Utc>) -> bool {
    self.database_temporal.is_active(at)
  }

  /// Total order used for an individual's fact list: identifier, then
  /// valid-from, then database-from.
  pub fn ordering(a: &Self, b: &Self) -> Ordering {
    a.id
      .cmp(&b.id)
      .then_with(|| a.valid_temporal.from().cmp(&b.valid_temporal.from()))
      .then_with(|| a.database_temporal.from().cmp(&b.database_temporal.from()))
  }
}

impl TryFrom<FactRecord> for TrestleFact {
  type Error = Error;

  fn try_from(record: FactRecord) -> Result<Self> {
    Ok(Self {
      database_temporal: record.database_temporal.try_into()?,
      valid_temporal:    record.valid_temporal.try_into()?,
      id:                record.identifier,
      name:              record.name,
      fact_type:         record.fact_type,
      value:             record.value,
    })
  }
}
