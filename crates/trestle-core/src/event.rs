//! Lifecycle events: the instants at which an individual starts, changes,
//! or stops existing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result, record::EventRecord, temporal::parse_instant};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
  Created,
  Destroyed,
  Became,
  Split,
  Merged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrestleEvent {
  individual: String,
  event_type: EventType,
  temporal:   DateTime<Utc>,
}

impl TrestleEvent {
  pub fn new(
    individual: impl Into<String>,
    event_type: EventType,
    temporal: DateTime<Utc>,
  ) -> Self {
    Self {
      individual: individual.into(),
      event_type,
      temporal,
    }
  }

  pub fn individual(&self) -> &str { &self.individual }

  pub fn event_type(&self) -> EventType { self.event_type }

  pub fn temporal(&self) -> DateTime<Utc> { self.temporal }
}

impl TryFrom<EventRecord> for TrestleEvent {
  type Error = Error;

  fn try_from(record: EventRecord) -> Result<Self> {
    Ok(Self::new(
      record.individual,
      record.event_type,
      parse_instant(&record.temporal)?,
    ))
  }
}
