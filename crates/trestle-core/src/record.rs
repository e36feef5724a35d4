//! Wire-format records as returned by the Trestle REST API.
//!
//! These mirror the JSON bodies one-to-one. They are converted into the
//! validated, immutable domain types with `TryFrom`; nothing else in the
//! workspace reads them directly except the geometry worker, which ships raw
//! records across its channel.

use serde::{Deserialize, Serialize};

use crate::{event::EventType, relation::RelationType};

/// `ITrestleTemporal`. Instants are kept as strings here; see
/// [`crate::temporal::parse_instant`] for the accepted formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRecord {
  #[serde(default, alias = "ID")]
  pub id:   String,
  #[serde(alias = "From", alias = "validFrom")]
  pub from: String,
  #[serde(default, alias = "To", alias = "validTo")]
  pub to:   Option<String>,
}

/// `ITrestleFact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRecord {
  pub identifier:        String,
  pub name:              String,
  #[serde(rename = "type")]
  pub fact_type:         String,
  pub value:             String,
  pub database_temporal: TemporalRecord,
  pub valid_temporal:    TemporalRecord,
}

/// `ITrestleRelation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
  pub subject:  String,
  pub object:   String,
  pub relation: RelationType,
}

/// `ITrestleEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
  pub individual: String,
  #[serde(rename = "type")]
  pub event_type: EventType,
  pub temporal:   String,
}

/// `ITrestleIndividual`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRecord {
  #[serde(rename = "individualID")]
  pub individual_id:   String,
  pub exists_temporal: TemporalRecord,
  #[serde(default)]
  pub facts:           Vec<FactRecord>,
  #[serde(default)]
  pub relations:       Vec<RelationRecord>,
  #[serde(default)]
  pub events:          Vec<EventRecord>,
}
