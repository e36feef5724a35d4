//! The `Individual` aggregate: a spatio-temporal entity with its facts,
//! relations, and lifecycle events.
//!
//! An individual is built once from an API record and never mutated. Every
//! derived view (start/end events, geometry, identifier helpers) is a pure
//! function over the owned state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  event::{EventType, TrestleEvent},
  fact::TrestleFact,
  id,
  record::IndividualRecord,
  relation::{LifecycleRelation, TrestleRelation},
  temporal::TrestleTemporal,
  wkt::{self, Geometry},
};

#[derive(Debug, Clone, Serialize)]
pub struct Individual {
  id:              String,
  exists_temporal: TrestleTemporal,
  /// Sorted by [`TrestleFact::ordering`].
  facts:           Vec<TrestleFact>,
  /// In the order the API returned them; lane assignment depends on it.
  relations:       Vec<TrestleRelation>,
  events:          Vec<TrestleEvent>,
}

impl Individual {
  pub fn new(
    id: impl Into<String>,
    exists_temporal: TrestleTemporal,
    mut facts: Vec<TrestleFact>,
    relations: Vec<TrestleRelation>,
    events: Vec<TrestleEvent>,
  ) -> Self {
    facts.sort_by(TrestleFact::ordering);
    Self {
      id: id.into(),
      exists_temporal,
      facts,
      relations,
      events,
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────

  pub fn id(&self) -> &str { &self.id }

  pub fn exists_temporal(&self) -> &TrestleTemporal { &self.exists_temporal }

  pub fn facts(&self) -> &[TrestleFact] { &self.facts }

  pub fn relations(&self) -> &[TrestleRelation] { &self.relations }

  pub fn events(&self) -> &[TrestleEvent] { &self.events }

  /// True iff the individual existed at `at`.
  pub fn is_active(&self, at: DateTime<Utc>) -> bool {
    self.exists_temporal.is_active(at)
  }

  // ── Facts ─────────────────────────────────────────────────────────────

  /// The first fact named `name` in fact order.
  pub fn fact<'a>(&'a self, name: &'a str) -> Option<&'a TrestleFact> {
    self.facts_named(name).next()
  }

  /// Every version of the fact named `name`.
  pub fn facts_named<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Iterator<Item = &'a TrestleFact> + 'a {
    self.facts.iter().filter(move |f| f.name() == name)
  }

  /// Facts whose valid interval contains `at`.
  pub fn facts_valid_at(
    &self,
    at: DateTime<Utc>,
  ) -> impl Iterator<Item = &TrestleFact> + '_ {
    self.facts.iter().filter(move |f| f.is_valid_at(at))
  }

  pub fn spatial_fact(&self) -> Option<&TrestleFact> {
    self.facts.iter().find(|f| f.is_spatial())
  }

  /// Parse the spatial fact's WKT. Fails with [`Error::NotSpatial`] when the
  /// individual has no `asWKT` fact.
  pub fn spatial_value(&self) -> Result<Geometry> {
    let fact = self
      .spatial_fact()
      .ok_or_else(|| Error::NotSpatial(self.id.clone()))?;
    Ok(wkt::parse(fact.value())?)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  fn event_of(&self, event_type: EventType) -> Option<&TrestleEvent> {
    self.events.iter().find(|e| e.event_type() == event_type)
  }

  /// The MERGED event if there is one, otherwise CREATED.
  pub fn start_event(&self) -> Result<&TrestleEvent> {
    self
      .event_of(EventType::Merged)
      .or_else(|| self.event_of(EventType::Created))
      .ok_or_else(|| Error::NoStartEvent(self.id.clone()))
  }

  /// The SPLIT event if there is one, otherwise DESTROYED. `None` means the
  /// individual still exists.
  pub fn end_event(&self) -> Option<&TrestleEvent> {
    self
      .event_of(EventType::Split)
      .or_else(|| self.event_of(EventType::Destroyed))
  }

  /// Relations of a lifecycle kind, in relation order.
  pub fn lifecycle_relations(
    &self,
  ) -> impl Iterator<Item = (LifecycleRelation, &TrestleRelation)> + '_ {
    self
      .relations
      .iter()
      .filter_map(|r| r.lifecycle().map(|kind| (kind, r)))
  }

  // ── Identifier helpers ────────────────────────────────────────────────

  pub fn filtered_id(&self) -> &str { id::filter_id(&self.id) }

  pub fn id_hash(&self) -> i32 { id::hash_id(&self.id) }

  pub fn hostname(&self) -> &str { id::extract_hostname(&self.id) }

  pub fn suffix(&self) -> &str { id::extract_suffix(&self.id) }
}

impl TryFrom<IndividualRecord> for Individual {
  type Error = Error;

  fn try_from(record: IndividualRecord) -> Result<Self> {
    let facts = record
      .facts
      .into_iter()
      .map(TrestleFact::try_from)
      .collect::<Result<Vec<_>>>()?;
    let events = record
      .events
      .into_iter()
      .map(TrestleEvent::try_from)
      .collect::<Result<Vec<_>>>()?;
    let relations = record.relations.into_iter().map(Into::into).collect();

    Ok(Self::new(
      record.individual_id,
      record.exists_temporal.try_into()?,
      facts,
      relations,
      events,
    ))
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::relation::RelationType;

  fn at(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
  }

  fn individual(events: &[(EventType, i32)], facts: Vec<TrestleFact>) -> Individual {
    Individual::new(
      "http://x.org/data#Alpha:2001",
      TrestleTemporal::new("exists", at(2001), None).unwrap(),
      facts,
      vec![
        TrestleRelation::new("a", "b", RelationType::Meets),
        TrestleRelation::new("a", "c", RelationType::SplitInto),
        TrestleRelation::new("a", "d", RelationType::ComponentWith),
      ],
      events
        .iter()
        .map(|(t, y)| TrestleEvent::new("a", *t, at(*y)))
        .collect(),
    )
  }

  fn wkt_fact(value: &str) -> TrestleFact {
    let t = TrestleTemporal::new("t", at(2001), None).unwrap();
    TrestleFact::new("f", "asWKT", "wktLiteral", value, t.clone(), t)
  }

  #[test]
  fn created_and_destroyed() {
    let i = individual(&[(EventType::Destroyed, 2005), (EventType::Created, 2001)], vec![]);
    assert_eq!(i.start_event().unwrap().event_type(), EventType::Created);
    assert_eq!(i.end_event().unwrap().event_type(), EventType::Destroyed);
    assert_eq!(i.end_event().unwrap().temporal(), at(2005));
  }

  #[test]
  fn merged_and_split_take_precedence() {
    let i = individual(
      &[
        (EventType::Created, 2001),
        (EventType::Merged, 2002),
        (EventType::Destroyed, 2010),
        (EventType::Split, 2008),
      ],
      vec![],
    );
    assert_eq!(i.start_event().unwrap().event_type(), EventType::Merged);
    assert_eq!(i.end_event().unwrap().event_type(), EventType::Split);
  }

  #[test]
  fn missing_start_event_fails() {
    let i = individual(&[(EventType::Destroyed, 2005)], vec![]);
    assert!(matches!(i.start_event(), Err(Error::NoStartEvent(id)) if id == i.id()));
  }

  #[test]
  fn no_end_event_means_still_existing() {
    let i = individual(&[(EventType::Created, 2001)], vec![]);
    assert!(i.end_event().is_none());
  }

  #[test]
  fn fact_lookup_by_name() {
    let i = individual(&[], vec![wkt_fact("POINT (1 2)"), wkt_fact("POINT (3 4)")]);
    let name = String::from("asWKT");
    assert_eq!(i.fact(&name).map(|f| f.name()), Some("asWKT"));
    assert_eq!(i.facts_named(&name).count(), 2);
    assert!(i.fact("population").is_none());
  }

  #[test]
  fn spatial_value_parses_wkt() {
    let i = individual(&[], vec![wkt_fact("POINT (1 2)")]);
    assert_eq!(i.spatial_value().unwrap().kind(), "POINT");
  }

  #[test]
  fn spatial_value_without_fact_is_not_spatial() {
    let i = individual(&[], vec![]);
    assert!(matches!(i.spatial_value(), Err(Error::NotSpatial(_))));
  }

  #[test]
  fn bad_wkt_surfaces_as_wkt_error() {
    let i = individual(&[], vec![wkt_fact("POINT (1")]);
    assert!(matches!(i.spatial_value(), Err(Error::Wkt(_))));
  }

  #[test]
  fn lifecycle_relations_keep_order() {
    let i = individual(&[], vec![]);
    let kinds: Vec<_> = i.lifecycle_relations().map(|(k, r)| (k, r.object())).collect();
    assert_eq!(kinds, vec![
      (LifecycleRelation::SplitInto, "c"),
      (LifecycleRelation::ComponentWith, "d"),
    ]);
  }

  #[test]
  fn identifier_helpers() {
    let i = individual(&[], vec![]);
    assert_eq!(i.filtered_id(), "Alpha");
    assert_eq!(i.hostname(), "http://x.org");
    assert_eq!(i.suffix(), "Alpha:2001");
    assert_eq!(i.id_hash(), id::hash_id("http://x.org/data#Alpha:2001"));
  }

  #[test]
  fn builds_from_record() {
    let record: IndividualRecord = serde_json::from_value(serde_json::json!({
      "individualID": "http://x.org/data#Beta",
      "existsTemporal": { "id": "e", "from": "2001-01-01", "to": "2004-01-01" },
      "facts": [],
      "relations": [{ "subject": "Beta", "object": "Gamma", "relation": "MERGED_INTO" }],
      "events": [
        { "individual": "Beta", "type": "CREATED", "temporal": "2001-01-01" },
        { "individual": "Beta", "type": "DESTROYED", "temporal": "2004-01-01" }
      ]
    }))
    .unwrap();

    let i = Individual::try_from(record).unwrap();
    assert!(i.is_active(at(2002)));
    assert!(!i.is_active(at(2004)));
    assert_eq!(i.relations().len(), 1);
    assert_eq!(i.events().len(), 2);
  }

  #[test]
  fn record_with_bad_timestamp_is_rejected() {
    let record: IndividualRecord = serde_json::from_value(serde_json::json!({
      "individualID": "x",
      "existsTemporal": { "id": "e", "from": "yesterday" }
    }))
    .unwrap();
    assert!(matches!(
      Individual::try_from(record),
      Err(Error::InvalidTimestamp(_))
    ));
  }
}
