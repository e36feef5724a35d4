//! Graph construction against an in-memory individual source.

use std::{
  collections::HashMap,
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use thiserror::Error;
use trestle_core::{
  Individual, IndividualSource,
  event::{EventType, TrestleEvent},
  relation::{RelationType, TrestleRelation},
  temporal::TrestleTemporal,
};

use crate::{EventGraph, GraphError, NodeMarker, build_event_graph};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no such individual: {0}")]
struct NotFound(String);

#[derive(Default)]
struct MapSource {
  individuals: HashMap<String, Arc<Individual>>,
  fetches:     AtomicUsize,
}

impl MapSource {
  fn with(mut self, individual: Individual) -> Self {
    self
      .individuals
      .insert(individual.id().to_string(), Arc::new(individual));
    self
  }

  fn fetches(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
}

impl IndividualSource for MapSource {
  type Error = NotFound;

  fn individual<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Arc<Individual>, NotFound>> + Send + 'a {
    async move {
      self.fetches.fetch_add(1, Ordering::SeqCst);
      self
        .individuals
        .get(id)
        .cloned()
        .ok_or_else(|| NotFound(id.to_string()))
    }
  }
}

fn at(year: i32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
}

fn individual(
  id: &str,
  events: &[(EventType, i32)],
  relations: &[(RelationType, &str)],
) -> Individual {
  let from = events.iter().map(|(_, y)| at(*y)).min().unwrap_or(at(2000));
  Individual::new(
    id,
    TrestleTemporal::new(format!("{id}:exists"), from, None).unwrap(),
    Vec::new(),
    relations
      .iter()
      .map(|(kind, object)| TrestleRelation::new(id, *object, *kind))
      .collect(),
    events
      .iter()
      .map(|(kind, year)| TrestleEvent::new(id, *kind, at(*year)))
      .collect(),
  )
}

fn lane(graph: &EventGraph, entity: &str) -> u32 {
  let bins: Vec<_> = graph.nodes_of(entity).map(|n| n.bin).collect();
  assert!(!bins.is_empty(), "no nodes for {entity}");
  assert!(bins.iter().all(|b| *b == bins[0]), "{entity} spans lanes");
  bins[0]
}

fn ids(graph: &EventGraph) -> Vec<&str> {
  graph.nodes.iter().map(|n| n.id.as_str()).collect()
}

use EventType::{Created, Destroyed, Merged, Split};
use RelationType::{ComponentWith, MergedFrom, MergedInto, Meets, SplitFrom, SplitInto};

// ─── Isolated individuals ────────────────────────────────────────────────────

#[tokio::test]
async fn isolated_individual_spans_start_to_end() {
  let source = MapSource::default();
  let a = individual("A", &[(Created, 2000), (Destroyed, 2010)], &[]);

  let graph = build_event_graph(&source, &a).await.unwrap();

  assert_eq!(ids(&graph), vec!["A-CREATED", "A-DESTROYED"]);
  assert_eq!(graph.links.len(), 1);
  assert!(graph.has_link("A-CREATED", "A-DESTROYED"));
  assert_eq!(graph.bins, 3);
  assert_eq!(lane(&graph, "A"), 2);
  assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn existing_individual_ends_in_continuing_node() {
  let source = MapSource::default();
  let a = individual("A", &[(Created, 2000)], &[]);

  let graph = build_event_graph(&source, &a).await.unwrap();

  let end = graph.node("A-CONTINUING").unwrap();
  assert_eq!(end.marker, NodeMarker::Continuing);
  assert_eq!(end.temporal, at(3001));
}

#[tokio::test]
async fn spatial_relations_do_not_join_the_graph() {
  let source = MapSource::default();
  let a = individual("A", &[(Created, 2000)], &[(Meets, "B")]);

  let graph = build_event_graph(&source, &a).await.unwrap();
  assert_eq!(graph.nodes.len(), 2);
  assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn merged_start_takes_precedence_over_created() {
  let source = MapSource::default();
  let a = individual("A", &[(Created, 2000), (Merged, 2001)], &[]);

  let graph = build_event_graph(&source, &a).await.unwrap();
  assert_eq!(ids(&graph), vec!["A-MERGED", "A-CONTINUING"]);
}

// ─── Splits and merges ───────────────────────────────────────────────────────

#[tokio::test]
async fn split_successor_links_back_to_focal_end() {
  let source = MapSource::default().with(individual(
    "B",
    &[(Created, 2010)],
    &[(SplitFrom, "A")],
  ));
  let a = individual("A", &[(Created, 2000), (Split, 2010)], &[(SplitInto, "B")]);

  let graph = build_event_graph(&source, &a).await.unwrap();

  assert_eq!(ids(&graph), vec!["A-CREATED", "A-SPLIT", "B-CREATED", "B-INTO"]);
  assert_eq!(graph.links.len(), 3);
  assert!(graph.has_link("A-CREATED", "A-SPLIT"));
  assert!(graph.has_link("B-CREATED", "B-INTO"));
  assert!(graph.has_link("B-INTO", "A-SPLIT"));

  assert_eq!(graph.bins, 3);
  assert_eq!(lane(&graph, "A"), 2);
  assert_eq!(lane(&graph, "B"), 3);

  let into = graph.node("B-INTO").unwrap();
  assert_eq!(into.marker, NodeMarker::Into);
  assert_eq!(into.temporal, at(3001) - TimeDelta::days(1));
  assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn merge_predecessor_links_onto_focal_start() {
  let source = MapSource::default().with(individual(
    "P",
    &[(Created, 2000), (Destroyed, 2005)],
    &[(MergedInto, "M")],
  ));
  let m = individual("M", &[(Merged, 2005)], &[(MergedFrom, "P")]);

  let graph = build_event_graph(&source, &m).await.unwrap();

  assert!(graph.has_link("P-FROM", "P-DESTROYED"));
  assert!(graph.has_link("P-FROM", "M-MERGED"));
  let from = graph.node("P-FROM").unwrap();
  assert_eq!(from.marker, NodeMarker::From);
  assert_eq!(from.temporal, at(2000) + TimeDelta::days(1));
}

#[tokio::test]
async fn two_successors_straddle_the_focal_lane() {
  let source = MapSource::default()
    .with(individual("B", &[(Created, 2010)], &[]))
    .with(individual("C", &[(Created, 2010)], &[]));
  let a = individual(
    "A",
    &[(Created, 2000), (Split, 2010)],
    &[(SplitInto, "B"), (SplitInto, "C")],
  );

  let graph = build_event_graph(&source, &a).await.unwrap();

  assert_eq!(graph.bins, 3);
  assert_eq!(lane(&graph, "A"), 2);
  assert_eq!(lane(&graph, "B"), 3);
  assert_eq!(lane(&graph, "C"), 1);
}

#[tokio::test]
async fn four_successors_fan_out_in_relation_order() {
  let names = ["B", "C", "D", "E"];
  let source = names.iter().fold(MapSource::default(), |s, n| {
    s.with(individual(n, &[(Created, 2010)], &[]))
  });
  let relations: Vec<_> = names.iter().map(|n| (SplitInto, *n)).collect();
  let a = individual("A", &[(Created, 2000), (Split, 2010)], &relations);

  let graph = build_event_graph(&source, &a).await.unwrap();

  assert_eq!(graph.bins, 5);
  assert_eq!(lane(&graph, "A"), 3);
  let lanes: Vec<_> = names.iter().map(|n| lane(&graph, n)).collect();
  assert_eq!(lanes, vec![4, 2, 5, 1]);
}

#[tokio::test]
async fn repeated_and_self_relations_are_skipped() {
  let source =
    MapSource::default().with(individual("B", &[(Created, 2010)], &[]));
  let a = individual(
    "A",
    &[(Created, 2000), (Split, 2010)],
    &[(SplitInto, "B"), (SplitInto, "A"), (SplitInto, "B")],
  );

  let graph = build_event_graph(&source, &a).await.unwrap();
  assert_eq!(graph.nodes.len(), 4);
  assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn crosslinks_at_the_edge_of_time_stay_in_range() {
  let edge = |id: &str, when: DateTime<Utc>, kind: RelationType, object: &str| {
    Individual::new(
      id,
      TrestleTemporal::new(format!("{id}:exists"), when, None).unwrap(),
      Vec::new(),
      vec![TrestleRelation::new(id, object, kind)],
      vec![
        TrestleEvent::new(id, Created, when),
        TrestleEvent::new(id, Destroyed, when),
      ],
    )
  };
  let min = DateTime::<Utc>::MIN_UTC;
  let max = DateTime::<Utc>::MAX_UTC;

  let source = MapSource::default().with(edge("B", min, SplitFrom, "A"));
  let a = individual("A", &[(Created, 2000), (Split, 2010)], &[(SplitInto, "B")]);
  let graph = build_event_graph(&source, &a).await.unwrap();
  assert_eq!(graph.node("B-INTO").unwrap().temporal, min);

  let source = MapSource::default().with(edge("P", max, MergedInto, "M"));
  let m = individual("M", &[(Merged, 2005)], &[(MergedFrom, "P")]);
  let graph = build_event_graph(&source, &m).await.unwrap();
  assert_eq!(graph.node("P-FROM").unwrap().temporal, max);
}

// ─── Component groups ────────────────────────────────────────────────────────

#[tokio::test]
async fn component_siblings_hang_off_the_shared_parent() {
  let source = MapSource::default()
    .with(individual(
      "P",
      &[(Created, 2000), (Split, 2010)],
      &[(SplitInto, "X"), (SplitInto, "Y")],
    ))
    .with(individual("Y", &[(Created, 2010)], &[(SplitFrom, "P")]));
  let x = individual(
    "X",
    &[(Created, 2010)],
    &[(ComponentWith, "Y"), (SplitFrom, "P")],
  );

  let graph = build_event_graph(&source, &x).await.unwrap();

  assert_eq!(ids(&graph), vec![
    "X-CREATED",
    "X-CONTINUING",
    "P-FROM",
    "P-SPLIT",
    "Y-CREATED",
    "Y-INTO",
  ]);
  // Parent is laid out against the focal start.
  assert!(graph.has_link("P-FROM", "P-SPLIT"));
  assert!(graph.has_link("P-FROM", "X-CREATED"));
  // The sibling joins the parent's split, not the focal.
  assert!(graph.has_link("Y-CREATED", "Y-INTO"));
  assert!(graph.has_link("Y-INTO", "P-SPLIT"));
  assert_eq!(graph.links.len(), 5);
  assert_eq!(source.fetches(), 2);

  assert_eq!(graph.bins, 3);
  assert_eq!(lane(&graph, "P"), 3);
  assert_eq!(lane(&graph, "Y"), 1);
}

#[tokio::test]
async fn component_without_parent_anchors_on_focal_start() {
  let source =
    MapSource::default().with(individual("Y", &[(Created, 2010)], &[]));
  let x = individual("X", &[(Created, 2010)], &[(ComponentWith, "Y")]);

  let graph = build_event_graph(&source, &x).await.unwrap();

  assert!(graph.has_link("Y-COMPONENT", "Y-CONTINUING"));
  assert!(graph.has_link("Y-COMPONENT", "X-CREATED"));
  assert_eq!(graph.node("Y-COMPONENT").unwrap().temporal, at(2010));
  assert_eq!(graph.bins, 3);
  assert_eq!(lane(&graph, "Y"), 3);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn focal_without_start_event_fails() {
  let source = MapSource::default();
  let a = individual("A", &[(Destroyed, 2010)], &[]);

  let err = build_event_graph(&source, &a).await.unwrap_err();
  assert!(matches!(
    err,
    GraphError::Lifecycle(trestle_core::Error::NoStartEvent(id)) if id == "A"
  ));
}

#[tokio::test]
async fn related_without_start_event_fails() {
  let source =
    MapSource::default().with(individual("B", &[(Destroyed, 2012)], &[]));
  let a = individual("A", &[(Created, 2000), (Split, 2010)], &[(SplitInto, "B")]);

  let err = build_event_graph(&source, &a).await.unwrap_err();
  assert!(matches!(
    err,
    GraphError::Lifecycle(trestle_core::Error::NoStartEvent(id)) if id == "B"
  ));
}

#[tokio::test]
async fn predecessor_without_end_event_fails() {
  let source = MapSource::default().with(individual("P", &[(Created, 2000)], &[]));
  let m = individual("M", &[(Merged, 2005)], &[(MergedFrom, "P")]);

  let err = build_event_graph(&source, &m).await.unwrap_err();
  assert!(matches!(
    err,
    GraphError::Lifecycle(trestle_core::Error::NoEndEvent(id)) if id == "P"
  ));
}

#[tokio::test]
async fn fetch_failure_aborts_the_build() {
  let source = MapSource::default().with(individual("B", &[(Created, 2010)], &[]));
  let a = individual(
    "A",
    &[(Created, 2000), (Split, 2010)],
    &[(SplitInto, "B"), (SplitInto, "missing")],
  );

  let err = build_event_graph(&source, &a).await.unwrap_err();
  assert!(matches!(err, GraphError::Fetch(NotFound(id)) if id == "missing"));
}

// ─── Serialization ───────────────────────────────────────────────────────────

#[tokio::test]
async fn graph_serializes_for_the_timeline_view() {
  let source = MapSource::default().with(individual("B", &[(Created, 2010)], &[]));
  let a = individual("A", &[(Created, 2000), (Split, 2010)], &[(SplitInto, "B")]);

  let graph = build_event_graph(&source, &a).await.unwrap();
  let json = serde_json::to_value(&graph).unwrap();

  assert_eq!(json["bins"], 3);
  assert_eq!(json["nodes"][3]["id"], "B-INTO");
  assert_eq!(json["nodes"][3]["value"], "into");
  assert_eq!(json["nodes"][3]["entity"], "B");
  assert_eq!(json["nodes"][3]["bin"], 3);
  assert_eq!(json["links"][2]["source"], "B-INTO");
  assert_eq!(json["links"][2]["target"], "A-SPLIT");
}
