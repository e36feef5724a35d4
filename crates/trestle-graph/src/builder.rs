//! [`build_event_graph`]: assembling the lifecycle graph of one individual
//! and its split/merge partners.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use futures::future::try_join_all;
use tracing::{debug, instrument};
use trestle_core::{
  Error, Individual, IndividualSource,
  relation::{Direction, LifecycleRelation},
};

use crate::{
  GraphError,
  bins::assign_bins,
  model::{EventGraph, EventLink, EventNode, NodeMarker},
};

/// Stand-in end time for individuals that still exist.
fn continuing_until() -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(3001, 1, 1, 0, 0, 0)
    .single()
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// How far `From`/`Into` nodes sit inside their individual's lifetime, so a
/// cross-link never draws on top of the start or end node.
fn crosslink_offset() -> TimeDelta { TimeDelta::days(1) }

/// `at` pulled back by the cross-link offset, or `at` itself at the edge of
/// the representable range.
fn before(at: DateTime<Utc>) -> DateTime<Utc> {
  at.checked_sub_signed(crosslink_offset()).unwrap_or(at)
}

fn after(at: DateTime<Utc>) -> DateTime<Utc> {
  at.checked_add_signed(crosslink_offset()).unwrap_or(at)
}

// ─── Node helpers ────────────────────────────────────────────────────────────

fn start_node(individual: &Individual) -> Result<EventNode, Error> {
  let event = individual.start_event()?;
  Ok(EventNode::new(individual.id(), event.event_type().into(), event.temporal()))
}

/// The SPLIT/DESTROYED node, or a `Continuing` node far in the future.
fn end_node(individual: &Individual) -> EventNode {
  match individual.end_event() {
    Some(event) => {
      EventNode::new(individual.id(), event.event_type().into(), event.temporal())
    }
    None => EventNode::new(individual.id(), NodeMarker::Continuing, continuing_until()),
  }
}

fn link(source: &EventNode, target: &str) -> EventLink {
  EventLink {
    source: source.id.clone(),
    target: target.to_string(),
  }
}

// ─── Fragments ───────────────────────────────────────────────────────────────

/// The nodes and links one related individual contributes.
struct Fragment {
  nodes:  Vec<EventNode>,
  links:  Vec<EventLink>,
  /// Node id later siblings attach to when this individual is the partner of
  /// a component group.
  anchor: String,
}

/// Describe `individual` as the holder of `relation`, linked onto the node
/// `anchor` of the individual it relates to.
fn attach(
  individual: &Individual,
  relation: LifecycleRelation,
  anchor: &str,
) -> Result<Fragment, Error> {
  let started = start_node(individual)?;
  let id = individual.id();

  let fragment = match relation.direction() {
    // Came out of the anchor's individual: runs from its start to an `Into`
    // node just before it ends, which points back at the anchor.
    Direction::From => {
      let ends_at = individual
        .end_event()
        .map_or_else(continuing_until, |e| e.temporal());
      let into = EventNode::new(id, NodeMarker::Into, before(ends_at));
      Fragment {
        links:  vec![link(&started, &into.id), link(&into, anchor)],
        anchor: started.id.clone(),
        nodes:  vec![started, into],
      }
    }
    // Went into the anchor's individual, so it must have ended.
    Direction::Into => {
      let ended = individual
        .end_event()
        .ok_or_else(|| Error::NoEndEvent(id.to_string()))?;
      let ended =
        EventNode::new(id, ended.event_type().into(), ended.temporal());
      let from = EventNode::new(id, NodeMarker::From, after(started.temporal));
      Fragment {
        links:  vec![link(&from, &ended.id), link(&from, anchor)],
        anchor: ended.id.clone(),
        nodes:  vec![from, ended],
      }
    }
    Direction::Component => {
      let component = EventNode::new(id, NodeMarker::Component, started.temporal);
      let ended = end_node(individual);
      Fragment {
        links:  vec![link(&component, &ended.id), link(&component, anchor)],
        anchor: component.id.clone(),
        nodes:  vec![component, ended],
      }
    }
  };
  Ok(fragment)
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the lifecycle graph of `focal`, fetching its lifecycle partners
/// from `source`.
///
/// The focal individual always contributes its start and end nodes. Each
/// split/merge partner is described from its own side of the relation and
/// linked onto the focal's start or end. When the focal is one component of
/// a split or merge, the individual it split from or merged into is placed
/// first and every other partner hangs off that individual instead.
///
/// Partners are fetched concurrently; any lifecycle error or fetch failure
/// aborts the whole build.
#[instrument(skip_all, fields(focal = focal.id()))]
pub async fn build_event_graph<S: IndividualSource>(
  source: &S,
  focal: &Individual,
) -> Result<EventGraph, GraphError<S::Error>> {
  let started = start_node(focal)?;
  let ended = end_node(focal);

  let mut graph = EventGraph {
    links: vec![link(&started, &ended.id)],
    nodes: vec![started.clone(), ended.clone()],
    bins:  0,
  };

  let relations: Vec<(LifecycleRelation, &str)> = focal
    .lifecycle_relations()
    .map(|(kind, r)| (kind, r.object()))
    .collect();

  // The focal node a partner links to, given the relation the partner holds.
  let focal_anchor = |held: LifecycleRelation| match held.direction() {
    Direction::From => ended.id.clone(),
    Direction::Into | Direction::Component => started.id.clone(),
  };

  let mut seen: HashSet<&str> = HashSet::from([focal.id()]);

  // A component group is laid out around the individual the focal split
  // from or merged into.
  let partner = if relations.iter().any(|(k, _)| *k == LifecycleRelation::ComponentWith) {
    relations
      .iter()
      .find(|(k, id)| *k != LifecycleRelation::ComponentWith && *id != focal.id())
      .copied()
  } else {
    None
  };

  let mut root: Option<(LifecycleRelation, String)> = None;
  if let Some((kind, id)) = partner {
    debug!(partner = id, relation = %kind, "laying out component group");
    let individual = source.individual(id).await.map_err(GraphError::Fetch)?;
    let held = kind.inverse();
    let fragment = attach(&individual, held, &focal_anchor(held))?;
    seen.insert(id);
    graph.nodes.extend(fragment.nodes);
    graph.links.extend(fragment.links);
    root = Some((kind, fragment.anchor));
  }

  let pending: Vec<(LifecycleRelation, &str)> = relations
    .iter()
    .filter(|(_, id)| seen.insert(*id))
    .copied()
    .collect();
  debug!(count = pending.len(), "fetching related individuals");

  let related =
    try_join_all(pending.iter().map(|&(_, id)| source.individual(id)))
      .await
      .map_err(GraphError::Fetch)?;

  for (&(kind, _), individual) in pending.iter().zip(&related) {
    let (held, anchor) = match (&root, kind) {
      // Siblings came out of (or went into) the same individual the focal
      // did, so they hold the focal's own relation towards it.
      (Some((partner_kind, root_anchor)), LifecycleRelation::ComponentWith) => {
        (*partner_kind, root_anchor.clone())
      }
      (Some((_, root_anchor)), other) => (other.inverse(), root_anchor.clone()),
      (None, other) => {
        let held = other.inverse();
        (held, focal_anchor(held))
      }
    };
    let fragment = attach(individual, held, &anchor)?;
    graph.nodes.extend(fragment.nodes);
    graph.links.extend(fragment.links);
  }

  graph.bins = assign_bins(&mut graph.nodes, focal.id());
  debug!(
    nodes = graph.nodes.len(),
    links = graph.links.len(),
    bins = graph.bins,
    "built event graph"
  );
  Ok(graph)
}
