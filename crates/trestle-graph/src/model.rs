//! Graph output types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use trestle_core::event::EventType;

/// What a node stands for on the timeline.
///
/// The first five mirror real lifecycle events. `Continuing` stands in for
/// the end of an individual that still exists; `From`, `Into`, and
/// `Component` are synthetic nodes where a lane links to another lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeMarker {
  Created,
  Destroyed,
  Became,
  Split,
  Merged,
  Continuing,
  From,
  Into,
  Component,
}

impl NodeMarker {
  /// `From` and `Into` nodes; their count sizes the lane layout.
  pub fn is_crosslink(self) -> bool { matches!(self, Self::From | Self::Into) }

  /// Nodes that claim a lane for their individual.
  pub(crate) fn claims_lane(self) -> bool {
    matches!(self, Self::From | Self::Into | Self::Component)
  }
}

impl From<EventType> for NodeMarker {
  fn from(value: EventType) -> Self {
    match value {
      EventType::Created => Self::Created,
      EventType::Destroyed => Self::Destroyed,
      EventType::Became => Self::Became,
      EventType::Split => Self::Split,
      EventType::Merged => Self::Merged,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventNode {
  /// `{individual id}-{MARKER}`, unique within a graph.
  pub id:       String,
  /// Identifier of the individual this node belongs to.
  pub entity:   String,
  #[serde(rename = "value")]
  pub marker:   NodeMarker,
  pub temporal: DateTime<Utc>,
  /// 1-based lane index.
  pub bin:      u32,
}

impl EventNode {
  pub(crate) fn new(
    entity: &str,
    marker: NodeMarker,
    temporal: DateTime<Utc>,
  ) -> Self {
    Self {
      id: format!("{entity}-{marker}"),
      entity: entity.to_string(),
      marker,
      temporal,
      bin: 0,
    }
  }
}

/// A directed causal edge between two nodes, by node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLink {
  pub source: String,
  pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventGraph {
  pub nodes: Vec<EventNode>,
  pub links: Vec<EventLink>,
  /// Number of lanes the layout needs.
  pub bins:  u32,
}

impl EventGraph {
  pub fn node(&self, id: &str) -> Option<&EventNode> {
    self.nodes.iter().find(|n| n.id == id)
  }

  pub fn nodes_of<'a>(
    &'a self,
    entity: &'a str,
  ) -> impl Iterator<Item = &'a EventNode> + 'a {
    self.nodes.iter().filter(move |n| n.entity == entity)
  }

  pub fn has_link(&self, source: &str, target: &str) -> bool {
    self
      .links
      .iter()
      .any(|l| l.source == source && l.target == target)
  }
}
