//! Typed, directed relations between individuals.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::record::RelationRecord;

// ─── Relation types ──────────────────────────────────────────────────────────

/// Every relation kind the API emits. The wire and display names are the
/// `SCREAMING_SNAKE_CASE` forms (`SPLIT_INTO`, `TEMPORAL_OVERLAPS`, …).
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
pub enum RelationType {
  // ── Spatial ─────────────────────────────────────────────────────────────
  Contains,
  Covers,
  Disjoint,
  Equals,
  Inside,
  Meets,
  SpatialOverlaps,

  // ── Temporal ────────────────────────────────────────────────────────────
  After,
  Before,
  Begins,
  During,
  Ends,
  TemporalOverlaps,

  // ── Lifecycle ───────────────────────────────────────────────────────────
  SplitInto,
  SplitFrom,
  MergedInto,
  MergedFrom,
  ComponentWith,
}

impl RelationType {
  pub fn is_spatial(self) -> bool {
    matches!(
      self,
      Self::Contains
        | Self::Covers
        | Self::Disjoint
        | Self::Equals
        | Self::Inside
        | Self::Meets
        | Self::SpatialOverlaps
    )
  }

  pub fn is_temporal(self) -> bool {
    matches!(
      self,
      Self::After
        | Self::Before
        | Self::Begins
        | Self::During
        | Self::Ends
        | Self::TemporalOverlaps
    )
  }

  /// Narrow to the lifecycle subset, or `None` for spatial and temporal
  /// relations.
  pub fn lifecycle(self) -> Option<LifecycleRelation> {
    match self {
      Self::SplitInto => Some(LifecycleRelation::SplitInto),
      Self::SplitFrom => Some(LifecycleRelation::SplitFrom),
      Self::MergedInto => Some(LifecycleRelation::MergedInto),
      Self::MergedFrom => Some(LifecycleRelation::MergedFrom),
      Self::ComponentWith => Some(LifecycleRelation::ComponentWith),
      _ => None,
    }
  }
}

// ─── Lifecycle subset ────────────────────────────────────────────────────────

/// The five relation kinds that shape an individual's lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleRelation {
  SplitInto,
  SplitFrom,
  MergedInto,
  MergedFrom,
  ComponentWith,
}

/// Which way a lifecycle relation points in time, as seen from the
/// individual that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  /// `*_FROM`: the holder came out of the other individual.
  From,
  /// `*_INTO`: the holder went into the other individual.
  Into,
  /// `COMPONENT_WITH`: a sibling in the same split or merge.
  Component,
}

impl LifecycleRelation {
  /// The relation the other party of a split or merge holds.
  pub fn inverse(self) -> Self {
    match self {
      Self::SplitInto => Self::SplitFrom,
      Self::SplitFrom => Self::SplitInto,
      Self::MergedInto => Self::MergedFrom,
      Self::MergedFrom => Self::MergedInto,
      Self::ComponentWith => Self::ComponentWith,
    }
  }

  pub fn direction(self) -> Direction {
    match self {
      Self::SplitFrom | Self::MergedFrom => Direction::From,
      Self::SplitInto | Self::MergedInto => Direction::Into,
      Self::ComponentWith => Direction::Component,
    }
  }
}

impl From<LifecycleRelation> for RelationType {
  fn from(value: LifecycleRelation) -> Self {
    match value {
      LifecycleRelation::SplitInto => Self::SplitInto,
      LifecycleRelation::SplitFrom => Self::SplitFrom,
      LifecycleRelation::MergedInto => Self::MergedInto,
      LifecycleRelation::MergedFrom => Self::MergedFrom,
      LifecycleRelation::ComponentWith => Self::ComponentWith,
    }
  }
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// A directed edge `subject -> object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrestleRelation {
  subject:       String,
  object:        String,
  relation_type: RelationType,
}

impl TrestleRelation {
  pub fn new(
    subject: impl Into<String>,
    object: impl Into<String>,
    relation_type: RelationType,
  ) -> Self {
    Self {
      subject: subject.into(),
      object: object.into(),
      relation_type,
    }
  }

  pub fn subject(&self) -> &str { &self.subject }

  pub fn object(&self) -> &str { &self.object }

  pub fn relation_type(&self) -> RelationType { self.relation_type }

  pub fn lifecycle(&self) -> Option<LifecycleRelation> {
    self.relation_type.lifecycle()
  }
}

impl From<RelationRecord> for TrestleRelation {
  fn from(record: RelationRecord) -> Self {
    Self::new(record.subject, record.object, record.relation)
  }
}
