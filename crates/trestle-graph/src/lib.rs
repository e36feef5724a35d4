//! Lifecycle event graphs for timeline rendering.
//!
//! Given a focal [`Individual`](trestle_core::Individual) and an
//! [`IndividualSource`](trestle_core::IndividualSource) to fetch its split,
//! merge, and component partners, [`build_event_graph`] produces the nodes,
//! links, and swimlane count a timeline view draws directly.

mod bins;
mod builder;

pub mod error;
pub mod model;

pub use builder::build_event_graph;
pub use error::GraphError;
pub use model::{EventGraph, EventLink, EventNode, NodeMarker};

#[cfg(test)]
mod tests;
