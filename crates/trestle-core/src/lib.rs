//! Core types for the Trestle spatio-temporal knowledge graph client.
//!
//! This crate is deliberately free of HTTP and runtime dependencies. It holds
//! the immutable value objects (temporals, facts, relations, events), the
//! [`Individual`](individual::Individual) aggregate built from API records,
//! the identifier helpers used for rendering, and WKT/GeoJSON geometry.

pub mod error;
pub mod event;
pub mod fact;
pub mod geojson;
pub mod id;
pub mod individual;
pub mod record;
pub mod relation;
pub mod source;
pub mod temporal;
pub mod wkt;

pub use error::{Error, Result};
pub use individual::Individual;
pub use source::IndividualSource;
