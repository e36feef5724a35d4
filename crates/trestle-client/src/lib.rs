//! Async client for the Trestle REST API.
//!
//! [`TrestleClient`] talks HTTP/JSON and implements
//! [`IndividualSource`](trestle_core::IndividualSource);
//! [`CachedSource`] puts a de-duplicating cache in front of any source.
//! [`Session`] decodes and persists the login token, and [`GeometryWorker`]
//! converts individuals to GeoJSON on a background thread.

pub mod auth;
pub mod client;
pub mod error;
pub mod source;
pub mod worker;

pub use auth::{Privilege, Session, TrestleUser};
pub use client::{ClientConfig, TrestleClient};
pub use error::{Error, Result};
pub use source::CachedSource;
pub use worker::GeometryWorker;
