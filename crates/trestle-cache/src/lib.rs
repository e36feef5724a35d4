//! Request-deduplicating, expiring cache for async fetches.
//!
//! Each key moves through a small state machine:
//!
//! ```text
//! Absent ──get_with──▶ Fetching(waiters) ──ok──▶ Present(value, expiry)
//!    ▲                        │ err / dropped            │ expired / evicted
//!    └────────────────────────┴──────────────────────────┘
//! ```
//!
//! At most one fetch per key is in flight; every caller that arrives while it
//! runs receives the same outcome. Failures are broadcast but never stored.

mod cache;
mod config;

pub mod error;

pub use cache::{Cache, CacheStats};
pub use config::{CacheConfig, ExpiryMode};
pub use error::CacheError;
