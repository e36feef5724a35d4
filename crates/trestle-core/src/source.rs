//! The `IndividualSource` trait.
//!
//! Implemented by the HTTP client and by caching wrappers around it. The
//! event-graph builder depends on this abstraction, never on a concrete
//! transport.

use std::{future::Future, sync::Arc};

use crate::Individual;

/// Anything that can fetch an [`Individual`] by identifier.
///
/// Futures are `Send` so sources can be shared across tasks of a
/// multi-threaded runtime.
pub trait IndividualSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn individual<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Arc<Individual>, Self::Error>> + Send + 'a;
}

impl<S: IndividualSource> IndividualSource for Arc<S> {
  type Error = S::Error;

  fn individual<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Arc<Individual>, Self::Error>> + Send + 'a {
    (**self).individual(id)
  }
}
