//! [`CachedSource`]: an [`IndividualSource`] backed by a [`Cache`].

use std::{future::Future, sync::Arc};

use trestle_cache::{Cache, CacheConfig, CacheError};
use trestle_core::{Individual, IndividualSource};

/// Serves individuals from a cache keyed by identifier, fetching through
/// `inner` on a miss. Concurrent requests for the same identifier share one
/// fetch.
pub struct CachedSource<S: IndividualSource> {
  inner: S,
  cache: Cache<String, Arc<Individual>, S::Error>,
}

impl<S: IndividualSource> CachedSource<S> {
  pub fn new(inner: S, config: CacheConfig) -> Self {
    Self {
      inner,
      cache: Cache::new(config),
    }
  }

  pub fn inner(&self) -> &S { &self.inner }

  pub fn cache(&self) -> &Cache<String, Arc<Individual>, S::Error> {
    &self.cache
  }
}

impl<S: IndividualSource> IndividualSource for CachedSource<S> {
  type Error = CacheError<S::Error>;

  fn individual<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Arc<Individual>, Self::Error>> + Send + 'a {
    self
      .cache
      .get_with(id.to_string(), move || self.inner.individual(id))
  }
}
