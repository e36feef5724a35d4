//! Error type for `trestle-graph`.

use thiserror::Error;

/// Why a graph could not be built. `E` is the error type of the
/// [`IndividualSource`](trestle_core::IndividualSource). Either variant
/// aborts the whole build; partial graphs are never returned.
#[derive(Debug, Error)]
pub enum GraphError<E> {
  /// An individual's events break the lifecycle invariants (no start event,
  /// or no end event where a split/merge partner requires one).
  #[error("lifecycle error: {0}")]
  Lifecycle(#[from] trestle_core::Error),

  #[error("failed to fetch related individual: {0}")]
  Fetch(E),
}
