//! [`Cache`]: the per-key state machine and its waiters.

use std::{
  collections::HashMap,
  fmt::Debug,
  future::Future,
  hash::Hash,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use parking_lot::Mutex;
use tokio::{sync::watch, time::Instant};
use tracing::debug;

use crate::{CacheConfig, CacheError};

// ─── State ───────────────────────────────────────────────────────────────────

/// What waiters on an in-flight key eventually see. `None` until settled.
type Outcome<V, E> = Option<Result<V, Arc<E>>>;

struct Entry<V> {
  value:   V,
  written: Instant,
  touched: Instant,
  /// Logical clock of the last access; the smallest is evicted first.
  recency: u64,
}

enum Slot<V, E> {
  Fetching {
    generation: u64,
    tx:         watch::Sender<Outcome<V, E>>,
  },
  Present(Entry<V>),
}

struct State<K, V, E> {
  slots:      HashMap<K, Slot<V, E>>,
  clock:      u64,
  generation: u64,
}

struct Shared<K, V, E> {
  config:  CacheConfig,
  state:   Mutex<State<K, V, E>>,
  hits:    AtomicU64,
  misses:  AtomicU64,
  fetches: AtomicU64,
}

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub hits:    u64,
  pub misses:  u64,
  /// Fallback fetches actually started.
  pub fetches: u64,
}

/// Result of probing a key without starting a fetch.
enum Probe<V, E> {
  Hit(V),
  Wait(watch::Receiver<Outcome<V, E>>),
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// An expiring key-value cache that collapses concurrent fetches of the same
/// key into one.
///
/// Cloning is cheap; clones share the same entries.
pub struct Cache<K, V, E> {
  shared: Arc<Shared<K, V, E>>,
}

impl<K, V, E> Clone for Cache<K, V, E> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<K, V, E> Cache<K, V, E>
where
  K: Eq + Hash + Clone + Debug,
  V: Clone,
{
  pub fn new(config: CacheConfig) -> Self {
    Self {
      shared: Arc::new(Shared {
        config,
        state: Mutex::new(State {
          slots:      HashMap::new(),
          clock:      0,
          generation: 0,
        }),
        hits: AtomicU64::new(0),
        misses: AtomicU64::new(0),
        fetches: AtomicU64::new(0),
      }),
    }
  }

  pub fn config(&self) -> &CacheConfig { &self.shared.config }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Return the cached value for `key`, or join a fetch already in flight.
  /// Fails with [`CacheError::Miss`] otherwise.
  pub async fn get(&self, key: &K) -> Result<V, CacheError<E>> {
    let probe = {
      let mut state = self.shared.state.lock();
      self.probe(&mut state, key)
    };
    match probe {
      Some(Probe::Hit(value)) => Ok(value),
      Some(Probe::Wait(rx)) => wait(rx).await,
      None => {
        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        Err(CacheError::Miss)
      }
    }
  }

  /// Return the cached value for `key`, joining an in-flight fetch if there
  /// is one, or run `fallback` and cache its result.
  ///
  /// Only the first caller for an absent key runs `fallback`; later callers
  /// wait for its outcome. A failed fetch is reported to all of them and
  /// leaves the key absent so the next call retries.
  pub async fn get_with<F, Fut>(
    &self,
    key: K,
    fallback: F,
  ) -> Result<V, CacheError<E>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    let (generation, mut rx) = match self.probe_or_lead(&key) {
      Ok(Probe::Hit(value)) => return Ok(value),
      Ok(Probe::Wait(rx)) => {
        debug!(?key, "joining in-flight fetch");
        return wait(rx).await;
      }
      Err(lead) => lead,
    };

    debug!(?key, "cache miss, fetching");
    let mut guard = InFlight {
      shared: &self.shared,
      key: &key,
      generation,
      armed: true,
    };

    let fetched = tokio::select! {
      result = fallback() => result,
      Ok(outcome) = rx.wait_for(Option::is_some) => {
        // `set` resolved the key before the fetch finished.
        guard.armed = false;
        return settled((*outcome).clone());
      }
    };

    guard.armed = false;
    self.settle(&key, generation, fetched)
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert or overwrite `key`. Callers waiting on an in-flight fetch of
  /// `key` receive `value` immediately.
  pub fn set(&self, key: K, value: V) {
    let now = Instant::now();
    let mut state = self.shared.state.lock();
    state.clock += 1;
    let entry = Entry {
      value:   value.clone(),
      written: now,
      touched: now,
      recency: state.clock,
    };
    if let Some(Slot::Fetching { tx, .. }) =
      state.slots.insert(key, Slot::Present(entry))
    {
      tx.send_replace(Some(Ok(value)));
    }
    self.evict(&mut state);
  }

  /// Drop the cached value for `key`. In-flight fetches are unaffected.
  pub fn invalidate(&self, key: &K) -> bool {
    let mut state = self.shared.state.lock();
    if matches!(state.slots.get(key), Some(Slot::Present(_))) {
      state.slots.remove(key);
      true
    } else {
      false
    }
  }

  /// Drop every cached value. In-flight fetches are unaffected.
  pub fn clear(&self) {
    let mut state = self.shared.state.lock();
    state
      .slots
      .retain(|_, slot| matches!(slot, Slot::Fetching { .. }));
  }

  // ── Introspection ─────────────────────────────────────────────────────

  /// Number of present entries, including expired ones not yet evicted.
  pub fn len(&self) -> usize {
    let state = self.shared.state.lock();
    state
      .slots
      .values()
      .filter(|slot| matches!(slot, Slot::Present(_)))
      .count()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits:    self.shared.hits.load(Ordering::Relaxed),
      misses:  self.shared.misses.load(Ordering::Relaxed),
      fetches: self.shared.fetches.load(Ordering::Relaxed),
    }
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Look `key` up, evicting it first if it has expired.
  fn probe(&self, state: &mut State<K, V, E>, key: &K) -> Option<Probe<V, E>> {
    let now = Instant::now();
    let config = &self.shared.config;

    let expired = match state.slots.get(key) {
      Some(Slot::Present(entry)) => {
        config.is_expired(entry.written, entry.touched, now)
      }
      _ => false,
    };
    if expired {
      debug!(?key, "cache entry expired");
      state.slots.remove(key);
      return None;
    }

    state.clock += 1;
    let clock = state.clock;
    match state.slots.get_mut(key)? {
      Slot::Present(entry) => {
        entry.touched = now;
        entry.recency = clock;
        self.shared.hits.fetch_add(1, Ordering::Relaxed);
        Some(Probe::Hit(entry.value.clone()))
      }
      Slot::Fetching { tx, .. } => Some(Probe::Wait(tx.subscribe())),
    }
  }

  /// Probe `key`; if it is absent, register the caller as the fetch leader
  /// under the same lock so no second leader can appear.
  fn probe_or_lead(
    &self,
    key: &K,
  ) -> Result<Probe<V, E>, (u64, watch::Receiver<Outcome<V, E>>)> {
    let mut state = self.shared.state.lock();
    if let Some(probe) = self.probe(&mut state, key) {
      return Ok(probe);
    }

    self.shared.misses.fetch_add(1, Ordering::Relaxed);
    self.shared.fetches.fetch_add(1, Ordering::Relaxed);
    state.generation += 1;
    let generation = state.generation;
    let (tx, rx) = watch::channel(None);
    state
      .slots
      .insert(key.clone(), Slot::Fetching { generation, tx });
    Err((generation, rx))
  }

  /// Record the leader's result and wake its waiters.
  fn settle(
    &self,
    key: &K,
    generation: u64,
    result: Result<V, E>,
  ) -> Result<V, CacheError<E>> {
    let now = Instant::now();
    let mut state = self.shared.state.lock();

    let tx = match state.slots.remove(key) {
      Some(Slot::Fetching { generation: g, tx }) if g == generation => Some(tx),
      // Replaced by `set` (or a later fetch) while we were running.
      Some(other) => {
        state.slots.insert(key.clone(), other);
        None
      }
      None => None,
    };

    match result {
      Ok(value) => {
        if let Some(tx) = tx {
          state.clock += 1;
          let entry = Entry {
            value:   value.clone(),
            written: now,
            touched: now,
            recency: state.clock,
          };
          state.slots.insert(key.clone(), Slot::Present(entry));
          self.evict(&mut state);
          tx.send_replace(Some(Ok(value.clone())));
        }
        Ok(value)
      }
      Err(error) => {
        debug!(?key, "fetch failed; not caching");
        let error = Arc::new(error);
        if let Some(tx) = tx {
          tx.send_replace(Some(Err(Arc::clone(&error))));
        }
        Err(CacheError::Fetch(error))
      }
    }
  }

  /// Evict least-recently-used entries until the cache is within capacity.
  fn evict(&self, state: &mut State<K, V, E>) {
    let Some(max) = self.shared.config.max_entries else {
      return;
    };
    loop {
      let mut present = 0usize;
      let mut oldest: Option<(&K, u64)> = None;
      for (key, slot) in &state.slots {
        if let Slot::Present(entry) = slot {
          present += 1;
          if oldest.is_none_or(|(_, recency)| entry.recency < recency) {
            oldest = Some((key, entry.recency));
          }
        }
      }
      if present <= max {
        return;
      }
      let Some(victim) = oldest.map(|(key, _)| key.clone()) else {
        return;
      };
      debug!(key = ?victim, "evicting least-recently-used entry");
      state.slots.remove(&victim);
    }
  }
}

// ─── Waiting ─────────────────────────────────────────────────────────────────

async fn wait<V: Clone, E>(
  mut rx: watch::Receiver<Outcome<V, E>>,
) -> Result<V, CacheError<E>> {
  let outcome = match rx.wait_for(Option::is_some).await {
    Ok(outcome) => (*outcome).clone(),
    // Sender dropped without a value: the leader was cancelled.
    Err(_) => None,
  };
  settled(outcome)
}

fn settled<V, E>(outcome: Outcome<V, E>) -> Result<V, CacheError<E>> {
  match outcome {
    Some(Ok(value)) => Ok(value),
    Some(Err(error)) => Err(CacheError::Fetch(error)),
    None => Err(CacheError::Abandoned),
  }
}

/// Clears the leader's `Fetching` slot if the leader is dropped mid-fetch,
/// which drops the sender and releases its waiters with
/// [`CacheError::Abandoned`].
struct InFlight<'a, K: Eq + Hash, V, E> {
  shared:     &'a Shared<K, V, E>,
  key:        &'a K,
  generation: u64,
  armed:      bool,
}

impl<K: Eq + Hash, V, E> Drop for InFlight<'_, K, V, E> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let mut state = self.shared.state.lock();
    if matches!(
      state.slots.get(self.key),
      Some(Slot::Fetching { generation, .. }) if *generation == self.generation
    ) {
      state.slots.remove(self.key);
    }
  }
}
