//! Background thread that turns individual records into GeoJSON.
//!
//! Requests carry a numeric id and go over a channel to the worker thread.
//! Every response is broadcast to all callers, and each caller picks out the
//! one matching its own request id.

use std::{
  sync::atomic::{AtomicU64, Ordering},
  thread,
};

use serde::{Deserialize, Serialize};
use tokio::sync::{
  broadcast::{self, error::RecvError},
  mpsc,
};
use tracing::{debug, warn};
use trestle_core::{
  Individual,
  geojson::{Feature, FeatureCollection},
  record::IndividualRecord,
};

use crate::{Error, Result};

/// Responses buffered per subscriber before a slow caller starts lagging.
const RESPONSE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryRequest {
  pub id:       u64,
  pub response: Vec<IndividualRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryResponse {
  pub id:   u64,
  pub geom: FeatureCollection,
}

/// Handle to the geometry thread. Dropping it stops the thread once queued
/// requests are done.
pub struct GeometryWorker {
  requests:  mpsc::UnboundedSender<GeometryRequest>,
  responses: broadcast::Receiver<GeometryResponse>,
  next_id:   AtomicU64,
}

impl GeometryWorker {
  pub fn spawn() -> Result<Self> {
    let (requests, inbox) = mpsc::unbounded_channel();
    let (outbox, responses) = broadcast::channel(RESPONSE_CAPACITY);
    thread::Builder::new()
      .name("trestle-geometry".into())
      .spawn(move || run(inbox, outbox))?;
    Ok(Self {
      requests,
      responses,
      next_id: AtomicU64::new(1),
    })
  }

  /// Convert `records` into a feature collection on the worker thread.
  /// Records without a usable spatial fact are left out.
  pub async fn features(
    &self,
    records: Vec<IndividualRecord>,
  ) -> Result<FeatureCollection> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    // Subscribe before sending so the response cannot slip past.
    let mut responses = self.responses.resubscribe();
    self
      .requests
      .send(GeometryRequest {
        id,
        response: records,
      })
      .map_err(|_| Error::WorkerGone)?;

    loop {
      match responses.recv().await {
        Ok(response) if response.id == id => return Ok(response.geom),
        Ok(_) => continue,
        Err(RecvError::Lagged(skipped)) => return Err(Error::WorkerLagged(skipped)),
        Err(RecvError::Closed) => return Err(Error::WorkerGone),
      }
    }
  }
}

fn run(
  mut inbox: mpsc::UnboundedReceiver<GeometryRequest>,
  outbox: broadcast::Sender<GeometryResponse>,
) {
  debug!("geometry worker started");
  while let Some(request) = inbox.blocking_recv() {
    let geom = to_feature_collection(request.response);
    // Nobody listening just means the caller went away.
    let _ = outbox.send(GeometryResponse {
      id: request.id,
      geom,
    });
  }
  debug!("geometry worker stopped");
}

/// The synchronous conversion the worker runs for each request.
pub fn to_feature_collection(records: Vec<IndividualRecord>) -> FeatureCollection {
  let features = records
    .into_iter()
    .filter_map(|record| {
      let id = record.individual_id.clone();
      let feature = Individual::try_from(record)
        .and_then(|individual| Feature::from_individual(&individual));
      match feature {
        Ok(feature) => Some(feature),
        Err(e) => {
          warn!(individual = %id, error = %e, "skipping individual without usable geometry");
          None
        }
      }
    })
    .collect();
  FeatureCollection::new(features)
}
