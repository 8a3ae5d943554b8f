//! C4 ingest: the `drand.hash` subscriber that feeds the seed window.

use std::sync::Arc;

use futures::StreamExt;
use metrics::counter;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bus::MessageBus;
use crate::seed_window::SeedWindow;

#[derive(Debug, Deserialize)]
struct DrandHashMessage {
    hash: String,
    boxes: Vec<String>,
}

/// Subscribes to `drand.hash` and ingests every batch into `seed_window`
/// until `cancel` fires.
pub async fn run(bus: Arc<dyn MessageBus>, seed_window: Arc<SeedWindow>, cancel: CancellationToken) {
    info!("seed ingest loop starting");
    let mut stream = match bus.subscribe("drand.hash").await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "could not subscribe to drand.hash");
            return;
        }
    };
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("seed ingest received cancellation");
                break;
            }
            msg = stream.next() => {
                match msg {
                    Some(m) => match serde_json::from_slice::<DrandHashMessage>(&m.payload) {
                        Ok(batch) => {
                            seed_window.ingest(&batch.hash, &batch.boxes);
                            counter!("seed_window_batches_ingested_total").increment(1);
                        }
                        Err(e) => warn!(error = %e, "undecodable drand.hash payload, skipping"),
                    },
                    None => break,
                }
            }
        }
    }
}
