//! Delivery handler half of C6: one subscriber on `notif.payouts`, one
//! request/reply round trip per message, park-on-timeout (spec.md §4.6).

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bus::{BusMessage, MessageBus};
use crate::domain::Notif;
use crate::errors::NotifyError;
use crate::kv::KvStore;

const ACK_TIMEOUT: Duration = Duration::from_secs(10);
const PARK_TTL_SECONDS: u64 = 336 * 3600;

pub struct DeliveryHandler {
    bus: Arc<dyn MessageBus>,
    kv: Arc<dyn KvStore>,
}

impl DeliveryHandler {
    pub fn new(bus: Arc<dyn MessageBus>, kv: Arc<dyn KvStore>) -> Self {
        Self { bus, kv }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!("delivery handler starting");
        let mut stream = match self.bus.subscribe("notif.payouts").await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "could not subscribe to notif.payouts");
                return;
            }
        };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("delivery handler received cancellation");
                    break;
                }
                msg = stream.next() => {
                    match msg {
                        Some(m) => {
                            if let Err(e) = self.handle(m).await {
                                warn!(error = %e, "notification delivery failed");
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }

    async fn handle(&self, msg: BusMessage) -> Result<(), NotifyError> {
        let notif: Notif = serde_json::from_slice(&msg.payload)
            .map_err(|e| NotifyError::MalformedEntry(format!("undecodable notif payload: {e}")))?;

        let subject = format!("notif.{}", notif.address);
        let reply = self.bus.request(&subject, msg.payload.clone(), ACK_TIMEOUT).await?;
        let key = Notif::parked_key(&notif.notif_type, &notif.address, &notif.txid);

        match reply {
            Some(_ack) => {
                self.kv.delete(&key).await?;
            }
            None => {
                // Idempotent across retries: only park if nothing is parked yet.
                if self.kv.get_string(&key).await?.is_none() {
                    let payload = serde_json::to_string(&notif).map_err(|e| {
                        NotifyError::MalformedEntry(format!("could not serialize notif: {e}"))
                    })?;
                    self.kv.set_string_with_ttl(&key, &payload, PARK_TTL_SECONDS).await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryMessageBus;
    use crate::kv::InMemoryKvStore;

    fn sample_notif() -> Notif {
        Notif {
            notif_type: "roulette".to_string(),
            address: "P".to_string(),
            amount: "50".to_string(),
            token_name: "OWL".to_string(),
            txid: "tx1".to_string(),
        }
    }

    #[tokio::test]
    async fn acked_delivery_never_parks() {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let handler = DeliveryHandler::new(bus.clone(), kv.clone());

        let notif = sample_notif();
        let payload = serde_json::to_vec(&notif).unwrap();

        // Simulate a live subscriber that acks immediately.
        let mut inbox = bus.subscribe("notif.P").await.unwrap();
        let bus_for_ack = bus.clone();
        let ack_task = tokio::spawn(async move {
            use futures::StreamExt as _;
            if let Some(msg) = inbox.next().await {
                if let Some(reply_to) = msg.reply_to {
                    bus_for_ack.publish(&reply_to, b"ok".to_vec()).await.unwrap();
                }
            }
        });

        handler
            .handle(BusMessage {
                subject: "notif.payouts".to_string(),
                reply_to: None,
                payload,
            })
            .await
            .unwrap();
        ack_task.await.unwrap();

        let key = Notif::parked_key("roulette", "P", "tx1");
        assert!(kv.get_string(&key).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_delivery_parks_exactly_once() {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let handler = DeliveryHandler::new(bus.clone(), kv.clone());

        let notif = sample_notif();
        let payload = serde_json::to_vec(&notif).unwrap();
        // No subscriber on notif.P: the request always times out.

        handler
            .handle(BusMessage {
                subject: "notif.payouts".to_string(),
                reply_to: None,
                payload: payload.clone(),
            })
            .await
            .unwrap();

        let key = Notif::parked_key("roulette", "P", "tx1");
        let parked = kv.get_string(&key).await.unwrap();
        assert!(parked.is_some());

        // A second timed-out delivery for the same (type, addr, txId) must
        // not change the parked entry.
        handler
            .handle(BusMessage {
                subject: "notif.payouts".to_string(),
                reply_to: None,
                payload,
            })
            .await
            .unwrap();
        assert_eq!(kv.get_string(&key).await.unwrap(), parked);
    }
}
