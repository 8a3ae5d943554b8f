//! Retrieval endpoint logic behind `GET /api/v1/notifs/:walletAddr`
//! (spec.md §4.6, §6.4): replay every parked notification for a wallet
//! back onto `notif.payouts` so the delivery handler retries it.

use std::sync::Arc;

use tracing::warn;

use crate::bus::MessageBus;
use crate::errors::NotifyError;
use crate::kv::KvStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepublishCounts {
    pub succeeded: usize,
    pub failed: usize,
}

pub async fn republish_parked(
    kv: &Arc<dyn KvStore>,
    bus: &Arc<dyn MessageBus>,
    wallet_addr: &str,
) -> Result<RepublishCounts, NotifyError> {
    let pattern = format!("notif:*:{wallet_addr}:*");
    let keys = kv.scan_keys(&pattern).await?;

    let mut counts = RepublishCounts::default();
    for key in keys {
        match republish_one(kv, bus, &key).await {
            Ok(()) => counts.succeeded += 1,
            Err(e) => {
                warn!(key, error = %e, "failed to republish parked notification");
                counts.failed += 1;
            }
        }
    }
    Ok(counts)
}

async fn republish_one(kv: &Arc<dyn KvStore>, bus: &Arc<dyn MessageBus>, key: &str) -> Result<(), NotifyError> {
    let Some(payload) = kv.get_string(key).await? else {
        return Ok(());
    };
    bus.publish("notif.payouts", payload.into_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryMessageBus;
    use crate::kv::InMemoryKvStore;
    use futures::StreamExt;

    #[tokio::test]
    async fn republishes_every_parked_key_for_the_wallet() {
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());

        kv.set_string("notif:roulette:P:tx1", "{\"txid\":\"tx1\"}").await.unwrap();
        kv.set_string("notif:roulette:P:tx2", "{\"txid\":\"tx2\"}").await.unwrap();
        kv.set_string("notif:roulette:Q:tx3", "{\"txid\":\"tx3\"}").await.unwrap();

        let mut stream = bus.subscribe("notif.payouts").await.unwrap();

        let counts = republish_parked(&kv, &bus, "P").await.unwrap();
        assert_eq!(counts, RepublishCounts { succeeded: 2, failed: 0 });

        let mut seen = Vec::new();
        for _ in 0..2 {
            let msg = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
                .await
                .unwrap()
                .unwrap();
            seen.push(String::from_utf8(msg.payload).unwrap());
        }
        assert!(seen.iter().any(|s| s.contains("tx1")));
        assert!(seen.iter().any(|s| s.contains("tx2")));
    }
}
