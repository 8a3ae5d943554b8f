//! Spend watcher half of C6: a 30-second tick over the `NotConfirmed`
//! mirror, publishing a `Notif` once a settled bet's box has actually been
//! spent on-chain (spec.md §4.6).

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chain::ChainClient;
use crate::domain::Notif;
use crate::errors::NotifyError;
use crate::kv::keys::parse_not_confirmed_entry;
use crate::kv::BetRepository;

use super::NotConfirmedSet;
use crate::bus::MessageBus;

const TICK_INTERVAL: Duration = Duration::from_secs(30);
const TOKEN_NAME: &str = "OWL";

pub struct SpendWatcher {
    chain: Arc<dyn ChainClient>,
    bus: Arc<dyn MessageBus>,
    repo: BetRepository,
    not_confirmed: Arc<NotConfirmedSet>,
}

impl SpendWatcher {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        bus: Arc<dyn MessageBus>,
        repo: BetRepository,
        not_confirmed: Arc<NotConfirmedSet>,
    ) -> Self {
        Self {
            chain,
            bus,
            repo,
            not_confirmed,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!("spend watcher loop starting");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("spend watcher received cancellation");
                    break;
                }
                _ = tokio::time::sleep(TICK_INTERVAL) => {}
            }
            self.tick(&cancel).await;
        }
    }

    async fn tick(&self, cancel: &CancellationToken) {
        for entry in self.not_confirmed.snapshot() {
            if cancel.is_cancelled() {
                return;
            }
            if let Err(e) = self.process_entry(&entry).await {
                warn!(entry, error = %e, "spend check failed, retrying next tick");
            }
        }
    }

    /// Returns `Ok(())` whether or not the box turned out to be spent this
    /// tick — only genuine failures (chain/kv/bus errors, malformed state)
    /// leave the entry in place for retry.
    async fn process_entry(&self, entry: &str) -> Result<(), NotifyError> {
        let (notif_type, box_id, player_addr) = parse_not_confirmed_entry(entry)
            .ok_or_else(|| NotifyError::MalformedEntry(entry.to_string()))?;

        if self.chain.get_utxo_box(box_id).await?.is_some() {
            // Still unspent; nothing to do yet.
            return Ok(());
        }

        let bet = self
            .repo
            .find(box_id, player_addr)
            .await?
            .ok_or_else(|| NotifyError::MissingBet(entry.to_string()))?;
        let tx_id = bet.tx_id.clone().unwrap_or_default();

        let notif = Notif {
            notif_type: notif_type.to_string(),
            address: player_addr.to_string(),
            amount: bet.winner_amt.clone(),
            token_name: TOKEN_NAME.to_string(),
            txid: tx_id,
        };
        let payload = serde_json::to_vec(&notif).map_err(|e| {
            NotifyError::MalformedEntry(format!("could not serialize notif for {entry}: {e}"))
        })?;

        self.bus.publish("notif.payouts", payload).await?;

        self.not_confirmed.remove(entry);
        self.repo.mark_confirmed(box_id, player_addr).await?;

        info!(box_id, player_addr, "bet box spent, notification published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryMessageBus;
    use crate::chain::InMemoryChainClient;
    use crate::domain::Subgame;
    use crate::kv::{InMemoryKvStore, KvStore};
    use futures::StreamExt;

    #[tokio::test]
    async fn spend_detected_publishes_notif_and_marks_confirmed() {
        let mem_chain = Arc::new(InMemoryChainClient::new());
        mem_chain
            .boxes
            .lock()
            .unwrap()
            .insert("BOX1".to_string(), crate::chain::ErgUtxoBox {
                box_id: "BOX1".to_string(),
                assets: vec![],
                additional_registers: Default::default(),
                ergo_tree: "roulette_tree".to_string(),
            });
        let chain: Arc<dyn ChainClient> = mem_chain.clone();
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let repo = BetRepository::new(kv.clone());

        repo.create_observed("BOX1", "P", Subgame::Exact, 17, "50", "00000117")
            .await
            .unwrap();
        repo.mark_settled("BOX1", "P", "P", "tx1").await.unwrap();

        let not_confirmed = Arc::new(NotConfirmedSet::new());
        not_confirmed.sync_from_kv(&kv).await.unwrap();
        assert_eq!(not_confirmed.snapshot(), vec!["roulette:BOX1:P".to_string()]);

        let watcher = SpendWatcher::new(chain.clone(), bus.clone(), repo, not_confirmed.clone());

        // Box still unspent: nothing changes.
        watcher.tick(&CancellationToken::new()).await;
        assert_eq!(not_confirmed.snapshot().len(), 1);

        // Spend the box; the next tick should notice, publish, and confirm.
        mem_chain.spend_box("BOX1");

        let mut notifs = bus.subscribe("notif.payouts").await.unwrap();
        watcher.tick(&CancellationToken::new()).await;

        assert!(not_confirmed.snapshot().is_empty());
        let msg = tokio::time::timeout(Duration::from_secs(1), notifs.next())
            .await
            .unwrap()
            .unwrap();
        let notif: Notif = serde_json::from_slice(&msg.payload).unwrap();
        assert_eq!(notif.address, "P");
        assert_eq!(notif.txid, "tx1");
    }
}
