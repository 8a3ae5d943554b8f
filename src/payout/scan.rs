use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chain::ChainClient;
use crate::domain::registers::{parse_flat_list, parse_nested_list, seed_for_r5_index};
use crate::domain::roulette::Subgame;
use crate::domain::zigzag;
use crate::errors::PayoutError;
use crate::kv::keys::LAST_BET_HEIGHT;
use crate::kv::{BetRepository, KvStore};

use super::process_bet::{process_bet, ProcessBetInput};

const TICK_INTERVAL: Duration = Duration::from_secs(120);
const PAGE_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct PayoutConfig {
    pub oracle_address: String,
    pub roulette_ergo_tree: String,
    pub house_address: String,
}

pub struct PayoutEngine {
    chain: Arc<dyn ChainClient>,
    kv: Arc<dyn KvStore>,
    repo: BetRepository,
    config: PayoutConfig,
}

impl PayoutEngine {
    pub fn new(chain: Arc<dyn ChainClient>, kv: Arc<dyn KvStore>, config: PayoutConfig) -> Self {
        let repo = BetRepository::new(kv.clone());
        Self {
            chain,
            kv,
            repo,
            config,
        }
    }

    /// The scan loop: one 2-minute tick at a time, checked against
    /// `cancel` at the outer gate (spec.md §5).
    pub async fn run(&self, cancel: CancellationToken) {
        info!("payout engine scan loop starting");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("payout engine received cancellation");
                    break;
                }
                _ = tokio::time::sleep(TICK_INTERVAL) => {}
            }
            if let Err(e) = self.tick(&cancel).await {
                error!(error = %e, "payout tick failed");
            }
        }
    }

    async fn last_height(&self) -> Result<u64, PayoutError> {
        Ok(self
            .kv
            .get_string(LAST_BET_HEIGHT)
            .await?
            .and_then(|s| s.parse().ok())
            .unwrap_or(0))
    }

    async fn tick(&self, cancel: &CancellationToken) -> Result<(), PayoutError> {
        let last_height = self.last_height().await?;
        let current_height = match self.chain.last_height().await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "failed to fetch current height, aborting tick");
                return Ok(());
            }
        };
        if current_height <= last_height {
            return Ok(());
        }

        let mut offset = 0u32;
        let mut tx_height_seen: u64 = last_height;
        let mut all_settled = true;
        let mut saw_any = false;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let page = self
                .chain
                .oracle_transactions(
                    &self.config.oracle_address,
                    last_height,
                    current_height,
                    PAGE_LIMIT,
                    offset,
                )
                .await?;
            let page_len = page.len();

            for tx in &page {
                saw_any = true;
                tx_height_seen = tx_height_seen.max(tx.inclusion_height);
                if cancel.is_cancelled() {
                    return Ok(());
                }
                let settled = self.process_oracle_tx(tx, cancel).await?;
                all_settled = all_settled && settled;
            }

            if page_len < PAGE_LIMIT as usize {
                break;
            }
            offset += PAGE_LIMIT;
        }

        if saw_any && all_settled && tx_height_seen > last_height {
            self.kv
                .set_string(LAST_BET_HEIGHT, &tx_height_seen.to_string())
                .await?;
            debug!(new_height = tx_height_seen, "advanced lastBetHeight");
        }

        Ok(())
    }

    /// Stage B + C for one oracle tx. Returns whether every bet discovered
    /// in this tx is now settled.
    async fn process_oracle_tx(
        &self,
        tx: &crate::chain::ErgTx,
        cancel: &CancellationToken,
    ) -> Result<bool, PayoutError> {
        let Some(output) = tx.outputs.first() else {
            return Ok(true);
        };
        let r4_raw = output
            .additional_registers
            .r4
            .as_ref()
            .map(|r| r.rendered_value.as_str())
            .unwrap_or("[]");
        let r5_raw = output
            .additional_registers
            .r5
            .as_ref()
            .map(|r| r.rendered_value.as_str())
            .unwrap_or("[]");

        let r4 = parse_flat_list(r4_raw);
        let r5 = parse_nested_list(r5_raw);

        let mut all_settled = true;

        for (i, box_ids) in r5.iter().enumerate() {
            let seed = seed_for_r5_index(&r4, i).map(|s| s.to_string());
            for (j, box_id) in box_ids.iter().enumerate() {
                if cancel.is_cancelled() {
                    return Ok(all_settled);
                }
                match self
                    .process_bet_box(box_id, &output.box_id, seed.as_deref(), i, j)
                    .await
                {
                    Ok(settled) => all_settled = all_settled && settled,
                    Err(e) => {
                        warn!(box_id, error = %e, "failed to process bet box this tick");
                        all_settled = false;
                    }
                }
            }
        }

        Ok(all_settled)
    }

    /// Stage C for a single `(i, j)` bet box. Returns `true` if the bet is
    /// settled after this call (including "already settled").
    async fn process_bet_box(
        &self,
        box_id: &str,
        oracle_output_box_id: &str,
        seed: Option<&str>,
        r5_index: usize,
        r4_index_hint: usize,
    ) -> Result<bool, PayoutError> {
        let Some(utxo) = self.chain.get_utxo_box(box_id).await? else {
            // 404: already spent. C6 will have recorded it if C5 previously
            // observed it; nothing to do here.
            return Ok(true);
        };
        if utxo.ergo_tree != self.config.roulette_ergo_tree {
            return Ok(true);
        }

        let r6_raw = utxo
            .additional_registers
            .r6
            .as_ref()
            .map(|r| r.rendered_value.as_str())
            .unwrap_or("");
        // Strip the 2-hex-char register type prefix before resolving the
        // player address (spec.md §4.5 Stage C step 3).
        let r6_stripped = r6_raw.get(2..).unwrap_or(r6_raw);
        let player_addr = self.chain.ergo_tree_to_address(r6_stripped).await?;

        let existing = self.repo.find(box_id, &player_addr).await?;

        let random_num = seed.map(|s| s.to_string()).unwrap_or_default();

        let (subgame, number) = decode_bet_registers(&utxo)?;
        let winner_amt = utxo
            .assets
            .first()
            .map(|a| a.amount.to_string())
            .unwrap_or_default();

        match existing {
            None => {
                self.repo
                    .create_observed(box_id, &player_addr, subgame, number, &winner_amt, &random_num)
                    .await?;
            }
            Some(bet) if bet.random_num.is_empty() && !random_num.is_empty() => {
                self.repo.patch_random_num(box_id, &player_addr, &random_num).await?;
            }
            _ => {}
        }

        let bet = self.repo.find(box_id, &player_addr).await?.expect("just written");
        if bet.settled {
            return Ok(true);
        }

        if let Some(since) = bet.submitting_since_ms {
            let elapsed_ms = now_ms().saturating_sub(since);
            if elapsed_ms < TICK_INTERVAL.as_millis() as i64 {
                // Still inside the tick that set the marker; too soon to
                // suspect a crash.
                return Ok(false);
            }
            let unconfirmed = self.chain.unconfirmed_input_box_ids().await?;
            if unconfirmed.iter().any(|id| id == box_id) {
                // A submission for this box is already sitting in the
                // mempool; don't race it with a second one.
                return Ok(false);
            }
        }

        if bet.random_num.is_empty() {
            return Ok(false);
        }

        let outcome = process_bet(
            &self.chain,
            &self.repo,
            ProcessBetInput {
                bet_box_id: box_id,
                player_addr: &player_addr,
                oracle_output_box_id,
                subgame,
                number,
                random_num: &bet.random_num,
                assets: utxo.assets.clone(),
                index_i: r5_index,
                index_j: r4_index_hint,
                house_address: &self.config.house_address,
                now_ms: now_ms(),
            },
        )
        .await?;

        Ok(outcome.is_some())
    }
}

fn decode_bet_registers(utxo: &crate::chain::ErgUtxoBox) -> Result<(Subgame, i64), PayoutError> {
    let r4 = utxo
        .additional_registers
        .r4
        .as_ref()
        .map(|r| r.rendered_value.as_str())
        .unwrap_or("");
    let r5 = utxo
        .additional_registers
        .r5
        .as_ref()
        .map(|r| r.rendered_value.as_str())
        .unwrap_or("");

    let subgame_i = zigzag::decode_register_hex(r4).ok_or_else(|| {
        crate::errors::RegisterError::Malformed {
            value: r4.to_string(),
            reason: "could not decode subgame from R4".to_string(),
        }
    })?;
    let subgame = Subgame::from_i64(subgame_i).ok_or_else(|| crate::errors::RegisterError::Malformed {
        value: r4.to_string(),
        reason: format!("unknown subgame index {subgame_i}"),
    })?;
    let number = zigzag::decode_register_hex(r5).ok_or_else(|| crate::errors::RegisterError::Malformed {
        value: r5.to_string(),
        reason: "could not decode number from R5".to_string(),
    })?;

    Ok((subgame, number))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
