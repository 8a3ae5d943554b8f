//! spec.md §4.5.1 ProcessBet: deterministic decision plus tx construction.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chain::{Asset, ChainClient, ResultTxBody, ResultTxRegisters, ResultTxRequest, MINER_FEE, MIN_BOX_VALUE};
use crate::domain::roulette::{winner, wheel_value, Subgame};
use crate::domain::zigzag;
use crate::errors::PayoutError;
use crate::kv::BetRepository;

pub struct ProcessBetInput<'a> {
    pub bet_box_id: &'a str,
    pub player_addr: &'a str,
    pub oracle_output_box_id: &'a str,
    pub subgame: Subgame,
    pub number: i64,
    pub random_num: &'a str,
    pub assets: Vec<Asset>,
    /// `i`: the R5 outer-list position this box was found at.
    pub index_i: usize,
    /// `j`: the position inside R5's inner list for this box.
    pub index_j: usize,
    pub house_address: &'a str,
    pub now_ms: i64,
}

pub struct ProcessBetOutcome {
    pub won: bool,
    pub winner_addr: String,
    pub tx_id: String,
}

/// Runs the full decide → build → submit → persist sequence for one bet.
/// Returns `Ok(None)` when the submission was rejected (left unsettled for
/// the next tick, per spec.md §7 `WalletSubmitRejected`).
pub async fn process_bet(
    chain: &Arc<dyn ChainClient>,
    repo: &BetRepository,
    input: ProcessBetInput<'_>,
) -> Result<Option<ProcessBetOutcome>, PayoutError> {
    let r = wheel_value(input.random_num).map_err(|e| crate::errors::RegisterError::Malformed {
        value: input.random_num.to_string(),
        reason: e.to_string(),
    })?;

    let won = winner(input.subgame, input.number, r);
    let winner_addr = if won {
        input.player_addr.to_string()
    } else {
        input.house_address.to_string()
    };

    let bet_bytes = chain.get_utxo_binary(input.bet_box_id).await?;
    let oracle_bytes = chain.get_utxo_binary(input.oracle_output_box_id).await?;

    let body = ResultTxBody {
        requests: vec![ResultTxRequest {
            address: winner_addr.clone(),
            value: MIN_BOX_VALUE,
            assets: input.assets,
            registers: ResultTxRegisters {
                r4: zigzag::encode_register_hex(input.index_i as i64),
                r5: zigzag::encode_register_hex(input.index_j as i64),
            },
        }],
        fee: MINER_FEE,
        inputs_raw: vec![bet_bytes],
        data_inputs_raw: vec![oracle_bytes],
    };

    repo.mark_submitting(input.bet_box_id, input.player_addr, input.now_ms)
        .await?;

    match chain.submit_result_tx(body).await {
        Ok(tx_id) => {
            repo.mark_settled(input.bet_box_id, input.player_addr, &winner_addr, &tx_id)
                .await?;
            info!(
                bet_box_id = input.bet_box_id,
                player_addr = input.player_addr,
                won,
                tx_id = %tx_id,
                "bet settled"
            );
            Ok(Some(ProcessBetOutcome {
                won,
                winner_addr,
                tx_id,
            }))
        }
        Err(e) => {
            repo.clear_submitting(input.bet_box_id, input.player_addr).await?;
            warn!(
                bet_box_id = input.bet_box_id,
                player_addr = input.player_addr,
                error = %e,
                "result tx submission failed, will retry next tick"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::InMemoryChainClient;
    use crate::kv::InMemoryKvStore;

    #[tokio::test]
    async fn s1_happy_win_settles_with_player_as_winner() {
        let chain: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new());
        let kv: Arc<dyn crate::kv::KvStore> = Arc::new(InMemoryKvStore::new());
        let repo = BetRepository::new(kv);
        repo.create_observed("BOX1", "P", Subgame::Exact, 17, "50", "00000117")
            .await
            .unwrap();

        let outcome = process_bet(
            &chain,
            &repo,
            ProcessBetInput {
                bet_box_id: "BOX1",
                player_addr: "P",
                oracle_output_box_id: "ORACLE_OUT",
                subgame: Subgame::Exact,
                number: 17,
                random_num: "00000117",
                assets: vec![Asset {
                    token_id: "OWL".into(),
                    amount: 50,
                }],
                index_i: 0,
                index_j: 1,
                house_address: "HOUSE",
                now_ms: 1_000,
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert!(outcome.won);
        assert_eq!(outcome.winner_addr, "P");

        let bet = repo.find("BOX1", "P").await.unwrap().unwrap();
        assert!(bet.settled);
        assert_eq!(bet.winner_addr.as_deref(), Some("P"));
        assert_eq!(bet.winner_amt, "50");
    }

    #[tokio::test]
    async fn s2_loss_pays_house() {
        let chain: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new());
        let kv: Arc<dyn crate::kv::KvStore> = Arc::new(InMemoryKvStore::new());
        let repo = BetRepository::new(kv);
        repo.create_observed("BOX1", "P", Subgame::Exact, 18, "50", "00000117")
            .await
            .unwrap();

        let outcome = process_bet(
            &chain,
            &repo,
            ProcessBetInput {
                bet_box_id: "BOX1",
                player_addr: "P",
                oracle_output_box_id: "ORACLE_OUT",
                subgame: Subgame::Exact,
                number: 18,
                random_num: "00000117",
                assets: vec![],
                index_i: 0,
                index_j: 1,
                house_address: "HOUSE",
                now_ms: 1_000,
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert!(!outcome.won);
        assert_eq!(outcome.winner_addr, "HOUSE");
    }

    #[tokio::test]
    async fn rejected_submission_leaves_bet_unsettled() {
        let chain = InMemoryChainClient::new();
        *chain.submit_should_fail.lock().unwrap() = true;
        let chain: Arc<dyn ChainClient> = Arc::new(chain);
        let kv: Arc<dyn crate::kv::KvStore> = Arc::new(InMemoryKvStore::new());
        let repo = BetRepository::new(kv);
        repo.create_observed("BOX1", "P", Subgame::Exact, 17, "50", "00000117")
            .await
            .unwrap();

        let outcome = process_bet(
            &chain,
            &repo,
            ProcessBetInput {
                bet_box_id: "BOX1",
                player_addr: "P",
                oracle_output_box_id: "ORACLE_OUT",
                subgame: Subgame::Exact,
                number: 17,
                random_num: "00000117",
                assets: vec![],
                index_i: 0,
                index_j: 1,
                house_address: "HOUSE",
                now_ms: 1_000,
            },
        )
        .await
        .unwrap();

        assert!(outcome.is_none());
        let bet = repo.find("BOX1", "P").await.unwrap().unwrap();
        assert!(!bet.settled);
        assert!(bet.submitting_since_ms.is_none());
    }
}
