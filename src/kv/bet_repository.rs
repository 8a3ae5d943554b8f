//! Typed bet access layered on top of the generic [`KvStore`], grounded on
//! `reecen9696-atomiq-bet-settlement`'s `RedisBetRepository`, which plays
//! the same "typed domain repository over a generic KV client" role.

use std::sync::Arc;

use crate::domain::{Bet, Subgame};
use crate::domain::zigzag;
use crate::errors::KvError;

use super::keys::{bet_key, not_confirmed_entry, NOT_CONFIRMED_SET};
use super::KvStore;

pub struct BetRepository {
    kv: Arc<dyn KvStore>,
}

impl BetRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn find(&self, bet_box_id: &str, player_addr: &str) -> Result<Option<Bet>, KvError> {
        let key = bet_key(bet_box_id, player_addr);
        let Some(fields) = self.kv.hash_get_all(&key).await? else {
            return Ok(None);
        };
        Ok(Some(decode_bet(bet_box_id, player_addr, &fields)?))
    }

    pub async fn create_observed(
        &self,
        bet_box_id: &str,
        player_addr: &str,
        subgame: Subgame,
        number: i64,
        winner_amt: &str,
        random_num: &str,
    ) -> Result<(), KvError> {
        let key = bet_key(bet_box_id, player_addr);
        let fields: Vec<(&str, String)> = vec![
            ("subgame", zigzag::encode_register_hex(subgame.to_i64())),
            ("number", zigzag::encode_register_hex(number)),
            ("winnerAmt", winner_amt.to_string()),
            ("randomNum", random_num.to_string()),
            ("settled", "false".to_string()),
            ("confirmed", "false".to_string()),
        ];
        self.kv.hash_set_multiple(&key, &fields).await
    }

    pub async fn patch_random_num(
        &self,
        bet_box_id: &str,
        player_addr: &str,
        random_num: &str,
    ) -> Result<(), KvError> {
        let key = bet_key(bet_box_id, player_addr);
        self.kv
            .hash_set(&key, "randomNum", random_num.to_string())
            .await
    }

    pub async fn mark_submitting(
        &self,
        bet_box_id: &str,
        player_addr: &str,
        now_ms: i64,
    ) -> Result<(), KvError> {
        let key = bet_key(bet_box_id, player_addr);
        self.kv
            .hash_set(&key, "submittingSinceMs", now_ms.to_string())
            .await
    }

    pub async fn clear_submitting(&self, bet_box_id: &str, player_addr: &str) -> Result<(), KvError> {
        let key = bet_key(bet_box_id, player_addr);
        self.kv.hash_set(&key, "submittingSinceMs", String::new()).await
    }

    pub async fn mark_settled(
        &self,
        bet_box_id: &str,
        player_addr: &str,
        winner_addr: &str,
        tx_id: &str,
    ) -> Result<(), KvError> {
        let key = bet_key(bet_box_id, player_addr);
        let fields: Vec<(&str, String)> = vec![
            ("settled", "true".to_string()),
            ("winnerAddr", winner_addr.to_string()),
            ("txId", tx_id.to_string()),
            ("submittingSinceMs", String::new()),
        ];
        self.kv.hash_set_multiple(&key, &fields).await?;
        self.kv
            .set_add(NOT_CONFIRMED_SET, &not_confirmed_entry("roulette", bet_box_id, player_addr))
            .await
    }

    pub async fn mark_confirmed(&self, bet_box_id: &str, player_addr: &str) -> Result<(), KvError> {
        let key = bet_key(bet_box_id, player_addr);
        self.kv.hash_set(&key, "confirmed", "true".to_string()).await?;
        self.kv
            .set_remove(
                NOT_CONFIRMED_SET,
                &not_confirmed_entry("roulette", bet_box_id, player_addr),
            )
            .await
    }

    pub async fn not_confirmed_entries(&self) -> Result<Vec<String>, KvError> {
        self.kv.set_members(NOT_CONFIRMED_SET).await
    }
}

fn decode_bet(bet_box_id: &str, player_addr: &str, fields: &[(String, String)]) -> Result<Bet, KvError> {
    let get = |name: &str| -> Option<String> {
        fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    };
    let decode_i64 = |field: &str, raw: &str| -> Result<i64, KvError> {
        zigzag::decode_register_hex(raw)
            .ok_or_else(|| KvError::Decode(field.to_string(), raw.to_string()))
    };

    let subgame_raw = get("subgame").unwrap_or_default();
    let subgame_i = decode_i64("subgame", &subgame_raw)?;
    let subgame = Subgame::from_i64(subgame_i)
        .ok_or_else(|| KvError::Decode("subgame".to_string(), subgame_raw.clone()))?;
    let number_raw = get("number").unwrap_or_default();
    let number = decode_i64("number", &number_raw)?;

    let settled = get("settled").as_deref() == Some("true");
    let confirmed = get("confirmed").as_deref() == Some("true");
    let submitting_since_ms = get("submittingSinceMs")
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok());

    Ok(Bet {
        bet_box_id: bet_box_id.to_string(),
        player_addr: player_addr.to_string(),
        subgame,
        number,
        winner_amt: get("winnerAmt").unwrap_or_default(),
        random_num: get("randomNum").unwrap_or_default(),
        settled,
        winner_addr: get("winnerAddr").filter(|s| !s.is_empty()),
        tx_id: get("txId").filter(|s| !s.is_empty()),
        confirmed,
        submitting_since_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKvStore;

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let repo = BetRepository::new(kv);
        repo.create_observed("BOX1", "P", Subgame::Exact, 17, "50", "")
            .await
            .unwrap();
        let bet = repo.find("BOX1", "P").await.unwrap().unwrap();
        assert_eq!(bet.subgame, Subgame::Exact);
        assert_eq!(bet.number, 17);
        assert_eq!(bet.winner_amt, "50");
        assert!(!bet.settled);
        assert!(bet.random_num.is_empty());
    }

    #[tokio::test]
    async fn patch_then_settle_updates_not_confirmed_set() {
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let repo = BetRepository::new(kv);
        repo.create_observed("BOX1", "P", Subgame::Exact, 17, "50", "")
            .await
            .unwrap();
        repo.patch_random_num("BOX1", "P", "00000117").await.unwrap();
        repo.mark_settled("BOX1", "P", "P", "tx1").await.unwrap();

        let bet = repo.find("BOX1", "P").await.unwrap().unwrap();
        assert!(bet.settled);
        assert_eq!(bet.winner_addr.as_deref(), Some("P"));
        assert_eq!(bet.tx_id.as_deref(), Some("tx1"));

        let entries = repo.not_confirmed_entries().await.unwrap();
        assert_eq!(entries, vec!["roulette:BOX1:P".to_string()]);

        repo.mark_confirmed("BOX1", "P").await.unwrap();
        let bet = repo.find("BOX1", "P").await.unwrap().unwrap();
        assert!(bet.confirmed);
        assert!(repo.not_confirmed_entries().await.unwrap().is_empty());
    }
}
