//! The bet value type and its monotone state machine.
//!
//! Modeled as a single value whose only writers are the payout loop
//! (`settled`/`txId`/`winnerAddr`/`submitting`) and the notification loop
//! (`confirmed`) — spec.md §9 DESIGN NOTES, "cyclic concern."

use serde::{Deserialize, Serialize};

use super::roulette::Subgame;

/// `roulette:<betBoxId>:<playerAddress>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub bet_box_id: String,
    pub player_addr: String,
    pub subgame: Subgame,
    pub number: i64,
    pub winner_amt: String,
    pub random_num: String,
    pub settled: bool,
    pub winner_addr: Option<String>,
    pub tx_id: Option<String>,
    pub confirmed: bool,
    /// Set immediately before a result tx is submitted and cleared once the
    /// submission outcome (success or failure) is known; survives a crash
    /// mid-submission so Stage C can detect "might already be on the node"
    /// instead of blindly resubmitting (spec.md §9 open question ii).
    pub submitting_since_ms: Option<i64>,
}

impl Bet {
    pub fn key(bet_box_id: &str, player_addr: &str) -> String {
        format!("roulette:{bet_box_id}:{player_addr}")
    }

    pub fn new(
        bet_box_id: String,
        player_addr: String,
        subgame: Subgame,
        number: i64,
        winner_amt: String,
        random_num: String,
    ) -> Self {
        Self {
            bet_box_id,
            player_addr,
            subgame,
            number,
            winner_amt,
            random_num,
            settled: false,
            winner_addr: None,
            tx_id: None,
            confirmed: false,
            submitting_since_ms: None,
        }
    }

    /// Invariant: `settled=true` implies `winnerAddr` and `txId` are set.
    pub fn is_valid(&self) -> bool {
        if self.settled && (self.winner_addr.is_none() || self.tx_id.is_none()) {
            return false;
        }
        if self.confirmed && !self.settled {
            return false;
        }
        true
    }

    /// The 4-tuple used to check state monotonicity (spec.md §8 property 1).
    pub fn progress_tuple(&self) -> (bool, bool, bool, bool) {
        (
            true, // observed: this Bet exists at all
            !self.random_num.is_empty(),
            self.settled,
            self.confirmed,
        )
    }
}

/// `notif:<type>:<walletAddr>:<txId>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notif {
    #[serde(rename = "type")]
    pub notif_type: String,
    pub address: String,
    pub amount: String,
    pub token_name: String,
    pub txid: String,
}

impl Notif {
    pub fn parked_key(notif_type: &str, wallet_addr: &str, tx_id: &str) -> String {
        format!("notif:{notif_type}:{wallet_addr}:{tx_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bet_is_unsettled_and_valid() {
        let bet = Bet::new(
            "BOX1".into(),
            "P".into(),
            Subgame::Exact,
            17,
            "50".into(),
            String::new(),
        );
        assert!(bet.is_valid());
        assert_eq!(bet.progress_tuple(), (true, false, false, false));
    }

    #[test]
    fn settled_without_winner_addr_is_invalid() {
        let mut bet = Bet::new(
            "BOX1".into(),
            "P".into(),
            Subgame::Exact,
            17,
            "50".into(),
            "00000117".into(),
        );
        bet.settled = true;
        assert!(!bet.is_valid());
    }

    #[test]
    fn confirmed_without_settled_is_invalid() {
        let mut bet = Bet::new(
            "BOX1".into(),
            "P".into(),
            Subgame::Exact,
            17,
            "50".into(),
            "00000117".into(),
        );
        bet.confirmed = true;
        assert!(!bet.is_valid());
    }

    #[test]
    fn progress_tuple_monotone_lex_order() {
        let mut bet = Bet::new(
            "BOX1".into(),
            "P".into(),
            Subgame::Exact,
            17,
            "50".into(),
            String::new(),
        );
        let t0 = bet.progress_tuple();
        bet.random_num = "00000117".into();
        let t1 = bet.progress_tuple();
        bet.settled = true;
        bet.winner_addr = Some("P".into());
        bet.tx_id = Some("tx1".into());
        let t2 = bet.progress_tuple();
        bet.confirmed = true;
        let t3 = bet.progress_tuple();
        assert!(t0 < t1);
        assert!(t1 < t2);
        assert!(t2 < t3);
    }
}
