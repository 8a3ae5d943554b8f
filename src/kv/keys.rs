//! Key builders for the KV layout in spec.md §6.5.

pub fn bet_key(bet_box_id: &str, player_addr: &str) -> String {
    format!("roulette:{bet_box_id}:{player_addr}")
}

pub const NOT_CONFIRMED_SET: &str = "confirmed:false";

pub const LAST_BET_HEIGHT: &str = "oracle:lastBetHeight";

pub fn notif_key(notif_type: &str, wallet_addr: &str, tx_id: &str) -> String {
    format!("notif:{notif_type}:{wallet_addr}:{tx_id}")
}

/// `k = "<type>:<boxId>:<playerAddr>"`, the element shape of the
/// `NotConfirmed` set (spec.md §4.6 spend watcher).
pub fn parse_not_confirmed_entry(entry: &str) -> Option<(&str, &str, &str)> {
    let mut parts = entry.splitn(3, ':');
    let ty = parts.next()?;
    let box_id = parts.next()?;
    let player_addr = parts.next()?;
    Some((ty, box_id, player_addr))
}

pub fn not_confirmed_entry(notif_type: &str, bet_box_id: &str, player_addr: &str) -> String {
    format!("{notif_type}:{bet_box_id}:{player_addr}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_not_confirmed_entry() {
        let e = not_confirmed_entry("roulette", "BOX1", "9f...addr");
        assert_eq!(
            parse_not_confirmed_entry(&e),
            Some(("roulette", "BOX1", "9f...addr"))
        );
    }
}
