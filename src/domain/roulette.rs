//! Roulette subgames and the deterministic winner decision.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subgame {
    RedBlack,
    OddEven,
    LowUpperHalf,
    Columns,
    LowerMidUpper3rd,
    Exact,
}

impl Subgame {
    pub fn from_i64(n: i64) -> Option<Self> {
        match n {
            0 => Some(Subgame::RedBlack),
            1 => Some(Subgame::OddEven),
            2 => Some(Subgame::LowUpperHalf),
            3 => Some(Subgame::Columns),
            4 => Some(Subgame::LowerMidUpper3rd),
            5 => Some(Subgame::Exact),
            _ => None,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Subgame::RedBlack => 0,
            Subgame::OddEven => 1,
            Subgame::LowUpperHalf => 2,
            Subgame::Columns => 3,
            Subgame::LowerMidUpper3rd => 4,
            Subgame::Exact => 5,
        }
    }
}

const RED_NUMBERS: [i64; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

const COLUMN_1: [i64; 12] = [3, 6, 9, 12, 15, 18, 21, 24, 27, 30, 33, 36];
const COLUMN_2: [i64; 12] = [2, 5, 8, 11, 14, 17, 20, 23, 26, 29, 32, 35];
const COLUMN_3: [i64; 12] = [1, 4, 7, 10, 13, 16, 19, 22, 25, 28, 31, 34];

/// Decide whether `chipspot` wins under `subgame` given the wheel result `r`
/// (0..=36). `r == 0` always loses for every subgame except EXACT, where a
/// chip placed directly on 0 wins.
pub fn winner(subgame: Subgame, chipspot: i64, r: i64) -> bool {
    if subgame == Subgame::Exact {
        return chipspot == r;
    }
    if r == 0 {
        return false;
    }
    match subgame {
        Subgame::RedBlack => {
            let is_red = RED_NUMBERS.contains(&r);
            if chipspot == 0 {
                is_red
            } else {
                !is_red
            }
        }
        Subgame::OddEven => chipspot.rem_euclid(2) == r.rem_euclid(2),
        Subgame::LowUpperHalf => match chipspot {
            10 => (1..=18).contains(&r),
            28 => (19..=36).contains(&r),
            _ => false,
        },
        Subgame::Columns => match chipspot {
            1 => COLUMN_1.contains(&r),
            2 => COLUMN_2.contains(&r),
            3 => COLUMN_3.contains(&r),
            _ => false,
        },
        Subgame::LowerMidUpper3rd => match chipspot {
            6 => (1..=12).contains(&r),
            18 => (13..=24).contains(&r),
            30 => (25..=36).contains(&r),
            _ => false,
        },
        Subgame::Exact => unreachable!(),
    }
}

/// The wheel position in [0, 36] derived from a seed's first 7 hex digits
/// (`int(hash[0:7], 16) mod 37`, spec.md §4.5.1 step 1).
pub fn wheel_value(seed: &str) -> Result<i64, std::num::ParseIntError> {
    let digits: String = seed.chars().take(7).collect();
    let n = i64::from_str_radix(&digits, 16)?;
    Ok(n % 37)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_loses_for_non_exact() {
        for sg in [
            Subgame::RedBlack,
            Subgame::OddEven,
            Subgame::LowUpperHalf,
            Subgame::Columns,
            Subgame::LowerMidUpper3rd,
        ] {
            assert!(!winner(sg, 0, 0));
            assert!(!winner(sg, 1, 0));
        }
    }

    #[test]
    fn exact_matches_chipspot() {
        assert!(winner(Subgame::Exact, 17, 17));
        assert!(!winner(Subgame::Exact, 17, 18));
        assert!(winner(Subgame::Exact, 0, 0));
    }

    #[test]
    fn red_black() {
        assert!(winner(Subgame::RedBlack, 0, 1));
        assert!(!winner(Subgame::RedBlack, 1, 1));
        assert!(winner(Subgame::RedBlack, 1, 2));
        assert!(!winner(Subgame::RedBlack, 0, 2));
    }

    #[test]
    fn odd_even() {
        assert!(winner(Subgame::OddEven, 1, 3));
        assert!(winner(Subgame::OddEven, 2, 4));
        assert!(!winner(Subgame::OddEven, 1, 4));
    }

    #[test]
    fn low_upper_half() {
        assert!(winner(Subgame::LowUpperHalf, 10, 1));
        assert!(winner(Subgame::LowUpperHalf, 10, 18));
        assert!(!winner(Subgame::LowUpperHalf, 10, 19));
        assert!(winner(Subgame::LowUpperHalf, 28, 19));
        assert!(winner(Subgame::LowUpperHalf, 28, 36));
    }

    #[test]
    fn columns() {
        assert!(winner(Subgame::Columns, 1, 3));
        assert!(winner(Subgame::Columns, 1, 36));
        assert!(!winner(Subgame::Columns, 1, 2));
        assert!(winner(Subgame::Columns, 2, 2));
        assert!(winner(Subgame::Columns, 3, 1));
        assert!(winner(Subgame::Columns, 3, 34));
    }

    #[test]
    fn lower_mid_upper_third() {
        assert!(winner(Subgame::LowerMidUpper3rd, 6, 1));
        assert!(winner(Subgame::LowerMidUpper3rd, 6, 12));
        assert!(!winner(Subgame::LowerMidUpper3rd, 6, 13));
        assert!(winner(Subgame::LowerMidUpper3rd, 18, 13));
        assert!(winner(Subgame::LowerMidUpper3rd, 30, 25));
        assert!(winner(Subgame::LowerMidUpper3rd, 30, 36));
    }

    #[test]
    fn wheel_value_from_seed() {
        // first 7 hex digits "0000011" -> 0x11 == 17, mod 37 == 17
        assert_eq!(wheel_value("00000117").unwrap(), 17);
    }
}
