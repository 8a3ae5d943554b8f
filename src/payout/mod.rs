//! Payout engine (C5): scans oracle transactions, drives the bet state
//! machine, and submits signed result transactions (spec.md §4.5).

mod process_bet;
mod scan;

pub use process_bet::process_bet;
pub use scan::{PayoutConfig, PayoutEngine};
