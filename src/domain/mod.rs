pub mod bet;
pub mod registers;
pub mod roulette;
pub mod zigzag;

pub use bet::{Bet, Notif};
pub use roulette::Subgame;
