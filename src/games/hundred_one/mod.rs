//! 101 Okey: melds on the table and penalty scoring.
//!
//! - Every seat holds 21 tiles; the dealer starts with 22
//! - A player opens by laying sets worth at least 101 points, or at least
//!   five pairs, in one declaration
//! - Once open, a player may lay more melds of the same kind and add single
//!   tiles to any run or group on the table
//! - Discarding your last tile wins the round
//!
//! Lower totals are better: the winner takes -101, a seat that never
//! opened takes +202, everyone else takes what is left in their hand.

mod game;
mod scoring;

pub use game::HundredOneGame;
pub use scoring::{round_scores, OPENING_PAIRS, OPENING_POINTS};
