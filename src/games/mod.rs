//! Game variants.
//!
//! - `classic`: race to a complete 14-tile hand
//! - `hundred_one`: table melds, 101-point opening, penalty scores

pub mod classic;
pub mod hundred_one;

pub use classic::ClassicGame;
pub use hundred_one::HundredOneGame;

use crate::core::{GameMode, GameRng, SeatInfo};
use crate::rules::RulesEngine;

/// Deal a fresh match of the given variant.
#[must_use]
pub fn new_engine(
    mode: GameMode,
    seats: &[SeatInfo],
    turn_seconds: u32,
    rng: GameRng,
) -> Box<dyn RulesEngine> {
    match mode {
        GameMode::Classic => Box::new(ClassicGame::new(seats, turn_seconds, rng)),
        GameMode::HundredOne => Box::new(HundredOneGame::new(seats, turn_seconds, rng)),
    }
}
