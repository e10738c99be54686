//! Rules engine trait for the game variants.
//!
//! Both variants implement `RulesEngine`, which defines:
//! - How actions modify the match state
//! - When a match is over and who scored what
//! - Timeout auto-play, shared by the turn clock and the bot driver
//!
//! The room layer calls into `RulesEngine` but never touches hands, discard
//! piles or the deck directly.

pub mod engine;
pub mod strategy;

pub use engine::{MatchResult, Outcome, RulesEngine};
pub use strategy::{choose_discard, pick_discard};
