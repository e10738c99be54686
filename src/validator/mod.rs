//! Hand and meld validation.
//!
//! - [`validate_hand`]: does a 14-tile hand decompose into sets or seven
//!   pairs? Used by the classic finish.
//! - [`score_meld`] / [`check_pair`]: declarations laid on the table in the
//!   101 variant.

pub mod hand;
pub mod meld;

pub use hand::{validate_hand, HandPattern, Validation, WINNING_HAND_SIZE};
pub use meld::{check_pair, score_meld, MeldShape, ScoredMeld};
