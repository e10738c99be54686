//! Classic Okey: race to a complete hand.
//!
//! - Every seat holds 14 tiles; the dealer starts with 15 and discards first
//! - On your turn: draw from the center or take your left neighbour's
//!   last discard, then discard
//! - Instead of discarding you may finish: throw one tile and show the
//!   other 14 as four-ish sets or seven pairs
//!
//! Supports 2 or 4 seats.

mod game;

pub use game::ClassicGame;
