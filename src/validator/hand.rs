//! Winning-hand search.
//!
//! A 14-tile hand wins if it can be split entirely into
//!
//! - **sets**: groups (3-4 tiles, one rank, distinct colors) and runs
//!   (3+ consecutive ranks of one color, at most one 13→1 wrap which must
//!   end the run), or
//! - **pairs**: seven pairs of equal faces, a wild completing a single.
//!
//! Wild tiles (those matching the wildcard face) substitute for anything.
//! Placeholders are not wild: they count as an ordinary tile with the
//! wildcard's face.
//!
//! The set search peels the lowest remaining real tile and tries every
//! meld that can contain it. Because that tile is the lowest, a run holding
//! it either starts at it (optionally after some wilds) or, for a rank-1
//! tile, ends at it through the 13→1 wrap.

use serde::Serialize;

use crate::core::{Color, Tile, TileFace, MAX_RANK};

/// Number of tiles a finishing hand must have.
pub const WINNING_HAND_SIZE: usize = 14;

const PAIRS_NEEDED: usize = 7;
const SUITS: usize = 4;
const MIN_MELD: usize = 3;
const MAX_GROUP: usize = 4;

/// Which decomposition made the hand valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandPattern {
    Sets,
    Pairs,
}

/// Verdict on a hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    /// The hand held at least one wild tile.
    pub used_wildcard: bool,
    pub pattern: Option<HandPattern>,
}

impl Validation {
    const INVALID: Validation = Validation {
        is_valid: false,
        used_wildcard: false,
        pattern: None,
    };
}

/// Real tiles by `[suit][rank]`, plus the number of wilds.
#[derive(Clone, Debug, Default)]
struct Counts {
    tiles: [[u8; MAX_RANK as usize + 1]; SUITS],
    wilds: u8,
}

impl Counts {
    fn from_hand(hand: &[Tile], wildcard: TileFace) -> Option<Self> {
        let mut counts = Counts::default();
        for tile in hand {
            if tile.is_wild(wildcard) {
                counts.wilds += 1;
                continue;
            }
            let face = tile.effective_face(wildcard);
            let suit = face.color.suit_index()?;
            if !(1..=MAX_RANK).contains(&face.rank) {
                return None;
            }
            counts.tiles[suit][face.rank as usize] += 1;
        }
        Some(counts)
    }

    /// Lowest-rank real tile still present.
    fn lowest(&self) -> Option<(usize, usize)> {
        (1..=MAX_RANK as usize)
            .flat_map(|rank| (0..SUITS).map(move |suit| (suit, rank)))
            .find(|&(suit, rank)| self.tiles[suit][rank] > 0)
    }

    fn has(&self, suit: usize, rank: usize) -> bool {
        self.tiles[suit][rank] > 0
    }
}

/// Decide whether a 14-tile hand is a complete winning hand.
#[must_use]
pub fn validate_hand(hand: &[Tile], wildcard: TileFace) -> Validation {
    if hand.len() != WINNING_HAND_SIZE || wildcard.color == Color::Fake {
        return Validation::INVALID;
    }
    let Some(mut counts) = Counts::from_hand(hand, wildcard) else {
        return Validation::INVALID;
    };
    let used_wildcard = counts.wilds > 0;

    let pattern = if covers_with_pairs(&counts) {
        Some(HandPattern::Pairs)
    } else if covers_with_sets(&mut counts) {
        Some(HandPattern::Sets)
    } else {
        None
    };

    Validation {
        is_valid: pattern.is_some(),
        used_wildcard: pattern.is_some() && used_wildcard,
        pattern,
    }
}

/// Closed form: whole pairs, then wilds complete leftover singles. Wilds
/// left over after that share one face, so two of them are a pair too.
fn covers_with_pairs(counts: &Counts) -> bool {
    let mut pairs = 0usize;
    let mut singles = 0usize;
    for suit in &counts.tiles {
        for &n in &suit[1..] {
            pairs += usize::from(n / 2);
            singles += usize::from(n % 2);
        }
    }
    let wilds = usize::from(counts.wilds);
    let completed = singles.min(wilds);
    pairs += completed + (wilds - completed) / 2;
    pairs >= PAIRS_NEEDED
}

fn covers_with_sets(counts: &mut Counts) -> bool {
    let Some((suit, rank)) = counts.lowest() else {
        // Wilds never form a meld on their own.
        return counts.wilds == 0;
    };

    counts.tiles[suit][rank] -= 1;
    let found = try_groups(counts, suit, rank)
        || try_runs(counts, suit, rank)
        || (rank == 1 && try_wrapped_runs(counts, suit));
    counts.tiles[suit][rank] += 1;
    found
}

/// Groups containing the (already removed) anchor tile.
fn try_groups(counts: &mut Counts, suit: usize, rank: usize) -> bool {
    let others: Vec<usize> = (0..SUITS)
        .filter(|&s| s != suit && counts.has(s, rank))
        .collect();

    for mask in 0u8..(1 << others.len()) {
        let chosen: Vec<usize> = others
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &s)| s)
            .collect();
        let reals = 1 + chosen.len();

        for wilds in 0..=counts.wilds as usize {
            let size = reals + wilds;
            if size > MAX_GROUP {
                break;
            }
            if size < MIN_MELD {
                continue;
            }

            for &s in &chosen {
                counts.tiles[s][rank] -= 1;
            }
            counts.wilds -= wilds as u8;
            let found = covers_with_sets(counts);
            counts.wilds += wilds as u8;
            for &s in &chosen {
                counts.tiles[s][rank] += 1;
            }
            if found {
                return true;
            }
        }
    }
    false
}

/// Runs that start at the anchor, optionally preceded by wilds.
fn try_runs(counts: &mut Counts, suit: usize, rank: usize) -> bool {
    let max_prefix = (counts.wilds as usize).min(rank - 1);
    for prefix in 0..=max_prefix {
        counts.wilds -= prefix as u8;
        let start = rank - prefix;
        let found = extend_run(counts, suit, start, rank, 1 + prefix);
        counts.wilds += prefix as u8;
        if found {
            return true;
        }
    }
    false
}

/// Grow a run past `last`, recursing on the remainder at every legal length.
///
/// A real tile is always preferred over a wild for the next rank: any
/// cover using the wild there can swap it with that real tile.
fn extend_run(counts: &mut Counts, suit: usize, start: usize, last: usize, len: usize) -> bool {
    if len >= MIN_MELD && covers_with_sets(counts) {
        return true;
    }

    let max = MAX_RANK as usize;
    // 13 → 1 wrap is allowed once, as the final tile, if 1 is not already in the run.
    let next = if last < max {
        last + 1
    } else if start > 1 {
        1
    } else {
        return false;
    };
    let terminal = next == 1;

    let used_wild = if counts.has(suit, next) {
        counts.tiles[suit][next] -= 1;
        false
    } else if counts.wilds > 0 {
        counts.wilds -= 1;
        true
    } else {
        return false;
    };

    let found = if terminal {
        len + 1 >= MIN_MELD && covers_with_sets(counts)
    } else {
        extend_run(counts, suit, start, next, len + 1)
    };

    if used_wild {
        counts.wilds += 1;
    } else {
        counts.tiles[suit][next] += 1;
    }
    found
}

/// Runs ending `…, 12, 13, 1` at a rank-1 anchor, built downward from 13.
fn try_wrapped_runs(counts: &mut Counts, suit: usize) -> bool {
    let mut consumed: Vec<(usize, bool)> = Vec::new();
    let mut found = false;

    for rank in (2..=MAX_RANK as usize).rev() {
        let used_wild = if counts.has(suit, rank) {
            counts.tiles[suit][rank] -= 1;
            false
        } else if counts.wilds > 0 {
            counts.wilds -= 1;
            true
        } else {
            break;
        };
        consumed.push((rank, used_wild));

        if consumed.len() + 1 >= MIN_MELD && covers_with_sets(counts) {
            found = true;
            break;
        }
    }

    for (rank, used_wild) in consumed {
        if used_wild {
            counts.wilds += 1;
        } else {
            counts.tiles[suit][rank] += 1;
        }
    }
    found
}
