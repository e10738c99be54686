//! Meld checks and scoring for table declarations (101 variant).
//!
//! Melds are judged exactly in the order the client submitted them. A wild
//! tile takes the value its position implies: in a group, the group's rank;
//! in a run, one more than the tile before it (equivalently one less than
//! the tile after it). No search for a better placement is attempted.

use serde::Serialize;

use crate::core::{Tile, TileFace, MAX_RANK};
use crate::error::RuleError;

/// Shape of a scored set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MeldShape {
    Group,
    Run,
}

/// A valid set and its point value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredMeld {
    pub shape: MeldShape,
    pub points: u32,
}

fn invalid(reason: &str) -> RuleError {
    RuleError::InvalidMeld(reason.to_string())
}

/// Check a run or group in submitted order and compute its points.
pub fn score_meld(tiles: &[Tile], wildcard: TileFace) -> Result<ScoredMeld, RuleError> {
    if tiles.len() < 3 {
        return Err(invalid("a set needs at least three tiles"));
    }

    // `None` marks a wild.
    let faces: Vec<Option<TileFace>> = tiles
        .iter()
        .map(|t| (!t.is_wild(wildcard)).then(|| t.effective_face(wildcard)))
        .collect();
    let reals: Vec<(usize, TileFace)> = faces
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.map(|f| (i, f)))
        .collect();
    let Some(&(first_idx, first)) = reals.first() else {
        return Err(invalid("a set needs at least one real tile"));
    };

    if reals.iter().all(|(_, f)| f.rank == first.rank) {
        let group = score_group(tiles.len(), &reals, first.rank);
        // A lone real tile among wilds can still read as a run.
        if group.is_ok() || reals.len() > 1 {
            return group;
        }
    }
    score_run(&faces, first_idx, first)
}

fn score_group(
    len: usize,
    reals: &[(usize, TileFace)],
    rank: u8,
) -> Result<ScoredMeld, RuleError> {
    if len > 4 {
        return Err(invalid("a group has at most four tiles"));
    }
    let mut colors: Vec<_> = reals.iter().map(|(_, f)| f.color).collect();
    colors.sort_unstable();
    colors.dedup();
    if colors.len() != reals.len() {
        return Err(invalid("group colors must differ"));
    }
    Ok(ScoredMeld {
        shape: MeldShape::Group,
        points: u32::from(rank) * len as u32,
    })
}

fn score_run(
    faces: &[Option<TileFace>],
    first_idx: usize,
    first: TileFace,
) -> Result<ScoredMeld, RuleError> {
    let start = i32::from(first.rank) - first_idx as i32;
    if start < 1 {
        return Err(invalid("run starts below 1"));
    }

    let wrap_rank = i32::from(MAX_RANK) + 1;
    let last = faces.len() - 1;
    let mut points = 0u32;

    for (i, face) in faces.iter().enumerate() {
        let expected = start + i as i32;
        // The position after 13 is a 1, allowed only as the final tile of a
        // run that did not already start at 1.
        let rank = if expected < wrap_rank {
            expected as u8
        } else if expected == wrap_rank && i == last && start > 1 {
            1
        } else {
            return Err(invalid("run is too long"));
        };

        if let Some(face) = face {
            if face.color != first.color {
                return Err(invalid("run colors must match"));
            }
            if face.rank != rank {
                return Err(invalid("run ranks must be consecutive"));
            }
        }
        points += u32::from(rank);
    }

    Ok(ScoredMeld {
        shape: MeldShape::Run,
        points,
    })
}

/// Check a declared pair: equal faces, or one real tile and one wild.
pub fn check_pair(tiles: &[Tile], wildcard: TileFace) -> Result<(), RuleError> {
    let [a, b] = tiles else {
        return Err(invalid("a pair has exactly two tiles"));
    };
    match (a.is_wild(wildcard), b.is_wild(wildcard)) {
        (true, true) => Err(invalid("a pair needs a real tile")),
        (true, false) | (false, true) => Ok(()),
        (false, false) if a.effective_face(wildcard) == b.effective_face(wildcard) => Ok(()),
        (false, false) => Err(invalid("pair tiles must match")),
    }
}
