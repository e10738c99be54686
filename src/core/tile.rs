//! Tiles, faces and the full deck.
//!
//! A deck is two copies of four colors × ranks 1-13 plus two placeholder
//! ("fake okey") tiles, 106 tiles in all. After dealing, an indicator tile
//! is turned up; the wildcard face is the indicator's color with rank + 1
//! (13 wraps to 1).
//!
//! Tiles whose face equals the wildcard are wild. Placeholders are not
//! wild: they stand in for the wildcard face as an ordinary tile.

use serde::{Deserialize, Serialize};

use super::ids::TileId;

/// Highest rank on a suited tile.
pub const MAX_RANK: u8 = 13;

/// Total number of tiles in a deck.
pub const DECK_SIZE: usize = 106;

/// Suited tiles in a deck (ids `0..SUITED_TILES`).
pub const SUITED_TILES: usize = 104;

/// Tile color. `Fake` is the placeholder pseudo-suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Black,
    Fake,
}

impl Color {
    /// The four real suits, in deck order.
    pub const SUITS: [Color; 4] = [Color::Red, Color::Yellow, Color::Blue, Color::Black];

    /// Index 0-3 for real suits.
    #[must_use]
    pub fn suit_index(self) -> Option<usize> {
        Self::SUITS.iter().position(|&c| c == self)
    }
}

/// Color and rank, without identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileFace {
    pub color: Color,
    pub rank: u8,
}

impl TileFace {
    /// Wildcard used when the indicator is a placeholder.
    pub const FALLBACK_WILDCARD: TileFace = TileFace {
        color: Color::Red,
        rank: 1,
    };

    #[must_use]
    pub const fn new(color: Color, rank: u8) -> Self {
        Self { color, rank }
    }

    /// The wildcard face designated by an indicator face.
    #[must_use]
    pub fn wildcard_for(indicator: TileFace) -> TileFace {
        if indicator.color == Color::Fake {
            return Self::FALLBACK_WILDCARD;
        }
        let rank = if indicator.rank >= MAX_RANK {
            1
        } else {
            indicator.rank + 1
        };
        TileFace::new(indicator.color, rank)
    }
}

impl std::fmt::Display for TileFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}", self.color, self.rank)
    }
}

/// A physical tile. Immutable; identity is the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub color: Color,
    pub rank: u8,
}

impl Tile {
    #[must_use]
    pub const fn new(id: TileId, color: Color, rank: u8) -> Self {
        Self { id, color, rank }
    }

    #[must_use]
    pub const fn placeholder(id: TileId) -> Self {
        Self {
            id,
            color: Color::Fake,
            rank: 0,
        }
    }

    #[must_use]
    pub fn face(&self) -> TileFace {
        TileFace::new(self.color, self.rank)
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.color == Color::Fake
    }

    /// Is this tile wild under the given wildcard face?
    #[must_use]
    pub fn is_wild(&self, wildcard: TileFace) -> bool {
        !self.is_placeholder() && self.face() == wildcard
    }

    /// The face this tile plays as: placeholders take the wildcard face.
    #[must_use]
    pub fn effective_face(&self, wildcard: TileFace) -> TileFace {
        if self.is_placeholder() {
            wildcard
        } else {
            self.face()
        }
    }

    /// Point value of a tile left in hand: its effective rank.
    #[must_use]
    pub fn face_value(&self, wildcard: TileFace) -> u32 {
        u32::from(self.effective_face(wildcard).rank)
    }
}

/// Build the full, unshuffled deck.
#[must_use]
pub fn full_deck() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(DECK_SIZE);
    let mut next = 0u16;
    for _copy in 0..2 {
        for color in Color::SUITS {
            for rank in 1..=MAX_RANK {
                tiles.push(Tile::new(TileId(next), color, rank));
                next += 1;
            }
        }
    }
    tiles.push(Tile::placeholder(TileId(next)));
    tiles.push(Tile::placeholder(TileId(next + 1)));
    tiles
}

/// Id of a suited tile in [`full_deck`] order. `copy` is 0 or 1.
///
/// Returns `None` for placeholders, out-of-range ranks and copies.
#[must_use]
pub fn suited_tile_id(face: TileFace, copy: u8) -> Option<TileId> {
    let suit = face.color.suit_index()?;
    if !(1..=MAX_RANK).contains(&face.rank) || copy > 1 {
        return None;
    }
    let per_copy = Color::SUITS.len() * MAX_RANK as usize;
    let index = usize::from(copy) * per_copy + suit * MAX_RANK as usize + usize::from(face.rank - 1);
    Some(TileId(index as u16))
}
