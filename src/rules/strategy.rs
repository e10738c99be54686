//! Discard choice for timeout auto-play and bots.

use crate::core::{GameRng, Tile, TileFace, TileId};

/// The highest-value tile that is not wild. Placeholders are valued at the
/// wildcard rank.
#[must_use]
pub fn pick_discard(hand: &[Tile], wildcard: TileFace) -> Option<TileId> {
    hand.iter()
        .filter(|t| !t.is_wild(wildcard))
        .max_by_key(|t| t.face_value(wildcard))
        .map(|t| t.id)
}

/// [`pick_discard`], or a random tile when only wilds are left.
pub fn choose_discard(hand: &[Tile], wildcard: TileFace, rng: &mut GameRng) -> Option<TileId> {
    pick_discard(hand, wildcard).or_else(|| rng.choose(hand).map(|t| t.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;

    const WILD: TileFace = TileFace::new(Color::Blue, 13);

    #[test]
    fn test_pick_highest_non_wild() {
        let hand = [
            Tile::new(TileId(0), Color::Red, 4),
            Tile::new(TileId(1), Color::Blue, 13),
            Tile::new(TileId(2), Color::Black, 11),
            Tile::new(TileId(3), Color::Yellow, 2),
        ];
        assert_eq!(pick_discard(&hand, WILD), Some(TileId(2)));
    }

    #[test]
    fn test_placeholder_valued_at_wildcard_rank() {
        let hand = [
            Tile::new(TileId(0), Color::Red, 12),
            Tile::placeholder(TileId(104)),
        ];
        assert_eq!(pick_discard(&hand, WILD), Some(TileId(104)));
    }

    #[test]
    fn test_only_wilds_falls_back_to_random() {
        let hand = [
            Tile::new(TileId(38), Color::Blue, 13),
            Tile::new(TileId(90), Color::Blue, 13),
        ];
        assert_eq!(pick_discard(&hand, WILD), None);

        let mut rng = GameRng::new(3);
        let chosen = choose_discard(&hand, WILD, &mut rng).unwrap();
        assert!(hand.iter().any(|t| t.id == chosen));
        assert_eq!(choose_discard(&[], WILD, &mut rng), None);
    }
}
