//! Opening thresholds and round scoring.

use crate::core::{GameState, MeldKind, Seat};

/// Set points needed for a first opening.
pub const OPENING_POINTS: u32 = 101;

/// Pairs needed for a first opening.
pub const OPENING_PAIRS: usize = 5;

const WINNER_SCORE: i32 = -101;
const UNOPENED_PENALTY: i32 = 202;

/// Score change per seat for a round won by `winner`.
///
/// `okey_finish` doubles every entry.
#[must_use]
pub fn round_scores(state: &GameState, winner: Seat, okey_finish: bool) -> Vec<(Seat, i32)> {
    let multiplier = if okey_finish { 2 } else { 1 };
    state
        .players
        .iter()
        .map(|(seat, player)| {
            let base = if seat == winner {
                WINNER_SCORE
            } else if !player.opened {
                UNOPENED_PENALTY
            } else {
                let left: u32 = player.hand.iter().map(|t| t.face_value(state.wildcard)).sum();
                let pairs = if player.opened_with == Some(MeldKind::Pairs) { 2 } else { 1 };
                left as i32 * pairs
            };
            (seat, base * multiplier)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Color, ConnectionId, GameMode, GameRng, SeatInfo, Tile, TileId};
    use im::Vector;

    fn state() -> GameState {
        let seats: Vec<SeatInfo> = (0..4)
            .map(|i| SeatInfo::new(ConnectionId(i + 1), format!("p{i}")))
            .collect();
        GameState::deal(GameMode::HundredOne, &seats, 21, 30, &mut GameRng::new(9))
    }

    #[test]
    fn test_round_scores() {
        let mut state = state();
        let wildcard = state.wildcard;

        state.players[Seat(0)].hand = Vector::new();
        state.players[Seat(0)].opened = true;

        state.players[Seat(1)].opened = false;

        state.players[Seat(2)].opened = true;
        state.players[Seat(2)].opened_with = Some(MeldKind::Sets);
        state.players[Seat(2)].hand = Vector::from(vec![
            Tile::new(TileId(0), Color::Red, 1),
            Tile::new(TileId(12), Color::Red, 13),
        ]);

        state.players[Seat(3)].opened = true;
        state.players[Seat(3)].opened_with = Some(MeldKind::Pairs);
        state.players[Seat(3)].hand = Vector::from(vec![
            Tile::new(TileId(20), Color::Yellow, 8),
            Tile::placeholder(TileId(104)),
        ]);
        let seat3 = (8 + i32::from(wildcard.rank)) * 2;

        let scores = round_scores(&state, Seat(0), false);
        assert_eq!(
            scores,
            vec![(Seat(0), -101), (Seat(1), 202), (Seat(2), 14), (Seat(3), seat3)]
        );

        let doubled = round_scores(&state, Seat(0), true);
        assert_eq!(doubled[0], (Seat(0), -202));
        assert_eq!(doubled[1], (Seat(1), 404));
    }
}
