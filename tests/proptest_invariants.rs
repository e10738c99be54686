//! Property-based invariant tests for the engines.
//!
//! Uses proptest to generate random seeds, plays matches by repeatedly
//! timing out the current seat (auto-play), and checks tile conservation,
//! hand sizes and redaction at every step.

use proptest::prelude::*;

use okey_server::core::{
    full_deck, ConnectionId, GameMode, GameRng, GameState, SeatInfo, TileFace, TileId, TurnPhase,
    DECK_SIZE,
};
use okey_server::games::new_engine;
use okey_server::rules::{Outcome, RulesEngine};
use okey_server::validator::validate_hand;

const MAX_STEPS: usize = 400;

fn seats(count: usize) -> Vec<SeatInfo> {
    (0..count)
        .map(|i| SeatInfo::new(ConnectionId(i as u64 + 1), format!("p{i}")))
        .collect()
}

/// Every tile is in exactly one place.
fn conserved(state: &GameState) -> bool {
    let mut ids = state.tile_ids();
    ids.sort_unstable();
    ids == (0..DECK_SIZE as u16).map(TileId).collect::<Vec<_>>()
}

fn base_hand(mode: GameMode) -> usize {
    match mode {
        GameMode::Classic => 14,
        GameMode::HundredOne => 21,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Test that auto-played matches keep every tile, phase and redaction invariant.
    #[test]
    fn auto_play_preserves_invariants(
        seed in 0u64..1_000_000,
        four in any::<bool>(),
        hundred_one in any::<bool>(),
    ) {
        let mode = if hundred_one { GameMode::HundredOne } else { GameMode::Classic };
        let count = if four { 4 } else { 2 };
        let mut engine = new_engine(mode, &seats(count), 30, GameRng::new(seed));
        let hand_size = base_hand(mode);

        prop_assert!(conserved(engine.state()), "seed {seed}: bad deal");

        for step in 0..MAX_STEPS {
            let outcome = engine.timeout();
            let state = engine.state();

            prop_assert!(conserved(state), "seed {seed}: tiles lost at step {step}");

            if let Outcome::Finished(result) = outcome {
                prop_assert!(!state.is_playing());
                prop_assert!(result.winner.is_none(), "auto-play never finishes a hand");
                break;
            }

            // After an auto-play the next seat waits to draw with a base hand.
            prop_assert_eq!(state.turn_phase, TurnPhase::AwaitingDraw);
            prop_assert_eq!(state.current_player().hand.len(), hand_size);

            let viewer = state.current_player().id;
            let view = state.redacted_for(Some(viewer));
            for player in view.players.values() {
                prop_assert_eq!(player.id == viewer, !player.hand.is_empty());
            }
        }
    }

    /// Test that shuffling a hand never changes its verdict.
    #[test]
    fn validator_ignores_tile_order(seed in 0u64..1_000_000, wild_index in 0usize..104) {
        let mut rng = GameRng::new(seed);
        let mut deck = full_deck();
        let wildcard: TileFace = deck[wild_index].face();
        rng.shuffle(&mut deck);

        let mut hand: Vec<_> = deck.into_iter().take(14).collect();
        let forward = validate_hand(&hand, wildcard);
        hand.reverse();
        prop_assert_eq!(validate_hand(&hand, wildcard), forward);
        prop_assert_eq!(forward.is_valid, forward.pattern.is_some());
    }
}
