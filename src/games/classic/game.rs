//! Classic game implementation.

use tracing::{debug, info};

use crate::core::{
    CenterDraw, ConnectionId, GameAction, GameMode, GameRng, GameState, Seat, SeatInfo, Tile,
    TileId, TurnPhase, WinType,
};
use crate::error::RuleError;
use crate::rules::{MatchResult, Outcome, RulesEngine};
use crate::validator::{validate_hand, HandPattern, WINNING_HAND_SIZE};

/// Classic Okey engine.
#[derive(Clone, Debug)]
pub struct ClassicGame {
    state: GameState,
    rng: GameRng,
}

impl ClassicGame {
    /// Tiles per seat while waiting to draw.
    pub const HAND_SIZE: usize = 14;

    /// Deal a new match.
    #[must_use]
    pub fn new(seats: &[SeatInfo], turn_seconds: u32, mut rng: GameRng) -> Self {
        let state = GameState::deal(GameMode::Classic, seats, Self::HAND_SIZE, turn_seconds, &mut rng);
        info!(
            seats = seats.len(),
            dealer = %state.turn_index,
            wildcard = %state.wildcard,
            "classic match dealt"
        );
        Self { state, rng }
    }

    /// Wrap an existing state, for rigged hands.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn from_state(state: GameState, rng: GameRng) -> Self {
        Self { state, rng }
    }

    fn expect_hand(&self, seat: Seat, expected: usize) -> Result<(), RuleError> {
        let actual = self.state.players[seat].hand.len();
        if actual != expected {
            return Err(RuleError::WrongHandSize { expected, actual });
        }
        Ok(())
    }

    fn draw_center(&mut self, seat: Seat) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDraw)?;
        self.expect_hand(seat, Self::HAND_SIZE)?;

        self.state.clear_event();
        match self.state.draw_center(seat, &mut self.rng) {
            CenterDraw::Drawn(tile) => {
                debug!(%seat, tile = %tile.id, deck = self.state.deck_count, "drew from center");
                self.state.reset_timer();
                Ok(Outcome::Continue)
            }
            CenterDraw::Exhausted => {
                info!("deck exhausted, match drawn");
                Ok(Outcome::Finished(MatchResult::drawn()))
            }
        }
    }

    fn draw_left(&mut self, seat: Seat) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDraw)?;
        self.expect_hand(seat, Self::HAND_SIZE)?;

        let tile = self.state.draw_left(seat)?;
        self.state.clear_event();
        self.state.reset_timer();
        debug!(%seat, tile = %tile.id, "drew from left discard");
        Ok(Outcome::Continue)
    }

    fn discard(&mut self, seat: Seat, tile: TileId) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDiscard)?;
        self.expect_hand(seat, Self::HAND_SIZE + 1)?;

        self.state.discard(seat, tile)?;
        self.state.clear_event();
        self.state.advance_turn();
        debug!(%seat, %tile, next = %self.state.turn_index, "discarded");
        Ok(Outcome::Continue)
    }

    fn finish(&mut self, seat: Seat, tile: TileId) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDiscard)?;
        self.expect_hand(seat, Self::HAND_SIZE + 1)?;

        let player = &self.state.players[seat];
        let finish_tile = player
            .hand
            .iter()
            .find(|t| t.id == tile)
            .copied()
            .ok_or(RuleError::TileNotInHand(tile))?;
        let rest: Vec<Tile> = player.hand.iter().filter(|t| t.id != tile).copied().collect();
        debug_assert_eq!(rest.len(), WINNING_HAND_SIZE);

        let wildcard = self.state.wildcard;
        let validation = validate_hand(&rest, wildcard);
        if !validation.is_valid {
            return Err(RuleError::InvalidHand);
        }

        let win_type = if finish_tile.is_wild(wildcard) {
            WinType::OkeyFinish
        } else if finish_tile.is_placeholder() {
            WinType::FakeFinish
        } else if validation.pattern == Some(HandPattern::Pairs) {
            WinType::Pairs
        } else if rest.iter().all(|t| !t.is_wild(wildcard) && !t.is_placeholder()) {
            WinType::Clean
        } else {
            WinType::Normal
        };

        let name = player.name.clone();
        self.state.discard(seat, tile)?;
        self.state.clear_event();
        self.state.finish(Some(seat), Some(win_type));

        info!(winner = %name, ?win_type, points = win_type.points(), "classic match won");
        Ok(Outcome::Finished(MatchResult {
            winner: self.state.winner_id,
            win_type: Some(win_type),
            deltas: vec![(name, win_type.points())],
        }))
    }
}

impl RulesEngine for ClassicGame {
    fn mode(&self) -> GameMode {
        GameMode::Classic
    }

    fn state(&self) -> &GameState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    fn rng(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    fn apply_action(
        &mut self,
        actor: ConnectionId,
        action: &GameAction,
    ) -> Result<Outcome, RuleError> {
        let seat = self.state.ensure_turn(actor)?;
        match action {
            GameAction::DrawCenter => self.draw_center(seat),
            GameAction::DrawLeft => self.draw_left(seat),
            GameAction::Discard { tile } => self.discard(seat, *tile),
            GameAction::FinishGame { tile } => self.finish(seat, *tile),
            GameAction::OpenHand { .. }
            | GameAction::ProcessTile { .. }
            | GameAction::RestartGame => Err(RuleError::UnsupportedAction(action.name())),
        }
    }
}
