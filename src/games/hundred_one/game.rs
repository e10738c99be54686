//! 101 game implementation.

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::core::{
    CenterDraw, ConnectionId, GameAction, GameEvent, GameMode, GameRng, GameState, MeldKind,
    MeldTiles, Seat, SeatInfo, Tile, TileId, TurnPhase, WinType,
};
use crate::error::RuleError;
use crate::rules::{MatchResult, Outcome, RulesEngine};
use crate::validator::{check_pair, score_meld};

use super::scoring::{round_scores, OPENING_PAIRS, OPENING_POINTS};

/// 101 Okey engine.
#[derive(Clone, Debug)]
pub struct HundredOneGame {
    state: GameState,
    rng: GameRng,
}

impl HundredOneGame {
    /// Tiles per seat while waiting to draw, before any opening.
    pub const HAND_SIZE: usize = 21;

    /// Deal a new match.
    #[must_use]
    pub fn new(seats: &[SeatInfo], turn_seconds: u32, mut rng: GameRng) -> Self {
        let state = GameState::deal(
            GameMode::HundredOne,
            seats,
            Self::HAND_SIZE,
            turn_seconds,
            &mut rng,
        );
        info!(
            seats = seats.len(),
            dealer = %state.turn_index,
            wildcard = %state.wildcard,
            "101 match dealt"
        );
        Self { state, rng }
    }

    /// Wrap an existing state, for rigged hands.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn from_state(state: GameState, rng: GameRng) -> Self {
        Self { state, rng }
    }

    fn draw_center(&mut self, seat: Seat) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDraw)?;

        self.state.clear_event();
        match self.state.draw_center(seat, &mut self.rng) {
            CenterDraw::Drawn(tile) => {
                debug!(%seat, tile = %tile.id, deck = self.state.deck_count, "drew from center");
                self.state.reset_timer();
                Ok(Outcome::Continue)
            }
            CenterDraw::Exhausted => {
                info!("deck exhausted, round ends without scoring");
                Ok(Outcome::Finished(MatchResult::drawn()))
            }
        }
    }

    fn draw_left(&mut self, seat: Seat) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDraw)?;

        let tile = self.state.draw_left(seat)?;
        self.state.clear_event();
        self.state.reset_timer();
        debug!(%seat, tile = %tile.id, "drew from left discard");
        Ok(Outcome::Continue)
    }

    fn discard(&mut self, seat: Seat, tile: TileId) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDiscard)?;

        let tile = self.state.discard(seat, tile)?;
        self.state.clear_event();

        if self.state.players[seat].hand.is_empty() {
            return Ok(Outcome::Finished(self.finish_round(seat, tile)));
        }

        self.state.advance_turn();
        debug!(%seat, tile = %tile.id, next = %self.state.turn_index, "discarded");
        Ok(Outcome::Continue)
    }

    fn finish_round(&mut self, winner: Seat, last: Tile) -> MatchResult {
        let okey_finish = last.is_wild(self.state.wildcard);
        let win_type = if okey_finish {
            WinType::OkeyFinish
        } else {
            WinType::Normal
        };

        let mut deltas = Vec::with_capacity(self.state.seat_count());
        for (seat, delta) in round_scores(&self.state, winner, okey_finish) {
            let player = &mut self.state.players[seat];
            player.score += delta;
            deltas.push((player.name.clone(), delta));
        }
        self.state.finish(Some(winner), Some(win_type));

        info!(winner = %self.state.players[winner].name, ?win_type, "101 round won");
        MatchResult {
            winner: self.state.winner_id,
            win_type: Some(win_type),
            deltas,
        }
    }

    /// Look up declared tile ids in the seat's hand.
    fn resolve_melds(&self, seat: Seat, melds: &[MeldTiles]) -> Result<Vec<Vec<Tile>>, RuleError> {
        let player = &self.state.players[seat];
        let mut seen = FxHashSet::default();
        let mut resolved = Vec::with_capacity(melds.len());

        for meld in melds {
            let mut tiles = Vec::with_capacity(meld.len());
            for &id in meld {
                if !seen.insert(id) {
                    return Err(RuleError::DuplicateTile(id));
                }
                let tile = player
                    .hand
                    .iter()
                    .find(|t| t.id == id)
                    .copied()
                    .ok_or(RuleError::TileNotInHand(id))?;
                tiles.push(tile);
            }
            resolved.push(tiles);
        }

        if seen.len() >= player.hand.len() {
            return Err(RuleError::MustKeepTile);
        }
        Ok(resolved)
    }

    fn open_hand(
        &mut self,
        seat: Seat,
        kind: MeldKind,
        melds: &[MeldTiles],
    ) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDiscard)?;
        if melds.is_empty() {
            return Err(RuleError::InvalidMeld("nothing declared".into()));
        }

        let player = &self.state.players[seat];
        if player.opened_with.is_some_and(|opened| opened != kind) {
            return Err(RuleError::MixedOpening);
        }
        let first_opening = !player.opened;
        let owner = player.id;

        let resolved = self.resolve_melds(seat, melds)?;
        let wildcard = self.state.wildcard;

        match kind {
            MeldKind::Sets => {
                let points = resolved
                    .iter()
                    .map(|tiles| score_meld(tiles, wildcard).map(|m| m.points))
                    .sum::<Result<u32, _>>()?;
                if first_opening && points < OPENING_POINTS {
                    return Err(RuleError::InsufficientPoints {
                        required: OPENING_POINTS,
                        got: points,
                    });
                }
                debug!(%seat, points, "sets declared");
            }
            MeldKind::Pairs => {
                for tiles in &resolved {
                    check_pair(tiles, wildcard)?;
                }
                if first_opening && resolved.len() < OPENING_PAIRS {
                    return Err(RuleError::InsufficientPairs {
                        required: OPENING_PAIRS,
                        got: resolved.len(),
                    });
                }
                debug!(%seat, pairs = resolved.len(), "pairs declared");
            }
        }

        for tiles in resolved {
            for tile in &tiles {
                self.state.take_from_hand(seat, tile.id)?;
            }
            self.state.push_table_set(kind, tiles, owner);
        }

        let player = &mut self.state.players[seat];
        player.opened = true;
        player.opened_with = Some(kind);
        self.state.event = Some(GameEvent::HandOpened);
        self.state.reset_timer();

        if first_opening {
            info!(%seat, ?kind, "hand opened");
        }
        Ok(Outcome::Continue)
    }

    fn process_tile(&mut self, seat: Seat, tile: TileId, set_id: u32) -> Result<Outcome, RuleError> {
        self.state.ensure_phase(TurnPhase::AwaitingDiscard)?;

        let player = &self.state.players[seat];
        if !player.opened {
            return Err(RuleError::NotOpened);
        }
        let tile = player
            .hand
            .iter()
            .find(|t| t.id == tile)
            .copied()
            .ok_or(RuleError::TileNotInHand(tile))?;
        if player.hand.len() <= 1 {
            return Err(RuleError::MustKeepTile);
        }

        let set = self
            .state
            .table
            .iter()
            .find(|s| s.id == set_id)
            .ok_or(RuleError::SetNotFound(set_id))?;
        if set.kind == MeldKind::Pairs {
            return Err(RuleError::CannotExtend);
        }

        let wildcard = self.state.wildcard;
        let mut back = set.tiles.clone();
        back.push(tile);
        let extended = if score_meld(&back, wildcard).is_ok() {
            back
        } else {
            let mut front = Vec::with_capacity(set.tiles.len() + 1);
            front.push(tile);
            front.extend(set.tiles.iter().copied());
            score_meld(&front, wildcard).map_err(|_| RuleError::CannotExtend)?;
            front
        };

        self.state.take_from_hand(seat, tile.id)?;
        if let Some(set) = self.state.table.iter_mut().find(|s| s.id == set_id) {
            set.tiles = extended;
        }
        self.state.event = Some(GameEvent::TileProcessed);
        self.state.reset_timer();
        debug!(%seat, tile = %tile.id, set_id, "tile added to table set");
        Ok(Outcome::Continue)
    }
}

impl RulesEngine for HundredOneGame {
    fn mode(&self) -> GameMode {
        GameMode::HundredOne
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
            GameAction::OpenHand { kind, melds } => self.open_hand(seat, *kind, melds),
            GameAction::ProcessTile { tile, set_id } => self.process_tile(seat, *tile, *set_id),
            GameAction::FinishGame { .. } | GameAction::RestartGame => {
                Err(RuleError::UnsupportedAction(action.name()))
            }
        }
    }
}
