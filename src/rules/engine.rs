//! Rules engine trait for the game variants.
//!
//! An engine owns one match: its `GameState` and the RNG stream forked for
//! it. Every mutation goes through [`RulesEngine::apply_action`], which
//! either applies the whole action or returns a `RuleError` and leaves the
//! state untouched.

use crate::core::{
    ConnectionId, GameAction, GameEvent, GameMode, GameRng, GameState, TurnPhase, WinType,
};
use crate::error::RuleError;

use super::strategy::choose_discard;

/// Result of a completed match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// `None` when the deck ran out.
    pub winner: Option<ConnectionId>,
    pub win_type: Option<WinType>,
    /// Ledger change per player name.
    pub deltas: Vec<(String, i32)>,
}

impl MatchResult {
    /// A drawn match: no winner, no score change.
    #[must_use]
    pub fn drawn() -> Self {
        Self {
            winner: None,
            win_type: None,
            deltas: Vec::new(),
        }
    }
}

/// What a successful action led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The match goes on.
    Continue,
    /// The match just ended.
    Finished(MatchResult),
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `apply_action`: validate fully before mutating; reset the turn timer
///   on success
/// - `state_mut`: only for the default methods below; callers outside an
///   engine go through `apply_action`
pub trait RulesEngine: Send + std::fmt::Debug {
    /// Which variant this is.
    fn mode(&self) -> GameMode;

    /// The authoritative state.
    fn state(&self) -> &GameState;

    #[doc(hidden)]
    fn state_mut(&mut self) -> &mut GameState;

    /// The match's RNG stream.
    fn rng(&mut self) -> &mut GameRng;

    /// Apply an action on behalf of the seat held by `actor`.
    fn apply_action(
        &mut self,
        actor: ConnectionId,
        action: &GameAction,
    ) -> Result<Outcome, RuleError>;

    // === Provided Methods ===

    /// One second of the turn clock elapsed. Returns the seconds left.
    fn tick(&mut self) -> u32 {
        self.state_mut().tick()
    }

    /// Play the current seat's turn for it: draw from the center if it has
    /// not drawn yet, then discard its highest-value non-wild tile.
    fn auto_play(&mut self) -> Result<Outcome, RuleError> {
        let actor = self.state().current_player().id;

        if self.state().turn_phase == TurnPhase::AwaitingDraw {
            if let finished @ Outcome::Finished(_) =
                self.apply_action(actor, &GameAction::DrawCenter)?
            {
                return Ok(finished);
            }
        }

        let hand: Vec<_> = self.state().current_player().hand.iter().copied().collect();
        let wildcard = self.state().wildcard;
        let tile = choose_discard(&hand, wildcard, self.rng()).ok_or(RuleError::MustKeepTile)?;

        let outcome = self.apply_action(actor, &GameAction::Discard { tile })?;
        self.state_mut().event = Some(GameEvent::AutoPlayed);
        Ok(outcome)
    }

    /// The turn clock ran out. Auto-plays; if that fails the seat keeps the
    /// turn with a fresh clock.
    fn timeout(&mut self) -> Outcome {
        match self.auto_play() {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "auto-play failed, passing");
                self.state_mut().reset_timer();
                Outcome::Continue
            }
        }
    }

    /// Swap a reconnecting player's new connection id into the match.
    fn rebind_player(&mut self, old: ConnectionId, new: ConnectionId) -> bool {
        self.state_mut().rebind(old, new)
    }
}
