//! Game actions.
//!
//! An action is a verb plus the tiles it names. Both engine variants take
//! the same `GameAction` type; a variant rejects verbs it does not support
//! with `RuleError::UnsupportedAction`.
//!
//! ```
//! use okey_server::core::{GameAction, TileId};
//!
//! let discard = GameAction::Discard { tile: TileId::new(12) };
//! assert_eq!(discard.name(), "DISCARD");
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::ids::TileId;

/// Tile ids of one declared meld. Melds are 2-5 tiles in practice.
pub type MeldTiles = SmallVec<[TileId; 5]>;

/// How an `OPEN_HAND` declaration partitions its tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeldKind {
    /// Runs and groups of three or more.
    Sets,
    /// Two-tile pairs.
    Pairs,
}

/// A single game action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameAction {
    /// Take the top tile of the center deck.
    DrawCenter,
    /// Take the top tile of the left neighbour's discard pile.
    DrawLeft,
    /// Put a tile on your own discard pile, ending the turn.
    Discard { tile: TileId },
    /// Declare a winning hand, throwing `tile` as the finishing tile.
    FinishGame { tile: TileId },
    /// Lay melds face-up on the table.
    OpenHand { kind: MeldKind, melds: Vec<MeldTiles> },
    /// Append one tile to an existing table set.
    ProcessTile { tile: TileId, set_id: u32 },
    /// Vote to start the next match. Handled by the room, not the engine.
    RestartGame,
}

impl GameAction {
    /// Wire name of the action.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::DrawCenter => "DRAW_CENTER",
            GameAction::DrawLeft => "DRAW_LEFT",
            GameAction::Discard { .. } => "DISCARD",
            GameAction::FinishGame { .. } => "FINISH_GAME",
            GameAction::OpenHand { .. } => "OPEN_HAND",
            GameAction::ProcessTile { .. } => "PROCESS_TILE",
            GameAction::RestartGame => "RESTART_GAME",
        }
    }
}
