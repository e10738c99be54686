//! Core value types: tiles, ids, seats, state, actions, RNG, configuration.
//!
//! Everything here is shared by both engine variants and the room layer.
//! Rule logic lives in `games`, the hand search in `validator`.

pub mod action;
pub mod config;
pub mod ids;
pub mod rng;
pub mod seat;
pub mod state;
pub mod tile;

pub use action::{GameAction, MeldKind, MeldTiles};
pub use config::{ConfigError, GameMode, RoomSettings, ServerConfig, SettingsUpdate, Visibility};
pub use ids::{ConnectionId, RoomCode, SessionToken, TileId};
pub use rng::GameRng;
pub use seat::{Seat, SeatMap};
pub use state::{
    CenterDraw, GameEvent, GameState, MatchStatus, OpenedSet, PlayerState, SeatInfo, TurnPhase,
    WinType,
};
pub use tile::{full_deck, suited_tile_id, Color, Tile, TileFace, DECK_SIZE, MAX_RANK};
