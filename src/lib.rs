//! # okey-server
//!
//! Authoritative real-time server for Okey and Okey 101.
//!
//! ## Design Principles
//!
//! 1. **Server-Authoritative**: Clients send intents; every rule is
//!    checked here and clients only ever see redacted snapshots.
//!
//! 2. **2 or 4 Seats**: Every API works in terms of `Seat` and
//!    `seat_count`. Nothing assumes a fixed table size.
//!
//! 3. **Deterministic**: Shuffles, dealer choice and bot fallbacks all
//!    draw from a seeded `GameRng`, so a match replays from its seed.
//!
//! ## Architecture
//!
//! - **Synchronous core**: engines and the room orchestrator are plain
//!   state machines returning effects. They never block or do I/O.
//!
//! - **Single actor**: one tokio task owns all rooms; connections and
//!   timers post messages to it.
//!
//! - **Persistent Data Structures**: hands, pools and discard piles use
//!   `im` vectors so per-recipient snapshots clone cheaply.
//!
//! ## Modules
//!
//! - `core`: tiles, ids, seats, game state, actions, RNG, configuration
//! - `validator`: winning-hand search and meld scoring
//! - `rules`: `RulesEngine` trait, timeout auto-play, discard heuristic
//! - `games`: the classic and 101 engines
//! - `room`: lobby, sessions, wire protocol, orchestrator
//! - `server`: tokio actor that executes orchestrator effects
//! - `net`: newline-delimited JSON over TCP

pub mod core;
pub mod error;
pub mod games;
pub mod net;
pub mod room;
pub mod rules;
pub mod server;
pub mod validator;

// Re-export commonly used types
pub use crate::core::{
    ConnectionId, GameAction, GameMode, GameRng, GameState, RoomCode, Seat, SeatMap,
    ServerConfig, SessionToken, Tile, TileFace, TileId,
};

pub use crate::error::{LifecycleError, Result, RuleError, ServerError, ValidationError};

pub use crate::games::{new_engine, ClassicGame, HundredOneGame};

pub use crate::rules::{MatchResult, Outcome, RulesEngine};

pub use crate::room::{ClientCommand, Effect, Orchestrator, ServerEvent};

pub use crate::server::ServerHandle;

pub use crate::validator::{validate_hand, HandPattern, Validation};
