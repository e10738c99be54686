//! Room layer: lobby bookkeeping, sessions, the wire protocol and the
//! orchestrator that ties them to the engines.
//!
//! The orchestrator is synchronous and returns [`Effect`]s; `server` owns
//! the async side (sockets, timers).

pub mod lobby;
pub mod orchestrator;
pub mod protocol;
pub mod session;
pub mod timers;

pub use lobby::{Room, RoomPlayer, Spectator};
pub use orchestrator::{Orchestrator, BOT_ID_BASE};
pub use protocol::{
    ChatMessage, ClientCommand, GameActionRequest, PlayerView, RoomCheck, RoomData, RoomPhase,
    RoomSummary, ServerEvent, SpectatorView,
};
pub use session::{Session, SessionRegistry};
pub use timers::{Effect, TimerEvent, TimerKey, TimerKind};
