//! Timers and side effects.
//!
//! The orchestrator is synchronous: instead of sleeping or writing to
//! sockets it returns a list of [`Effect`]s, which the server actor carries
//! out. A scheduled timer comes back as a [`TimerEvent`] carrying the epoch
//! it was scheduled under; the room ignores it if its epoch has moved on.

use std::time::Duration;

use crate::core::{ConnectionId, RoomCode, SessionToken};

use super::protocol::ServerEvent;

/// What a timer is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One second of the turn clock.
    TurnTick,
    /// A bot's thinking delay.
    BotMove,
    /// One step of the pre-match countdown.
    StartCountdown,
    /// Pause after the last restart vote.
    RestartDelay,
    /// Reserved-seat window of a disconnected player.
    Grace(SessionToken),
}

/// At most one timer per key is live; scheduling a key replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub room: RoomCode,
    pub kind: TimerKind,
}

impl TimerKey {
    #[must_use]
    pub fn new(room: RoomCode, kind: TimerKind) -> Self {
        Self { room, kind }
    }

    /// Every per-room key except grace windows.
    #[must_use]
    pub fn room_keys(room: &RoomCode) -> [TimerKey; 4] {
        [
            TimerKind::TurnTick,
            TimerKind::BotMove,
            TimerKind::StartCountdown,
            TimerKind::RestartDelay,
        ]
        .map(|kind| TimerKey::new(room.clone(), kind))
    }
}

/// A timer that fired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub key: TimerKey,
    pub epoch: u64,
}

/// Side effect requested by the orchestrator.
#[derive(Clone, Debug)]
pub enum Effect {
    /// Push an event to one connection.
    Send { to: ConnectionId, event: ServerEvent },
    /// Fire `key` after `after`, replacing any pending timer with that key.
    Schedule {
        key: TimerKey,
        after: Duration,
        epoch: u64,
    },
    /// Drop the pending timer with this key, if any.
    Cancel(TimerKey),
}

impl Effect {
    #[must_use]
    pub fn send(to: ConnectionId, event: ServerEvent) -> Self {
        Effect::Send { to, event }
    }
}
