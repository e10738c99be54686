//! A single room: seats, spectators, settings, score ledger and the live
//! engine.
//!
//! ## Seats
//!
//! `players` is in seat order and index 0 is the host. Removing the host
//! promotes whoever is next. Bots sit in seats like anyone else but have
//! no session.
//!
//! ## Epoch
//!
//! `epoch` changes whenever something invalidates pending timers: a match
//! launches or ends, an action is applied, a countdown is aborted. Timers
//! carry the epoch they were scheduled under and are dropped on mismatch.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;

use crate::core::{ConnectionId, GameMode, RoomCode, RoomSettings, SeatInfo, SessionToken};
use crate::rules::{MatchResult, RulesEngine};

use super::protocol::{PlayerView, RoomCheck, RoomData, RoomPhase, RoomSummary, SpectatorView};

/// Someone sitting in a seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomPlayer {
    pub id: ConnectionId,
    pub name: String,
    pub avatar: Option<String>,
    /// `None` for bots.
    pub token: Option<SessionToken>,
    pub is_bot: bool,
    pub connected: bool,
    pub ready: bool,
}

impl RoomPlayer {
    #[must_use]
    pub fn human(id: ConnectionId, name: String, avatar: Option<String>, token: SessionToken) -> Self {
        Self {
            id,
            name,
            avatar,
            token: Some(token),
            is_bot: false,
            connected: true,
            ready: false,
        }
    }

    #[must_use]
    pub fn bot(id: ConnectionId, name: String) -> Self {
        Self {
            id,
            name,
            avatar: None,
            token: None,
            is_bot: true,
            connected: true,
            ready: true,
        }
    }
}

/// Someone watching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spectator {
    pub id: ConnectionId,
    pub name: String,
}

#[derive(Debug)]
pub struct Room {
    pub code: RoomCode,
    pub mode: GameMode,
    pub settings: RoomSettings,
    pub max_players: usize,
    pub players: Vec<RoomPlayer>,
    pub spectators: Vec<Spectator>,
    pub phase: RoomPhase,
    /// Live while `Playing`, kept for viewing while `Finished`.
    pub engine: Option<Box<dyn RulesEngine>>,
    /// Cumulative score per player name.
    pub ledger: BTreeMap<String, i32>,
    /// Names of players who voted to play again.
    pub restart_votes: BTreeSet<String>,
    pub banned: FxHashSet<String>,
    pub epoch: u64,
    /// Seconds left on the start countdown.
    pub countdown: u32,
    /// Bots added so far, for naming.
    pub bots_added: u32,
}

impl Room {
    #[must_use]
    pub fn new(code: RoomCode, mode: GameMode, settings: RoomSettings, max_players: usize) -> Self {
        Self {
            code,
            mode,
            settings,
            max_players,
            players: Vec::new(),
            spectators: Vec::new(),
            phase: RoomPhase::Lobby,
            engine: None,
            ledger: BTreeMap::new(),
            restart_votes: BTreeSet::new(),
            banned: FxHashSet::default(),
            epoch: 0,
            countdown: 0,
            bots_added: 0,
        }
    }

    // === Queries ===

    #[must_use]
    pub fn host(&self) -> Option<&RoomPlayer> {
        self.players.first()
    }

    #[must_use]
    pub fn is_host(&self, id: ConnectionId) -> bool {
        self.host().is_some_and(|p| p.id == id)
    }

    #[must_use]
    pub fn player(&self, id: ConnectionId) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: ConnectionId) -> Option<&mut RoomPlayer> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn is_spectator(&self, id: ConnectionId) -> bool {
        self.spectators.iter().any(|s| s.id == id)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// A match is running or about to.
    #[must_use]
    pub fn game_started(&self) -> bool {
        matches!(self.phase, RoomPhase::Countdown | RoomPhase::Playing)
    }

    /// Host actions like start and settings are allowed.
    #[must_use]
    pub fn in_lobby(&self) -> bool {
        matches!(self.phase, RoomPhase::Lobby | RoomPhase::Finished)
    }

    #[must_use]
    pub fn humans(&self) -> impl Iterator<Item = &RoomPlayer> {
        self.players.iter().filter(|p| !p.is_bot)
    }

    #[must_use]
    pub fn has_humans(&self) -> bool {
        self.humans().next().is_some()
    }

    /// Connections that receive room broadcasts: connected humans and
    /// spectators. The flag is true for seated players.
    #[must_use]
    pub fn recipients(&self) -> Vec<(ConnectionId, bool)> {
        self.humans()
            .filter(|p| p.connected)
            .map(|p| (p.id, true))
            .chain(self.spectators.iter().map(|s| (s.id, false)))
            .collect()
    }

    /// A name not yet used by a seated player.
    #[must_use]
    pub fn unique_name(&self, wanted: &str) -> String {
        let taken = |name: &str| self.players.iter().any(|p| p.name == name);
        if !taken(wanted) {
            return wanted.to_string();
        }
        (2..)
            .map(|n| format!("{wanted} ({n})"))
            .find(|name| !taken(name))
            .unwrap_or_else(|| wanted.to_string())
    }

    /// Seat order for dealing.
    #[must_use]
    pub fn seat_infos(&self) -> Vec<SeatInfo> {
        self.players
            .iter()
            .map(|p| SeatInfo::new(p.id, p.name.clone()))
            .collect()
    }

    /// Some ledger entry reached the target score.
    #[must_use]
    pub fn series_over(&self) -> bool {
        self.ledger.values().any(|&score| score >= self.settings.target_score)
    }

    /// Is it a bot's turn in a live match?
    #[must_use]
    pub fn bot_to_move(&self) -> Option<ConnectionId> {
        let engine = self.engine.as_ref()?;
        let state = engine.state();
        if !state.is_playing() {
            return None;
        }
        let current = state.current_player().id;
        self.player(current).filter(|p| p.is_bot).map(|p| p.id)
    }

    /// Every human has voted to play again.
    #[must_use]
    pub fn restart_agreed(&self) -> bool {
        self.has_humans() && self.humans().all(|p| self.restart_votes.contains(&p.name))
    }

    // === Mutations ===

    /// Invalidate pending timers. Returns the new epoch.
    pub fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Remove a seated player, promoting the next seat to host.
    pub fn remove_player(&mut self, id: ConnectionId) -> Option<RoomPlayer> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    pub fn remove_spectator(&mut self, id: ConnectionId) -> Option<Spectator> {
        let index = self.spectators.iter().position(|s| s.id == id)?;
        Some(self.spectators.remove(index))
    }

    /// Fold a finished match into the ledger.
    pub fn record_result(&mut self, result: &MatchResult) {
        for (name, delta) in &result.deltas {
            *self.ledger.entry(name.clone()).or_insert(0) += delta;
        }
    }

    /// Swap a reconnecting player's connection id in, including inside the
    /// engine.
    pub fn rebind(&mut self, old: ConnectionId, new: ConnectionId) -> bool {
        let Some(player) = self.player_mut(old) else {
            return false;
        };
        player.id = new;
        player.connected = true;
        if let Some(engine) = self.engine.as_mut() {
            engine.rebind_player(old, new);
        }
        true
    }

    // === Views ===

    #[must_use]
    pub fn data(&self) -> RoomData {
        RoomData {
            code: self.code.clone(),
            host_id: self.host().map(|p| p.id),
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(i, p)| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    avatar: p.avatar.clone(),
                    is_host: i == 0,
                    is_bot: p.is_bot,
                    connected: p.connected,
                    ready: p.ready,
                })
                .collect(),
            spectators: self
                .spectators
                .iter()
                .map(|s| SpectatorView {
                    id: s.id,
                    name: s.name.clone(),
                })
                .collect(),
            game_mode: self.mode,
            settings: self.settings.clone(),
            phase: self.phase,
            game_started: self.game_started(),
            scores: self.ledger.clone(),
            restart_votes: self.restart_votes.iter().cloned().collect(),
            series_over: self.series_over(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            host_name: self.host().map(|p| p.name.clone()).unwrap_or_default(),
            player_count: self.players.len(),
            max_players: self.max_players,
            game_started: self.game_started(),
            mode: self.mode,
        }
    }

    #[must_use]
    pub fn check(&self) -> RoomCheck {
        RoomCheck {
            code: self.code.clone(),
            exists: true,
            player_count: self.players.len(),
            is_full: self.is_full(),
            game_started: self.game_started(),
            mode: Some(self.mode),
        }
    }
}
