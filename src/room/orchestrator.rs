//! Room orchestrator.
//!
//! Owns every room and session in the process. Each entry point takes one
//! input (a connection opening or closing, a client command, a timer
//! firing), applies it completely and returns the resulting [`Effect`]s:
//! events to push and timers to (re)arm or cancel. Nothing here blocks or
//! does I/O, so the whole lifecycle can be driven from tests.
//!
//! ## Broadcasts
//!
//! Game state goes out once per mutation, one redacted copy per recipient:
//! a seated player sees only their own hand, a spectator sees none.
//!
//! ## Errors
//!
//! A rejected command produces exactly one `error` event to its sender and
//! no state change.

use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::core::{
    ConnectionId, GameAction, GameMode, GameRng, RoomCode, ServerConfig, SessionToken,
    SettingsUpdate, Tile, TurnPhase, Visibility,
};
use crate::error::{LifecycleError, Result, RuleError, ServerError, ValidationError};
use crate::games::new_engine;
use crate::rules::{choose_discard, MatchResult, Outcome};

use super::lobby::{Room, RoomPlayer, Spectator};
use super::protocol::{ChatMessage, ClientCommand, RoomCheck, RoomPhase, RoomSummary, ServerEvent};
use super::session::SessionRegistry;
use super::timers::{Effect, TimerEvent, TimerKey, TimerKind};

/// Bots get connection ids from here up, clear of real connections.
pub const BOT_ID_BASE: u64 = 1 << 48;

const TICK: Duration = Duration::from_secs(1);

/// Why a seat was vacated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Departure {
    Left,
    Kicked,
    TimedOut,
}

impl Departure {
    fn notice(self, name: &str) -> String {
        match self {
            Departure::Left => format!("{name} left the room"),
            Departure::Kicked => format!("{name} was removed by the host"),
            Departure::TimedOut => format!("{name} did not come back in time"),
        }
    }
}

pub struct Orchestrator {
    config: ServerConfig,
    rng: GameRng,
    rooms: FxHashMap<RoomCode, Room>,
    sessions: SessionRegistry,
    /// Live connections and the room each one is in.
    connections: FxHashMap<ConnectionId, Option<RoomCode>>,
    next_bot: u64,
    effects: Vec<Effect>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let rng = config.seed.map_or_else(GameRng::from_entropy, GameRng::new);
        Self {
            config,
            rng,
            rooms: FxHashMap::default(),
            sessions: SessionRegistry::new(),
            connections: FxHashMap::default(),
            next_bot: 0,
            effects: Vec::new(),
        }
    }

    // === Entry points ===

    /// A connection opened.
    pub fn connect(&mut self, conn: ConnectionId) -> Vec<Effect> {
        self.connections.insert(conn, None);
        debug!(%conn, "connected");
        self.take_effects()
    }

    /// Apply one client command.
    pub fn handle_command(&mut self, conn: ConnectionId, command: ClientCommand) -> Vec<Effect> {
        self.connections.entry(conn).or_insert(None);
        let name = command.name();
        let redirect_on_error = matches!(command, ClientCommand::RejoinGame(_));

        if let Err(err) = self.dispatch(conn, command) {
            debug!(%conn, command = name, error = %err, "command rejected");
            self.send(conn, ServerEvent::Error(err.to_string()));
            if redirect_on_error {
                self.send(conn, ServerEvent::ForceRedirect("/".to_string()));
            }
        }
        self.take_effects()
    }

    /// Report a message that did not parse.
    pub fn reject(&mut self, conn: ConnectionId, err: ValidationError) -> Vec<Effect> {
        debug!(%conn, error = %err, "malformed message");
        self.send(conn, ServerEvent::Error(ServerError::from(err).to_string()));
        self.take_effects()
    }

    /// A timer fired.
    pub fn handle_timer(&mut self, event: TimerEvent) -> Vec<Effect> {
        let TimerEvent { key, epoch } = event;
        let code = key.room;

        if let TimerKind::Grace(token) = key.kind {
            self.grace_expired(&code, token);
            return self.take_effects();
        }

        let Some(room) = self.rooms.get(&code) else {
            return self.take_effects();
        };
        if room.epoch != epoch {
            debug!(room = %code, kind = ?key.kind, "stale timer dropped");
            return self.take_effects();
        }

        match key.kind {
            TimerKind::TurnTick => self.turn_tick(&code),
            TimerKind::BotMove => self.bot_move(&code),
            TimerKind::StartCountdown => self.countdown_step(&code),
            TimerKind::RestartDelay => {
                if room.phase == RoomPhase::Finished {
                    self.begin_countdown(&code);
                }
            }
            TimerKind::Grace(_) => {}
        }
        self.take_effects()
    }

    /// A connection closed. A seated player keeps the seat for the grace
    /// window; the match carries on without them.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Effect> {
        let Some(membership) = self.connections.remove(&conn) else {
            return self.take_effects();
        };
        let token = self.sessions.detach(conn);
        let Some(code) = membership else {
            return self.take_effects();
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return self.take_effects();
        };

        if room.remove_spectator(conn).is_some() {
            self.broadcast_room(&code);
            return self.take_effects();
        }

        let Some(player) = room.player_mut(conn) else {
            return self.take_effects();
        };
        player.connected = false;
        let name = player.name.clone();
        info!(room = %code, %conn, player = %name, "player disconnected, seat reserved");

        if let Some(token) = token {
            let after = self.config.reconnect_grace();
            self.schedule(&code, TimerKind::Grace(token), after, 0);
        }
        self.broadcast_room(&code);
        self.system_chat(&code, format!("{name} disconnected"));
        self.take_effects()
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Direct room access for rigging a match.
    #[cfg(any(test, feature = "test-support"))]
    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// The room a live connection is in.
    #[must_use]
    pub fn room_of(&self, conn: ConnectionId) -> Option<&RoomCode> {
        self.connections.get(&conn)?.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    // === Dispatch ===

    fn dispatch(&mut self, conn: ConnectionId, command: ClientCommand) -> Result<()> {
        match command {
            ClientCommand::CreateRoom {
                name,
                avatar,
                game_mode,
            } => {
                self.create_room(conn, name.trim(), avatar, game_mode.unwrap_or_default());
                Ok(())
            }
            ClientCommand::JoinRoom { code, name, avatar } => {
                self.join_room(conn, RoomCode::parse(&code), name.trim(), avatar)
            }
            ClientCommand::RejoinGame(token) => self.rejoin(conn, &token),
            ClientCommand::LeaveRoom => {
                let code = self.member_room(conn)?;
                self.remove_member(&code, conn, Departure::Left);
                Ok(())
            }
            ClientCommand::StartGame => self.start_game(conn),
            ClientCommand::KickPlayer(target) => self.kick_player(conn, target),
            ClientCommand::AddBot => self.add_bot(conn),
            ClientCommand::UpdateSettings(update) => self.update_settings(conn, &update),
            ClientCommand::ToggleReady => self.toggle_ready(conn),
            ClientCommand::CheckRoom(code) => {
                self.check_room(conn, RoomCode::parse(&code));
                Ok(())
            }
            ClientCommand::GetRooms => {
                let rooms = self.public_rooms();
                self.send(conn, ServerEvent::RoomListUpdate(rooms));
                Ok(())
            }
            ClientCommand::GetGameState => self.get_game_state(conn),
            ClientCommand::SendMessage(text) => self.chat(conn, &text),
            ClientCommand::SendEmote(emoji) => self.emote(conn, emoji),
            ClientCommand::RestartVote => self.restart_vote(conn),
            ClientCommand::GameAction(request) => match request.into_action()? {
                GameAction::RestartGame => self.restart_vote(conn),
                action => self.game_action(conn, &action),
            },
        }
    }

    fn member_room(&self, conn: ConnectionId) -> std::result::Result<RoomCode, LifecycleError> {
        self.room_of(conn).cloned().ok_or(LifecycleError::NotInRoom)
    }

    fn room_ref(&self, code: &RoomCode) -> std::result::Result<&Room, LifecycleError> {
        self.rooms.get(code).ok_or(LifecycleError::RoomNotFound)
    }

    fn room_entry(&mut self, code: &RoomCode) -> std::result::Result<&mut Room, LifecycleError> {
        self.rooms.get_mut(code).ok_or(LifecycleError::RoomNotFound)
    }

    /// The room `conn` hosts.
    fn hosted_room(&self, conn: ConnectionId) -> std::result::Result<RoomCode, LifecycleError> {
        let code = self.member_room(conn)?;
        if !self.room_ref(&code)?.is_host(conn) {
            return Err(LifecycleError::NotHost);
        }
        Ok(code)
    }

    // === Lobby ===

    fn create_room(&mut self, conn: ConnectionId, name: &str, avatar: Option<String>, mode: GameMode) {
        self.leave_current(conn);

        let code = loop {
            let candidate = RoomCode::generate(&mut self.rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let mut room = Room::new(
            code.clone(),
            mode,
            self.config.room_settings(),
            self.config.max_players,
        );
        let token = self.sessions.issue(conn, code.clone(), name);
        room.players
            .push(RoomPlayer::human(conn, name.to_string(), avatar, token));
        self.rooms.insert(code.clone(), room);
        self.connections.insert(conn, Some(code.clone()));

        info!(room = %code, %conn, host = %name, ?mode, "room created");
        self.send(conn, ServerEvent::SessionCreated { token });
        self.send(conn, ServerEvent::RoomCreated(code.clone()));
        self.broadcast_room(&code);
        self.push_room_list();
    }

    fn join_room(
        &mut self,
        conn: ConnectionId,
        code: RoomCode,
        name: &str,
        avatar: Option<String>,
    ) -> Result<()> {
        let room = self.room_ref(&code)?;
        if room.banned.contains(name) {
            self.send(
                conn,
                ServerEvent::Banned(format!("You were removed from room {code}")),
            );
            return Ok(());
        }
        if room.player(conn).is_some() || room.is_spectator(conn) {
            return Ok(());
        }
        let spectate = room.is_full() || room.game_started();

        self.leave_current(conn);
        let token = (!spectate).then(|| self.sessions.issue(conn, code.clone(), name));
        let room = self.room_entry(&code)?;

        match token {
            None => {
                room.spectators.push(Spectator {
                    id: conn,
                    name: name.to_string(),
                });
                let view = room
                    .engine
                    .as_ref()
                    .map(|engine| Box::new(engine.state().redacted_for(None)));
                self.connections.insert(conn, Some(code.clone()));

                info!(room = %code, %conn, spectator = %name, "spectator joined");
                self.send(conn, ServerEvent::IsSpectator(true));
                self.send(conn, ServerEvent::JoinedRoom(code.clone()));
                if let Some(view) = view {
                    self.send(conn, ServerEvent::GameState(view));
                }
                self.broadcast_room(&code);
            }
            Some(token) => {
                let seat_name = room.unique_name(name);
                room.players
                    .push(RoomPlayer::human(conn, seat_name.clone(), avatar, token));
                self.sessions.set_name(token, seat_name.as_str());
                self.connections.insert(conn, Some(code.clone()));

                info!(room = %code, %conn, player = %seat_name, "player joined");
                self.send(conn, ServerEvent::SessionCreated { token });
                self.send(conn, ServerEvent::JoinedRoom(code.clone()));
                self.broadcast_room(&code);
                self.system_chat(&code, format!("{seat_name} joined"));
                self.push_room_list();
            }
        }
        Ok(())
    }

    fn rejoin(&mut self, conn: ConnectionId, raw: &str) -> Result<()> {
        let token = SessionToken::parse(raw).ok_or(LifecycleError::SessionNotFound)?;
        let session = self
            .sessions
            .get(token)
            .cloned()
            .ok_or(LifecycleError::SessionNotFound)?;
        let code = session.room;
        let old = self
            .room_ref(&code)?
            .players
            .iter()
            .find(|p| p.token == Some(token))
            .map(|p| p.id)
            .ok_or(LifecycleError::SessionNotFound)?;

        if self.room_of(conn) != Some(&code) {
            self.leave_current(conn);
        }
        if let Some(previous) = self.sessions.attach(token, conn) {
            if previous != conn {
                if let Some(membership) = self.connections.get_mut(&previous) {
                    *membership = None;
                }
                self.send(previous, ServerEvent::ForceRedirect("/".to_string()));
            }
        }
        self.cancel(&code, TimerKind::Grace(token));

        let room = self.room_entry(&code)?;
        room.rebind(old, conn);
        let state = room
            .engine
            .as_ref()
            .map(|engine| Box::new(engine.state().redacted_for(Some(conn))));
        let data = room.data();
        self.connections.insert(conn, Some(code.clone()));

        info!(room = %code, old = %old, new = %conn, player = %session.name, "player reconnected");
        self.send(
            conn,
            ServerEvent::RejoinSuccess {
                room_code: code.clone(),
                state,
                room: data,
            },
        );
        self.broadcast_room(&code);
        self.system_chat(&code, format!("{} reconnected", session.name));
        Ok(())
    }

    /// Quietly leave whatever room `conn` is in.
    fn leave_current(&mut self, conn: ConnectionId) {
        if let Some(code) = self.room_of(conn).cloned() {
            self.remove_member(&code, conn, Departure::Left);
        }
    }

    /// Remove a player or spectator. Removing a seated player during a
    /// match cancels the match.
    fn remove_member(&mut self, code: &RoomCode, id: ConnectionId, departure: Departure) {
        if let Some(membership) = self.connections.get_mut(&id) {
            *membership = None;
        }
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };

        if room.remove_spectator(id).is_some() {
            self.broadcast_room(code);
            return;
        }
        let Some(player) = room.remove_player(id) else {
            return;
        };

        room.restart_votes.remove(&player.name);
        let aborted = room.game_started();
        if aborted {
            room.engine = None;
            room.phase = RoomPhase::Lobby;
            room.bump_epoch();
        }
        let empty = !room.has_humans();

        if let Some(token) = player.token {
            self.sessions.remove(token);
            self.cancel(code, TimerKind::Grace(token));
        }
        info!(room = %code, conn = %id, player = %player.name, ?departure, aborted, "player removed");

        if empty {
            self.close_room(code);
            self.push_room_list();
            return;
        }
        if aborted {
            for key in TimerKey::room_keys(code) {
                self.effects.push(Effect::Cancel(key));
            }
        }

        self.broadcast(code, ServerEvent::PlayerLeft(id));
        self.system_chat(code, departure.notice(&player.name));
        if aborted {
            self.system_chat(code, "Match cancelled, back to the lobby");
        }
        self.broadcast_room(code);
        self.push_room_list();
        self.maybe_restart(code);
    }

    fn close_room(&mut self, code: &RoomCode) {
        let Some(room) = self.rooms.remove(code) else {
            return;
        };
        for key in TimerKey::room_keys(code) {
            self.effects.push(Effect::Cancel(key));
        }
        for player in &room.players {
            if let Some(token) = player.token {
                self.sessions.remove(token);
                self.cancel(code, TimerKind::Grace(token));
            }
        }
        let members = room
            .players
            .iter()
            .map(|p| p.id)
            .chain(room.spectators.iter().map(|s| s.id));
        for id in members {
            if let Some(membership) = self.connections.get_mut(&id) {
                *membership = None;
            }
        }
        info!(room = %code, "room closed");
    }

    fn kick_player(&mut self, conn: ConnectionId, target: ConnectionId) -> Result<()> {
        let code = self.hosted_room(conn)?;
        if target == conn {
            return Err(LifecycleError::CannotKickSelf.into());
        }
        let room = self.room_entry(&code)?;
        let (name, is_bot) = match (room.player(target), room.spectators.iter().find(|s| s.id == target)) {
            (Some(player), _) => (player.name.clone(), player.is_bot),
            (None, Some(spectator)) => (spectator.name.clone(), false),
            (None, None) => return Err(LifecycleError::PlayerNotFound.into()),
        };
        if !is_bot {
            room.banned.insert(name);
            self.send(
                target,
                ServerEvent::Kicked(format!("You were removed from room {code}")),
            );
        }
        self.remove_member(&code, target, Departure::Kicked);
        Ok(())
    }

    fn add_bot(&mut self, conn: ConnectionId) -> Result<()> {
        let code = self.hosted_room(conn)?;
        self.next_bot += 1;
        let id = ConnectionId(BOT_ID_BASE + self.next_bot);

        let room = self.room_entry(&code)?;
        if !room.in_lobby() {
            return Err(LifecycleError::GameAlreadyStarted.into());
        }
        if room.is_full() {
            return Err(LifecycleError::RoomFull.into());
        }
        room.bots_added += 1;
        let name = room.unique_name(&format!("Bot {}", room.bots_added));
        room.players.push(RoomPlayer::bot(id, name.clone()));

        info!(room = %code, bot = %name, "bot added");
        self.broadcast_room(&code);
        self.push_room_list();
        Ok(())
    }

    fn update_settings(&mut self, conn: ConnectionId, update: &SettingsUpdate) -> Result<()> {
        let code = self.hosted_room(conn)?;
        let room = self.room_entry(&code)?;
        if !room.in_lobby() {
            return Err(LifecycleError::LobbyOnly.into());
        }
        room.settings.apply(update)?;
        debug!(room = %code, settings = ?room.settings, "settings updated");
        self.broadcast_room(&code);
        self.push_room_list();
        Ok(())
    }

    fn toggle_ready(&mut self, conn: ConnectionId) -> Result<()> {
        let code = self.member_room(conn)?;
        let room = self.room_entry(&code)?;
        if !room.in_lobby() {
            return Err(LifecycleError::GameAlreadyStarted.into());
        }
        let player = room.player_mut(conn).ok_or(LifecycleError::NotInRoom)?;
        player.ready = !player.ready;

        let everyone_ready =
            matches!(room.players.len(), 2 | 4) && room.players.iter().all(|p| p.ready);
        self.broadcast_room(&code);
        if everyone_ready {
            info!(room = %code, "everyone ready, starting");
            self.broadcast(&code, ServerEvent::AutoTriggerStart);
            self.begin_countdown(&code);
        }
        Ok(())
    }

    fn check_room(&mut self, conn: ConnectionId, code: RoomCode) {
        let check = match self.rooms.get(&code) {
            Some(room) => room.check(),
            None => RoomCheck {
                code,
                exists: false,
                player_count: 0,
                is_full: false,
                game_started: false,
                mode: None,
            },
        };
        self.send(conn, ServerEvent::RoomChecked(check));
    }

    fn get_game_state(&mut self, conn: ConnectionId) -> Result<()> {
        let code = self.member_room(conn)?;
        let room = self.room_ref(&code)?;
        let engine = room.engine.as_ref().ok_or(LifecycleError::NoActiveGame)?;
        let viewer = room.player(conn).map(|p| p.id);
        let view = Box::new(engine.state().redacted_for(viewer));
        self.send(conn, ServerEvent::GameState(view));
        Ok(())
    }

    fn sender_name(&self, code: &RoomCode, conn: ConnectionId) -> std::result::Result<String, LifecycleError> {
        let room = self.room_ref(code)?;
        room.player(conn)
            .map(|p| p.name.clone())
            .or_else(|| room.spectators.iter().find(|s| s.id == conn).map(|s| s.name.clone()))
            .ok_or(LifecycleError::NotInRoom)
    }

    fn chat(&mut self, conn: ConnectionId, text: &str) -> Result<()> {
        let code = self.member_room(conn)?;
        let name = self.sender_name(&code, conn)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let text: String = text.chars().take(self.config.max_chat_len).collect();
        self.broadcast(
            &code,
            ServerEvent::ChatMessage(ChatMessage {
                from: Some(conn),
                name,
                text,
                system: false,
            }),
        );
        Ok(())
    }

    fn emote(&mut self, conn: ConnectionId, emoji: String) -> Result<()> {
        let code = self.member_room(conn)?;
        let name = self.sender_name(&code, conn)?;
        self.broadcast(
            &code,
            ServerEvent::EmoteReceived {
                from: conn,
                name,
                emoji,
            },
        );
        Ok(())
    }

    // === Match lifecycle ===

    fn start_game(&mut self, conn: ConnectionId) -> Result<()> {
        let code = self.hosted_room(conn)?;
        let room = self.room_ref(&code)?;
        if !room.in_lobby() {
            return Err(LifecycleError::GameAlreadyStarted.into());
        }
        let seats = room.players.len();
        if seats != 2 && seats != 4 {
            return Err(LifecycleError::WrongPlayerCount(seats).into());
        }
        self.begin_countdown(&code);
        Ok(())
    }

    fn begin_countdown(&mut self, code: &RoomCode) {
        let countdown = self.config.start_countdown;
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        room.phase = RoomPhase::Countdown;
        room.countdown = countdown;
        room.restart_votes.clear();
        let epoch = room.bump_epoch();
        self.cancel(code, TimerKind::RestartDelay);

        if countdown == 0 {
            self.launch_match(code);
            return;
        }
        debug!(room = %code, countdown, "countdown started");
        self.broadcast(code, ServerEvent::RoomCountdown(countdown));
        self.broadcast_room(code);
        self.push_room_list();
        self.schedule(code, TimerKind::StartCountdown, TICK, epoch);
    }

    fn countdown_step(&mut self, code: &RoomCode) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        if room.phase != RoomPhase::Countdown {
            return;
        }
        room.countdown = room.countdown.saturating_sub(1);
        let (left, epoch) = (room.countdown, room.epoch);

        if left == 0 {
            self.launch_match(code);
        } else {
            self.broadcast(code, ServerEvent::RoomCountdown(left));
            self.schedule(code, TimerKind::StartCountdown, TICK, epoch);
        }
    }

    fn launch_match(&mut self, code: &RoomCode) {
        let rng = self.rng.fork();
        let seed = rng.seed();
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        let seats = room.seat_infos();
        if seats.len() != 2 && seats.len() != 4 {
            room.phase = RoomPhase::Lobby;
            room.bump_epoch();
            self.broadcast_room(code);
            return;
        }

        let engine = new_engine(room.mode, &seats, room.settings.turn_seconds, rng);
        let (indicator, wildcard) = (engine.state().indicator, engine.state().wildcard);
        room.engine = Some(engine);
        room.phase = RoomPhase::Playing;
        room.restart_votes.clear();
        for player in room.players.iter_mut().filter(|p| !p.is_bot) {
            player.ready = false;
        }
        room.bump_epoch();

        info!(room = %code, mode = ?room.mode, seats = seats.len(), seed, %wildcard, "match started");
        self.broadcast_state(code, true);
        self.broadcast(code, ServerEvent::JokerRevealed { indicator, wildcard });
        self.broadcast_room(code);
        self.push_room_list();
        self.schedule_turn(code);
    }

    fn game_action(&mut self, conn: ConnectionId, action: &GameAction) -> Result<()> {
        let code = self.member_room(conn)?;
        let room = self.room_entry(&code)?;
        if room.player(conn).is_none() {
            return Err(RuleError::NotInGame.into());
        }
        if room.phase != RoomPhase::Playing {
            return Err(LifecycleError::NoActiveGame.into());
        }
        let engine = room.engine.as_mut().ok_or(LifecycleError::NoActiveGame)?;
        let outcome = engine.apply_action(conn, action)?;

        debug!(room = %code, %conn, action = action.name(), "action applied");
        self.after_action(&code, outcome);
        Ok(())
    }

    /// Broadcast the new state, then either re-arm the turn clock or wrap
    /// up the match.
    fn after_action(&mut self, code: &RoomCode, outcome: Outcome) {
        if let Some(room) = self.rooms.get_mut(code) {
            room.bump_epoch();
        }
        self.broadcast_state(code, false);
        match outcome {
            Outcome::Continue => self.schedule_turn(code),
            Outcome::Finished(result) => self.finish_match(code, &result),
        }
    }

    /// Arm the turn clock, and the bot driver if a bot is to move.
    fn schedule_turn(&mut self, code: &RoomCode) {
        let Some(room) = self.rooms.get(code) else {
            return;
        };
        let epoch = room.epoch;
        let bot = room.bot_to_move();

        self.schedule(code, TimerKind::TurnTick, TICK, epoch);
        match bot {
            Some(_) => {
                let think = self.config.bot_think();
                self.schedule(code, TimerKind::BotMove, think, epoch);
            }
            None => self.cancel(code, TimerKind::BotMove),
        }
    }

    fn finish_match(&mut self, code: &RoomCode, result: &MatchResult) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        room.record_result(result);
        room.phase = RoomPhase::Finished;
        room.restart_votes.clear();
        room.bump_epoch();

        let notice = match result.winner.and_then(|id| room.player(id)) {
            Some(winner) => match result.win_type {
                Some(win_type) => format!("{} won ({win_type:?})", winner.name),
                None => format!("{} won", winner.name),
            },
            None => "The deck ran out, nobody wins this round".to_string(),
        };
        info!(
            room = %code,
            winner = ?result.winner,
            win_type = ?result.win_type,
            series_over = room.series_over(),
            "match finished"
        );

        self.cancel(code, TimerKind::TurnTick);
        self.cancel(code, TimerKind::BotMove);
        self.broadcast_room(code);
        self.system_chat(code, notice);
        self.push_room_list();
    }

    fn restart_vote(&mut self, conn: ConnectionId) -> Result<()> {
        let code = self.member_room(conn)?;
        let room = self.room_entry(&code)?;
        if room.phase != RoomPhase::Finished {
            return Err(LifecycleError::NoActiveGame.into());
        }
        let name = room
            .player(conn)
            .map(|p| p.name.clone())
            .ok_or(LifecycleError::NotInRoom)?;
        if !room.restart_votes.insert(name) {
            return Ok(());
        }
        self.broadcast_room(&code);
        self.maybe_restart(&code);
        Ok(())
    }

    /// Once every human voted, relaunch after the restart delay.
    fn maybe_restart(&mut self, code: &RoomCode) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        if room.phase != RoomPhase::Finished || !room.restart_agreed() {
            return;
        }
        let epoch = room.bump_epoch();
        info!(room = %code, "restart agreed");
        let delay = self.config.restart_delay();
        self.schedule(code, TimerKind::RestartDelay, delay, epoch);
    }

    // === Timers ===

    fn turn_tick(&mut self, code: &RoomCode) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        if room.phase != RoomPhase::Playing {
            return;
        }
        let epoch = room.epoch;
        let Some(engine) = room.engine.as_mut() else {
            return;
        };
        if !engine.state().is_playing() {
            return;
        }

        if engine.tick() > 0 {
            self.broadcast_state(code, false);
            self.schedule(code, TimerKind::TurnTick, TICK, epoch);
            return;
        }

        let seat = engine.state().turn_index;
        let outcome = engine.timeout();
        info!(room = %code, %seat, "turn timed out");
        self.after_action(code, outcome);
    }

    /// Play a bot's turn through the same entry point a client uses.
    fn bot_move(&mut self, code: &RoomCode) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        if room.phase != RoomPhase::Playing {
            return;
        }
        let Some(bot) = room.bot_to_move() else {
            return;
        };
        let Some(engine) = room.engine.as_mut() else {
            return;
        };

        if engine.state().turn_phase == TurnPhase::AwaitingDraw {
            match engine.apply_action(bot, &GameAction::DrawCenter) {
                Ok(Outcome::Continue) => self.broadcast_state(code, false),
                Ok(finished) => {
                    self.after_action(code, finished);
                    return;
                }
                Err(err) => {
                    warn!(room = %code, %bot, error = %err, "bot draw rejected");
                    return;
                }
            }
        }

        let Some(engine) = self.rooms.get_mut(code).and_then(|r| r.engine.as_mut()) else {
            return;
        };
        let state = engine.state();
        let hand: Vec<Tile> = state.current_player().hand.iter().copied().collect();
        let Some(tile) = choose_discard(&hand, state.wildcard, &mut self.rng) else {
            return;
        };

        match engine.apply_action(bot, &GameAction::Discard { tile }) {
            Ok(outcome) => {
                debug!(room = %code, %bot, %tile, "bot moved");
                self.after_action(code, outcome);
            }
            Err(err) => warn!(room = %code, %bot, error = %err, "bot discard rejected"),
        }
    }

    fn grace_expired(&mut self, code: &RoomCode, token: SessionToken) {
        match self.sessions.get(token) {
            Some(session) if session.conn.is_none() => {}
            _ => return,
        }
        let Some(id) = self
            .rooms
            .get(code)
            .and_then(|room| room.players.iter().find(|p| p.token == Some(token)))
            .map(|p| p.id)
        else {
            self.sessions.remove(token);
            return;
        };
        info!(room = %code, conn = %id, "reconnect window expired");
        self.remove_member(code, id, Departure::TimedOut);
    }

    // === Effects ===

    fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn send(&mut self, to: ConnectionId, event: ServerEvent) {
        self.effects.push(Effect::send(to, event));
    }

    fn schedule(&mut self, code: &RoomCode, kind: TimerKind, after: Duration, epoch: u64) {
        self.effects.push(Effect::Schedule {
            key: TimerKey::new(code.clone(), kind),
            after,
            epoch,
        });
    }

    fn cancel(&mut self, code: &RoomCode, kind: TimerKind) {
        self.effects
            .push(Effect::Cancel(TimerKey::new(code.clone(), kind)));
    }

    /// Same event to everyone in the room.
    fn broadcast(&mut self, code: &RoomCode, event: ServerEvent) {
        let Some(room) = self.rooms.get(code) else {
            return;
        };
        for (id, _) in room.recipients() {
            self.effects.push(Effect::send(id, event.clone()));
        }
    }

    fn broadcast_room(&mut self, code: &RoomCode) {
        if let Some(room) = self.rooms.get(code) {
            let data = room.data();
            self.broadcast(code, ServerEvent::UpdateRoom(data));
        }
    }

    fn system_chat(&mut self, code: &RoomCode, text: impl Into<String>) {
        self.broadcast(code, ServerEvent::ChatMessage(ChatMessage::system(text)));
    }

    /// One redacted copy of the game state per recipient.
    fn broadcast_state(&mut self, code: &RoomCode, started: bool) {
        let Some(room) = self.rooms.get(code) else {
            return;
        };
        let Some(engine) = room.engine.as_ref() else {
            return;
        };
        let state = engine.state();
        for (id, seated) in room.recipients() {
            let view = Box::new(state.redacted_for(seated.then_some(id)));
            let event = if started {
                ServerEvent::GameStarted(view)
            } else {
                ServerEvent::GameState(view)
            };
            self.effects.push(Effect::send(id, event));
        }
    }

    fn public_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|r| r.settings.visibility == Visibility::Public)
            .map(Room::summary)
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    /// Refresh the room list for connections not in any room.
    fn push_room_list(&mut self) {
        let rooms = self.public_rooms();
        let idle: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, room)| room.is_none())
            .map(|(id, _)| *id)
            .collect();
        for id in idle {
            self.send(id, ServerEvent::RoomListUpdate(rooms.clone()));
        }
    }
}
