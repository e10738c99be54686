//! Room lifecycle tests driven through the orchestrator.
//!
//! The harness plays the part of the server actor: it records events,
//! keeps the set of pending timers and fires them on demand.

use std::collections::HashMap;

use okey_server::core::{ConnectionId, GameState, RoomCode, ServerConfig, SessionToken, TurnPhase};
use okey_server::room::{
    ClientCommand, Effect, Orchestrator, RoomPhase, ServerEvent, TimerEvent, TimerKey, TimerKind,
};
use okey_server::rules::RulesEngine;

const ALICE: ConnectionId = ConnectionId(1);
const BOB: ConnectionId = ConnectionId(2);
const CAROL: ConnectionId = ConnectionId(3);

struct Harness {
    orch: Orchestrator,
    outbox: Vec<(ConnectionId, ServerEvent)>,
    timers: HashMap<TimerKey, u64>,
}

impl Harness {
    fn new(config: ServerConfig) -> Self {
        Self {
            orch: Orchestrator::new(config),
            outbox: Vec::new(),
            timers: HashMap::new(),
        }
    }

    fn quick() -> Self {
        Self::new(ServerConfig::default().with_seed(7).with_start_countdown(0))
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { to, event } => self.outbox.push((to, event)),
                Effect::Schedule { key, epoch, .. } => {
                    self.timers.insert(key, epoch);
                }
                Effect::Cancel(key) => {
                    self.timers.remove(&key);
                }
            }
        }
    }

    fn connect(&mut self, conn: ConnectionId) {
        let effects = self.orch.connect(conn);
        self.apply(effects);
    }

    fn send(&mut self, conn: ConnectionId, raw: &str) {
        let effects = match ClientCommand::parse(raw) {
            Ok(command) => self.orch.handle_command(conn, command),
            Err(err) => self.orch.reject(conn, err),
        };
        self.apply(effects);
    }

    fn action(&mut self, conn: ConnectionId, kind: &str, tile: Option<u16>) {
        let raw = match tile {
            Some(id) => format!(
                r#"{{"event":"gameAction","data":{{"type":"{kind}","payload":{{"tileId":{id}}}}}}}"#
            ),
            None => format!(r#"{{"event":"gameAction","data":{{"type":"{kind}"}}}}"#),
        };
        self.send(conn, &raw);
    }

    fn disconnect(&mut self, conn: ConnectionId) {
        let effects = self.orch.disconnect(conn);
        self.apply(effects);
    }

    /// Fire a pending timer. Returns false if none was armed.
    fn fire(&mut self, code: &RoomCode, kind: TimerKind) -> bool {
        let key = TimerKey::new(code.clone(), kind);
        let Some(epoch) = self.timers.remove(&key) else {
            return false;
        };
        let effects = self.orch.handle_timer(TimerEvent { key, epoch });
        self.apply(effects);
        true
    }

    fn take(&mut self, conn: ConnectionId) -> Vec<ServerEvent> {
        let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.outbox)
            .into_iter()
            .partition(|(to, _)| *to == conn);
        self.outbox = rest;
        mine.into_iter().map(|(_, event)| event).collect()
    }

    fn names(&mut self, conn: ConnectionId) -> Vec<&'static str> {
        self.take(conn).iter().map(ServerEvent::name).collect()
    }

    fn errors(&mut self, conn: ConnectionId) -> Vec<String> {
        self.take(conn)
            .into_iter()
            .filter_map(|event| match event {
                ServerEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn create(&mut self, conn: ConnectionId, name: &str) -> RoomCode {
        self.connect(conn);
        self.send(
            conn,
            &format!(r#"{{"event":"createRoom","data":{{"name":"{name}"}}}}"#),
        );
        self.take(conn)
            .into_iter()
            .find_map(|event| match event {
                ServerEvent::RoomCreated(code) => Some(code),
                _ => None,
            })
            .expect("room created")
    }

    /// Join and return the issued session token, if seated.
    fn join(&mut self, conn: ConnectionId, code: &RoomCode, name: &str) -> Option<SessionToken> {
        self.connect(conn);
        self.send(
            conn,
            &format!(r#"{{"event":"joinRoom","data":{{"code":"{code}","name":"{name}"}}}}"#),
        );
        self.outbox.iter().find_map(|(to, event)| match event {
            ServerEvent::SessionCreated { token } if *to == conn => Some(*token),
            _ => None,
        })
    }

    fn state(&self, code: &RoomCode) -> GameState {
        self.orch
            .room(code)
            .and_then(|room| room.engine.as_ref())
            .map(|engine| engine.state().clone())
            .expect("match in progress")
    }

    fn phase(&self, code: &RoomCode) -> RoomPhase {
        self.orch.room(code).expect("room exists").phase
    }
}

/// Alice hosts, Bob joins, the match is running.
fn started() -> (Harness, RoomCode, SessionToken) {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    let token = h.join(BOB, &code, "Bob").expect("seated");
    h.send(ALICE, r#"{"event":"startGame"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Playing);
    (h, code, token)
}

/// Test creating a room and joining it.
#[test]
fn test_create_and_join() {
    let mut h = Harness::quick();
    h.connect(CAROL);
    let code = h.create(ALICE, "Alice");

    // Idle connections get the refreshed room list.
    assert!(h.names(CAROL).contains(&"roomListUpdate"));

    h.join(BOB, &code, "Bob");
    assert_eq!(
        h.names(BOB),
        vec!["sessionCreated", "joinedRoom", "updateRoom", "chatMessage"]
    );
    assert_eq!(h.names(ALICE), vec!["updateRoom", "chatMessage"]);

    let room = h.orch.room(&code).unwrap();
    assert_eq!(room.players.len(), 2);
    assert!(room.is_host(ALICE));
    assert_eq!(h.orch.room_of(BOB), Some(&code));
    assert_eq!(h.orch.sessions().len(), 2);
}

/// Test that room codes ignore case and clashing names get a suffix.
#[test]
fn test_join_is_case_insensitive_and_names_are_unique() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.connect(BOB);
    let lower = code.as_str().to_lowercase();
    h.send(
        BOB,
        &format!(r#"{{"event":"joinRoom","data":{{"code":"{lower}","name":"Alice"}}}}"#),
    );

    let room = h.orch.room(&code).unwrap();
    assert_eq!(room.players[1].name, "Alice (2)");
}

/// Test joining a room that does not exist.
#[test]
fn test_join_unknown_room() {
    let mut h = Harness::quick();
    h.connect(BOB);
    h.send(BOB, r#"{"event":"joinRoom","data":{"code":"ZZZZ","name":"Bob"}}"#);
    assert_eq!(h.errors(BOB), vec!["Room not found"]);
}

/// Test that only the host starts, and only with 2 or 4 seats.
#[test]
fn test_start_needs_host_and_two_or_four_players() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");

    h.send(ALICE, r#"{"event":"startGame"}"#);
    assert_eq!(h.errors(ALICE), vec!["Need 2 or 4 players to start, have 1"]);

    h.join(BOB, &code, "Bob");
    h.take(BOB);
    h.send(BOB, r#"{"event":"startGame"}"#);
    assert_eq!(h.errors(BOB), vec!["Only the host can do that"]);
    assert_eq!(h.phase(&code), RoomPhase::Lobby);
}

/// Test one draw and discard cycle with per-player redaction.
#[test]
fn test_full_turn_cycle() {
    let (mut h, code, _) = started();
    let state = h.state(&code);
    assert_eq!(state.deck_count, 76);

    let dealer = state.current_player().id;
    let other = if dealer == ALICE { BOB } else { ALICE };

    // Redacted per recipient.
    let started_for_alice = h
        .take(ALICE)
        .into_iter()
        .find_map(|event| match event {
            ServerEvent::GameStarted(view) => Some(view),
            _ => None,
        })
        .expect("gameStarted");
    for player in started_for_alice.players.values() {
        assert_eq!(player.id == ALICE, !player.hand.is_empty());
    }
    h.take(BOB);

    // Out of turn.
    h.action(other, "DRAW_CENTER", None);
    assert_eq!(h.errors(other), vec!["It is not your turn"]);

    let tile = state.current_player().hand[0].id.raw();
    h.action(dealer, "DISCARD", Some(tile));
    assert!(h.errors(dealer).is_empty());

    h.action(other, "DRAW_CENTER", None);
    let tile = h.state(&code).current_player().hand[0].id.raw();
    h.action(other, "DISCARD", Some(tile));
    assert!(h.errors(other).is_empty());

    let state = h.state(&code);
    assert_eq!(state.deck_count, 75);
    assert_eq!(state.current_player().id, dealer);
    assert_eq!(state.turn_phase, TurnPhase::AwaitingDraw);
    assert!(h.timers.contains_key(&TimerKey::new(code.clone(), TimerKind::TurnTick)));
}

/// Test that bad game actions produce one error and no change.
#[test]
fn test_unknown_action_and_missing_field() {
    let (mut h, _, _) = started();
    h.take(ALICE);

    h.action(ALICE, "FLY", None);
    assert_eq!(h.errors(ALICE), vec!["Unknown action: FLY"]);

    h.action(ALICE, "DISCARD", None);
    assert_eq!(h.errors(ALICE), vec!["Missing field: tileId"]);
}

/// Test that unparseable input is answered with an error.
#[test]
fn test_malformed_message_is_rejected() {
    let mut h = Harness::quick();
    h.connect(ALICE);
    h.send(ALICE, "{not json");
    let errors = h.errors(ALICE);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Malformed command"));
}

/// Test that the turn clock auto-plays for an idle seat.
#[test]
fn test_turn_timeout_auto_plays() {
    let (mut h, code, _) = started();
    let dealer = h.state(&code).current_player().id;
    let turn_seconds = h.state(&code).turn_timer;

    for _ in 0..turn_seconds {
        assert!(h.fire(&code, TimerKind::TurnTick));
    }

    let state = h.state(&code);
    assert_ne!(state.current_player().id, dealer);
    let seat = state.seat_of(dealer).unwrap();
    assert_eq!(state.players[seat].hand.len(), 14);
    assert_eq!(state.players[seat].discards.len(), 1);
}

/// Test that an exhausted deck ends the match and votes restart it.
#[test]
fn test_deck_exhaustion_then_restart() {
    let (mut h, code, _) = started();
    let dealer = h.state(&code).current_player().id;
    let other = if dealer == ALICE { BOB } else { ALICE };

    let tile = h.state(&code).current_player().hand[0].id.raw();
    h.action(dealer, "DISCARD", Some(tile));

    {
        let room = h.orch.room_mut(&code).unwrap();
        let state = room.engine.as_mut().unwrap().state_mut();
        state.set_deck(Default::default());
        for (_, player) in state.players.iter_mut() {
            player.discards.clear();
        }
    }
    h.take(ALICE);
    h.action(other, "DRAW_CENTER", None);

    assert_eq!(h.phase(&code), RoomPhase::Finished);
    assert!(!h.timers.contains_key(&TimerKey::new(code.clone(), TimerKind::TurnTick)));
    let notice = h.take(ALICE).into_iter().find_map(|event| match event {
        ServerEvent::ChatMessage(chat) if chat.system => Some(chat.text),
        _ => None,
    });
    assert_eq!(notice.as_deref(), Some("The deck ran out, nobody wins this round"));

    // Both humans vote, then the delay relaunches.
    h.send(ALICE, r#"{"event":"restartVote"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Finished);
    h.send(BOB, r#"{"event":"restartVote"}"#);
    assert!(h.fire(&code, TimerKind::RestartDelay));

    assert_eq!(h.phase(&code), RoomPhase::Playing);
    assert_eq!(h.state(&code).deck_count, 76);
}

/// Test that restart votes are refused mid-match.
#[test]
fn test_restart_vote_needs_finished_match() {
    let (mut h, _, _) = started();
    h.take(ALICE);
    h.send(ALICE, r#"{"event":"restartVote"}"#);
    assert_eq!(h.errors(ALICE), vec!["No game in progress"]);
}

/// Test that a late joiner spectates and sees no hands.
#[test]
fn test_spectator_joins_running_match() {
    let (mut h, code, _) = started();
    let token = h.join(CAROL, &code, "Carol");
    assert!(token.is_none());

    let events = h.take(CAROL);
    assert!(matches!(events[0], ServerEvent::IsSpectator(true)));
    let view = events
        .iter()
        .find_map(|event| match event {
            ServerEvent::GameState(view) => Some(view),
            _ => None,
        })
        .expect("spectator sees the table");
    assert!(view.players.values().all(|p| p.hand.is_empty()));

    h.action(CAROL, "DRAW_CENTER", None);
    assert_eq!(h.errors(CAROL), vec!["You are not seated in this game"]);
    assert!(h.orch.room(&code).unwrap().is_spectator(CAROL));
}

/// Test reconnecting with a session token inside the grace window.
#[test]
fn test_reconnect_within_grace() {
    let (mut h, code, token) = started();
    let grace = TimerKey::new(code.clone(), TimerKind::Grace(token));

    h.disconnect(BOB);
    assert!(h.timers.contains_key(&grace));
    assert!(!h.orch.room(&code).unwrap().player(BOB).unwrap().connected);
    assert_eq!(h.phase(&code), RoomPhase::Playing);

    let bob2 = ConnectionId(20);
    h.connect(bob2);
    h.send(bob2, &format!(r#"{{"event":"rejoinGame","data":"{token}"}}"#));

    assert!(!h.timers.contains_key(&grace));
    let rejoined = h
        .take(bob2)
        .into_iter()
        .find_map(|event| match event {
            ServerEvent::RejoinSuccess { room_code, state, .. } => Some((room_code, state)),
            _ => None,
        })
        .expect("rejoinSuccess");
    assert_eq!(rejoined.0, code);
    let view = rejoined.1.expect("match state");
    let seat = view.seat_of(bob2).expect("seat rebound");
    assert!(!view.players[seat].hand.is_empty());

    let state = h.state(&code);
    assert!(state.seat_of(BOB).is_none());
    assert!(state.seat_of(bob2).is_some());
    assert!(h.orch.room(&code).unwrap().player(bob2).unwrap().connected);
}

/// Test that an expired grace window removes the player and ends the match.
#[test]
fn test_grace_expiry_cancels_match() {
    let (mut h, code, token) = started();
    h.disconnect(BOB);
    h.take(ALICE);

    assert!(h.fire(&code, TimerKind::Grace(token)));

    assert_eq!(h.phase(&code), RoomPhase::Lobby);
    let room = h.orch.room(&code).unwrap();
    assert!(room.engine.is_none());
    assert_eq!(room.players.len(), 1);
    assert!(h.orch.sessions().get(token).is_none());
    assert!(h.names(ALICE).contains(&"playerLeft"));
}

/// Test that a bad rejoin gets an error and a redirect.
#[test]
fn test_rejoin_with_unknown_token_redirects() {
    let mut h = Harness::quick();
    h.connect(BOB);
    h.send(BOB, r#"{"event":"rejoinGame","data":"definitely-not-a-token"}"#);
    assert_eq!(h.names(BOB), vec!["error", "forceRedirect"]);
}

/// Test that a kicked name cannot come back.
#[test]
fn test_kick_bans_by_name() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");
    h.take(BOB);
    h.take(ALICE);

    h.send(ALICE, &format!(r#"{{"event":"kickPlayer","data":{}}}"#, ALICE.0));
    assert_eq!(h.errors(ALICE), vec!["You cannot kick yourself"]);

    h.send(ALICE, &format!(r#"{{"event":"kickPlayer","data":{}}}"#, BOB.0));
    assert!(h.names(BOB).contains(&"kicked"));
    assert_eq!(h.orch.room(&code).unwrap().players.len(), 1);
    assert_eq!(h.orch.room_of(BOB), None);

    h.send(
        BOB,
        &format!(r#"{{"event":"joinRoom","data":{{"code":"{code}","name":"Bob"}}}}"#),
    );
    assert_eq!(h.names(BOB), vec!["banned"]);
    assert_eq!(h.orch.room(&code).unwrap().players.len(), 1);
}

/// Test that a bot seat draws and discards on its own.
#[test]
fn test_bot_plays_its_turn() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.send(ALICE, r#"{"event":"addBot"}"#);
    assert_eq!(h.orch.room(&code).unwrap().players[1].name, "Bot 1");

    h.send(ALICE, r#"{"event":"startGame"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Playing);

    let mut bot_moves = 0;
    for _ in 0..4 {
        let state = h.state(&code);
        if state.current_player().id == ALICE {
            if state.turn_phase == TurnPhase::AwaitingDraw {
                h.action(ALICE, "DRAW_CENTER", None);
            }
            let tile = h.state(&code).current_player().hand[0].id.raw();
            h.action(ALICE, "DISCARD", Some(tile));
            assert!(h.errors(ALICE).is_empty());
        } else {
            assert!(h.fire(&code, TimerKind::BotMove));
            bot_moves += 1;
            assert_eq!(h.state(&code).current_player().id, ALICE);
        }
    }
    assert!(bot_moves >= 1);
}

/// Test that bots are host-only and respect the seat limit.
#[test]
fn test_add_bot_host_only_and_room_full() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");
    h.take(BOB);

    h.send(BOB, r#"{"event":"addBot"}"#);
    assert_eq!(h.errors(BOB), vec!["Only the host can do that"]);

    h.send(ALICE, r#"{"event":"addBot"}"#);
    h.send(ALICE, r#"{"event":"addBot"}"#);
    h.take(ALICE);
    h.send(ALICE, r#"{"event":"addBot"}"#);
    assert_eq!(h.errors(ALICE), vec!["Room is full"]);
    assert_eq!(h.orch.room(&code).unwrap().players.len(), 4);
}

/// Test chat trimming, length cap and empty-message rejection.
#[test]
fn test_chat_is_trimmed_and_capped() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");
    h.take(ALICE);
    h.take(BOB);

    h.send(BOB, r#"{"event":"sendMessage","data":"  hello  "}"#);
    let chat = h.take(ALICE).into_iter().find_map(|event| match event {
        ServerEvent::ChatMessage(chat) => Some(chat),
        _ => None,
    });
    let chat = chat.expect("chat delivered");
    assert_eq!(chat.text, "hello");
    assert_eq!(chat.name, "Bob");
    assert_eq!(chat.from, Some(BOB));

    h.take(BOB);
    h.send(BOB, r#"{"event":"sendMessage","data":"   "}"#);
    assert_eq!(h.errors(BOB), vec!["Message is empty"]);

    let long = "x".repeat(500);
    h.send(BOB, &format!(r#"{{"event":"sendMessage","data":"{long}"}}"#));
    let capped = h.take(BOB).into_iter().find_map(|event| match event {
        ServerEvent::ChatMessage(chat) => Some(chat.text),
        _ => None,
    });
    assert_eq!(capped.map(|t| t.len()), Some(h.orch.config().max_chat_len));
}

/// Test that settings are host-only and range-checked.
#[test]
fn test_settings_are_host_only_and_validated() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");
    h.take(BOB);
    h.take(ALICE);

    h.send(BOB, r#"{"event":"updateSettings","data":{"turnSeconds":45}}"#);
    assert_eq!(h.errors(BOB), vec!["Only the host can do that"]);

    h.send(ALICE, r#"{"event":"updateSettings","data":{"turnSeconds":3}}"#);
    assert_eq!(h.errors(ALICE).len(), 1);
    assert_eq!(h.orch.room(&code).unwrap().settings.turn_seconds, 30);

    h.send(ALICE, r#"{"event":"updateSettings","data":{"turnSeconds":45}}"#);
    assert!(h.errors(ALICE).is_empty());
    assert_eq!(h.orch.room(&code).unwrap().settings.turn_seconds, 45);
}

/// Test that a fully ready room starts by itself.
#[test]
fn test_everyone_ready_starts_automatically() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");

    h.send(ALICE, r#"{"event":"toggleReady"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Lobby);
    h.take(BOB);

    h.send(BOB, r#"{"event":"toggleReady"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Playing);
    assert!(h.names(BOB).contains(&"autoTriggerStart"));
}

/// Test the start countdown steps down and launches the match.
#[test]
fn test_countdown_then_launch() {
    let mut h = Harness::new(ServerConfig::default().with_seed(3).with_start_countdown(3));
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");
    h.take(ALICE);

    h.send(ALICE, r#"{"event":"startGame"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Countdown);

    assert!(h.fire(&code, TimerKind::StartCountdown));
    assert!(h.fire(&code, TimerKind::StartCountdown));
    assert_eq!(h.phase(&code), RoomPhase::Countdown);
    assert!(h.fire(&code, TimerKind::StartCountdown));
    assert_eq!(h.phase(&code), RoomPhase::Playing);

    let counts: Vec<u32> = h
        .take(ALICE)
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::RoomCountdown(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![3, 2, 1]);
}

/// Test that a timer from an earlier epoch does nothing.
#[test]
fn test_stale_timer_is_ignored() {
    let mut h = Harness::new(ServerConfig::default().with_seed(3).with_start_countdown(3));
    let code = h.create(ALICE, "Alice");
    h.join(BOB, &code, "Bob");
    h.send(ALICE, r#"{"event":"startGame"}"#);

    let key = TimerKey::new(code.clone(), TimerKind::StartCountdown);
    let epoch = h.timers[&key];

    h.send(BOB, r#"{"event":"leaveRoom"}"#);
    assert_eq!(h.phase(&code), RoomPhase::Lobby);
    assert!(!h.timers.contains_key(&key));

    let effects = h.orch.handle_timer(TimerEvent { key, epoch });
    assert!(effects.is_empty());
    assert_eq!(h.phase(&code), RoomPhase::Lobby);
}

/// Test that a room with no humans left is closed.
#[test]
fn test_last_human_leaving_closes_room() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.send(ALICE, r#"{"event":"addBot"}"#);
    h.send(ALICE, r#"{"event":"leaveRoom"}"#);

    assert!(h.orch.room(&code).is_none());
    assert!(h.orch.sessions().is_empty());
    assert_eq!(h.orch.room_of(ALICE), None);
}

/// Test the public room list and room check.
#[test]
fn test_room_list_and_check() {
    let mut h = Harness::quick();
    let code = h.create(ALICE, "Alice");
    h.connect(CAROL);

    h.send(CAROL, r#"{"event":"getRooms"}"#);
    let list = h.take(CAROL).into_iter().find_map(|event| match event {
        ServerEvent::RoomListUpdate(rooms) => Some(rooms),
        _ => None,
    });
    assert_eq!(list.map(|rooms| rooms.len()), Some(1));

    h.send(CAROL, &format!(r#"{{"event":"checkRoom","data":"{code}"}}"#));
    let check = h.take(CAROL).into_iter().find_map(|event| match event {
        ServerEvent::RoomChecked(check) => Some(check),
        _ => None,
    });
    let check = check.expect("roomChecked");
    assert!(check.exists);
    assert_eq!(check.player_count, 1);

    h.send(ALICE, r#"{"event":"updateSettings","data":{"visibility":"private"}}"#);
    h.send(CAROL, r#"{"event":"getRooms"}"#);
    let list = h.take(CAROL).into_iter().find_map(|event| match event {
        ServerEvent::RoomListUpdate(rooms) => Some(rooms),
        _ => None,
    });
    assert_eq!(list.map(|rooms| rooms.len()), Some(0));

    h.send(CAROL, r#"{"event":"checkRoom","data":"QQQQ"}"#);
    let missing = h.take(CAROL).into_iter().any(|event| {
        matches!(event, ServerEvent::RoomChecked(check) if !check.exists)
    });
    assert!(missing);
}
