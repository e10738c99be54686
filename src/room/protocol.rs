//! Wire protocol.
//!
//! Every message is a JSON object `{"event": <name>, "data": <payload>}`.
//! Inbound messages parse into the closed [`ClientCommand`] union; anything
//! else is rejected with a `ValidationError` before it reaches a room.
//!
//! ```
//! use okey_server::room::ClientCommand;
//!
//! let cmd = ClientCommand::parse(r#"{"event":"joinRoom","data":{"code":"ab12","name":"Bob"}}"#)
//!     .unwrap();
//! assert!(matches!(cmd, ClientCommand::JoinRoom { .. }));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{
    ConnectionId, GameAction, GameMode, GameState, MeldKind, MeldTiles, RoomCode, RoomSettings,
    SessionToken, SettingsUpdate, Tile, TileFace, TileId,
};
use crate::error::ValidationError;

/// A command sent by a client.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        name: String,
        #[serde(default)]
        avatar: Option<String>,
        #[serde(default)]
        game_mode: Option<GameMode>,
    },
    JoinRoom {
        code: String,
        name: String,
        #[serde(default)]
        avatar: Option<String>,
    },
    RejoinGame(String),
    LeaveRoom,
    StartGame,
    KickPlayer(ConnectionId),
    AddBot,
    UpdateSettings(SettingsUpdate),
    ToggleReady,
    CheckRoom(String),
    GetRooms,
    GetGameState,
    SendMessage(String),
    SendEmote(String),
    RestartVote,
    GameAction(GameActionRequest),
}

impl ClientCommand {
    /// Parse and validate one inbound message.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let command: ClientCommand =
            serde_json::from_str(raw).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        command.validate()?;
        Ok(command)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
            Ok(())
        }

        match self {
            ClientCommand::CreateRoom { name, .. } => required(name, "name"),
            ClientCommand::JoinRoom { code, name, .. } => {
                required(code, "code")?;
                required(name, "name")
            }
            ClientCommand::RejoinGame(token) => required(token, "token"),
            ClientCommand::CheckRoom(code) => required(code, "code"),
            ClientCommand::SendEmote(emoji) => required(emoji, "emoji"),
            _ => Ok(()),
        }
    }

    /// Event name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::CreateRoom { .. } => "createRoom",
            ClientCommand::JoinRoom { .. } => "joinRoom",
            ClientCommand::RejoinGame(_) => "rejoinGame",
            ClientCommand::LeaveRoom => "leaveRoom",
            ClientCommand::StartGame => "startGame",
            ClientCommand::KickPlayer(_) => "kickPlayer",
            ClientCommand::AddBot => "addBot",
            ClientCommand::UpdateSettings(_) => "updateSettings",
            ClientCommand::ToggleReady => "toggleReady",
            ClientCommand::CheckRoom(_) => "checkRoom",
            ClientCommand::GetRooms => "getRooms",
            ClientCommand::GetGameState => "getGameState",
            ClientCommand::SendMessage(_) => "sendMessage",
            ClientCommand::SendEmote(_) => "sendEmote",
            ClientCommand::RestartVote => "restartVote",
            ClientCommand::GameAction(_) => "gameAction",
        }
    }
}

/// Untyped `gameAction` payload: `{type, payload?}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GameActionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl GameActionRequest {
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Check the payload for `kind` and build the typed action.
    pub fn into_action(self) -> Result<GameAction, ValidationError> {
        let payload = &self.payload;
        match self.kind.as_str() {
            "DRAW_CENTER" => Ok(GameAction::DrawCenter),
            "DRAW_LEFT" => Ok(GameAction::DrawLeft),
            "DISCARD" => Ok(GameAction::Discard {
                tile: tile_field(payload, "tileId")?,
            }),
            "FINISH_GAME" => Ok(GameAction::FinishGame {
                tile: tile_field(payload, "tileId")?,
            }),
            "OPEN_HAND" => {
                let sets = payload
                    .get("sets")
                    .ok_or(ValidationError::MissingField("sets"))?;
                let melds: Vec<Vec<TileId>> = serde_json::from_value(sets.clone())
                    .map_err(|e| ValidationError::Malformed(format!("sets: {e}")))?;
                let kind = match payload.get("kind") {
                    None | Some(Value::Null) => MeldKind::Sets,
                    Some(kind) => serde_json::from_value(kind.clone())
                        .map_err(|e| ValidationError::Malformed(format!("kind: {e}")))?,
                };
                Ok(GameAction::OpenHand {
                    kind,
                    melds: melds.into_iter().map(MeldTiles::from_vec).collect(),
                })
            }
            "PROCESS_TILE" => {
                let set_id = payload
                    .get("setId")
                    .ok_or(ValidationError::MissingField("setId"))?
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| ValidationError::Malformed("setId must be a set id".into()))?;
                Ok(GameAction::ProcessTile {
                    tile: tile_field(payload, "tileId")?,
                    set_id,
                })
            }
            "RESTART_GAME" => Ok(GameAction::RestartGame),
            other => Err(ValidationError::UnknownAction(other.to_string())),
        }
    }
}

fn tile_field(payload: &Value, field: &'static str) -> Result<TileId, ValidationError> {
    payload
        .get(field)
        .ok_or(ValidationError::MissingField(field))?
        .as_u64()
        .and_then(|n| u16::try_from(n).ok())
        .map(TileId)
        .ok_or_else(|| ValidationError::Malformed(format!("{field} must be a tile id")))
}

// === Outbound ===

/// An event pushed to a client.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    SessionCreated { token: SessionToken },
    RoomCreated(RoomCode),
    JoinedRoom(RoomCode),
    IsSpectator(bool),
    #[serde(rename_all = "camelCase")]
    RejoinSuccess {
        room_code: RoomCode,
        state: Option<Box<GameState>>,
        room: RoomData,
    },
    ForceRedirect(String),
    UpdateRoom(RoomData),
    GameState(Box<GameState>),
    GameStarted(Box<GameState>),
    RoomCountdown(u32),
    JokerRevealed { indicator: Tile, wildcard: TileFace },
    RoomListUpdate(Vec<RoomSummary>),
    ChatMessage(ChatMessage),
    EmoteReceived {
        from: ConnectionId,
        name: String,
        emoji: String,
    },
    PlayerLeft(ConnectionId),
    Kicked(String),
    Banned(String),
    Error(String),
    AutoTriggerStart,
    RoomChecked(RoomCheck),
}

impl ServerEvent {
    /// Event name, for logging and tests.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::SessionCreated { .. } => "sessionCreated",
            ServerEvent::RoomCreated(_) => "roomCreated",
            ServerEvent::JoinedRoom(_) => "joinedRoom",
            ServerEvent::IsSpectator(_) => "isSpectator",
            ServerEvent::RejoinSuccess { .. } => "rejoinSuccess",
            ServerEvent::ForceRedirect(_) => "forceRedirect",
            ServerEvent::UpdateRoom(_) => "updateRoom",
            ServerEvent::GameState(_) => "gameState",
            ServerEvent::GameStarted(_) => "gameStarted",
            ServerEvent::RoomCountdown(_) => "roomCountdown",
            ServerEvent::JokerRevealed { .. } => "jokerRevealed",
            ServerEvent::RoomListUpdate(_) => "roomListUpdate",
            ServerEvent::ChatMessage(_) => "chatMessage",
            ServerEvent::EmoteReceived { .. } => "emoteReceived",
            ServerEvent::PlayerLeft(_) => "playerLeft",
            ServerEvent::Kicked(_) => "kicked",
            ServerEvent::Banned(_) => "banned",
            ServerEvent::Error(_) => "error",
            ServerEvent::AutoTriggerStart => "autoTriggerStart",
            ServerEvent::RoomChecked(_) => "roomChecked",
        }
    }

    /// Serialize for the wire.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Room lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomPhase {
    Lobby,
    /// Start countdown running.
    Countdown,
    Playing,
    /// A match just ended; the lobby shows its scores.
    Finished,
}

/// One seated player as shown in the lobby.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: ConnectionId,
    pub name: String,
    pub avatar: Option<String>,
    pub is_host: bool,
    pub is_bot: bool,
    pub connected: bool,
    pub ready: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectatorView {
    pub id: ConnectionId,
    pub name: String,
}

/// Lobby and scoreboard snapshot. Never carries tiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomData {
    pub code: RoomCode,
    pub host_id: Option<ConnectionId>,
    pub players: Vec<PlayerView>,
    pub spectators: Vec<SpectatorView>,
    pub game_mode: GameMode,
    pub settings: RoomSettings,
    pub phase: RoomPhase,
    pub game_started: bool,
    /// Cumulative scores by player name.
    pub scores: BTreeMap<String, i32>,
    pub restart_votes: Vec<String>,
    pub series_over: bool,
}

/// Entry in the public room list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: RoomCode,
    pub host_name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub game_started: bool,
    pub mode: GameMode,
}

/// Answer to `checkRoom`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCheck {
    pub code: RoomCode,
    pub exists: bool,
    pub player_count: usize,
    pub is_full: bool,
    pub game_started: bool,
    pub mode: Option<GameMode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub from: Option<ConnectionId>,
    pub name: String,
    pub text: String,
    pub system: bool,
}

impl ChatMessage {
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            from: None,
            name: "System".to_string(),
            text: text.into(),
            system: true,
        }
    }
}
