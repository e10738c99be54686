//! Error taxonomy.
//!
//! - `ValidationError`: a command payload is malformed or missing a field.
//! - `RuleError`: a well-formed game action the rules forbid right now.
//! - `LifecycleError`: room/session bookkeeping refused the request.
//!
//! All three are reported to the originating connection only, as a single
//! `error` event, and never mutate state. Deck exhaustion and disconnects
//! are outcomes, not errors, and have no variant here.

use std::fmt;

use crate::core::TileId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required payload field is absent.
    MissingField(&'static str),
    /// The message is not valid JSON or has the wrong shape.
    Malformed(String),
    /// `gameAction.type` names no known action.
    UnknownAction(String),
    /// Chat text is empty after trimming.
    EmptyMessage,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "Missing field: {}", field),
            ValidationError::Malformed(message) => write!(f, "Malformed command: {}", message),
            ValidationError::UnknownAction(kind) => write!(f, "Unknown action: {}", kind),
            ValidationError::EmptyMessage => write!(f, "Message is empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    GameOver,
    NotInGame,
    NotYourTurn,
    MustDrawFirst,
    AlreadyDrew,
    WrongHandSize { expected: usize, actual: usize },
    TileNotInHand(TileId),
    EmptyDiscardPile,
    InvalidHand,
    InvalidMeld(String),
    DuplicateTile(TileId),
    InsufficientPoints { required: u32, got: u32 },
    InsufficientPairs { required: usize, got: usize },
    NotOpened,
    MixedOpening,
    SetNotFound(u32),
    CannotExtend,
    MustKeepTile,
    UnsupportedAction(&'static str),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::GameOver => write!(f, "The game is over"),
            RuleError::NotInGame => write!(f, "You are not seated in this game"),
            RuleError::NotYourTurn => write!(f, "It is not your turn"),
            RuleError::MustDrawFirst => write!(f, "You must draw a tile first"),
            RuleError::AlreadyDrew => write!(f, "You already drew this turn"),
            RuleError::WrongHandSize { expected, actual } => write!(
                f,
                "Hand has {} tiles, expected {}",
                actual, expected
            ),
            RuleError::TileNotInHand(id) => write!(f, "{} is not in your hand", id),
            RuleError::EmptyDiscardPile => write!(f, "The discard pile is empty"),
            RuleError::InvalidHand => write!(f, "Hand is not a winning hand"),
            RuleError::InvalidMeld(reason) => write!(f, "Invalid meld: {}", reason),
            RuleError::DuplicateTile(id) => write!(f, "{} was used twice", id),
            RuleError::InsufficientPoints { required, got } => write!(
                f,
                "Opening needs {} points, declared {}",
                required, got
            ),
            RuleError::InsufficientPairs { required, got } => write!(
                f,
                "Opening needs {} pairs, declared {}",
                required, got
            ),
            RuleError::NotOpened => write!(f, "You must open your hand first"),
            RuleError::MixedOpening => {
                write!(f, "Cannot mix pair and set declarations")
            }
            RuleError::SetNotFound(id) => write!(f, "No table set with id {}", id),
            RuleError::CannotExtend => write!(f, "Tile does not fit that set"),
            RuleError::MustKeepTile => write!(f, "You must keep a tile to discard"),
            RuleError::UnsupportedAction(action) => {
                write!(f, "{} is not available in this game mode", action)
            }
        }
    }
}

impl std::error::Error for RuleError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    RoomNotFound,
    SessionNotFound,
    RoomFull,
    GameAlreadyStarted,
    NotHost,
    NotInRoom,
    NoActiveGame,
    WrongPlayerCount(usize),
    LobbyOnly,
    Banned,
    InvalidSetting(String),
    CannotKickSelf,
    PlayerNotFound,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::RoomNotFound => write!(f, "Room not found"),
            LifecycleError::SessionNotFound => write!(f, "Session expired or not found"),
            LifecycleError::RoomFull => write!(f, "Room is full"),
            LifecycleError::GameAlreadyStarted => write!(f, "Game already started"),
            LifecycleError::NotHost => write!(f, "Only the host can do that"),
            LifecycleError::NotInRoom => write!(f, "You are not in a room"),
            LifecycleError::NoActiveGame => write!(f, "No game in progress"),
            LifecycleError::WrongPlayerCount(n) => {
                write!(f, "Need 2 or 4 players to start, have {}", n)
            }
            LifecycleError::LobbyOnly => write!(f, "Only allowed in the lobby"),
            LifecycleError::Banned => write!(f, "You were removed from this room"),
            LifecycleError::InvalidSetting(reason) => write!(f, "Invalid setting: {}", reason),
            LifecycleError::CannotKickSelf => write!(f, "You cannot kick yourself"),
            LifecycleError::PlayerNotFound => write!(f, "Player not found"),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Any error reportable to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    Validation(ValidationError),
    Rule(RuleError),
    Lifecycle(LifecycleError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Validation(e) => e.fmt(f),
            ServerError::Rule(e) => e.fmt(f),
            ServerError::Lifecycle(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Validation(e) => Some(e),
            ServerError::Rule(e) => Some(e),
            ServerError::Lifecycle(e) => Some(e),
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::Validation(err)
    }
}

impl From<RuleError> for ServerError {
    fn from(err: RuleError) -> Self {
        ServerError::Rule(err)
    }
}

impl From<LifecycleError> for ServerError {
    fn from(err: LifecycleError) -> Self {
        ServerError::Lifecycle(err)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
