//! Identifier newtypes.
//!
//! - `TileId`: unique per physical tile within a match (0..106).
//! - `ConnectionId`: transient, one per live connection. A reconnecting
//!   player gets a fresh one, which is then swapped in everywhere the old
//!   one was referenced (room seat list, live engine state).
//! - `SessionToken`: stable across reconnects, handed to the client once.
//! - `RoomCode`: short human-typed room code.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rng::GameRng;

/// Unique identifier of a physical tile within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u16);

impl TileId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tile({})", self.0)
    }
}

/// Transient identifier of a connection. Bots get one too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Stable session token, survives reconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub Uuid);

impl SessionToken {
    /// Issue a fresh random token.
    #[must_use]
    pub fn issue() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token sent back by a client.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Short room code typed in by humans (e.g. `"K7QX"`).
///
/// Codes are upper-cased on parse so that `"k7qx"` finds the same room.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Length of generated codes.
    pub const LEN: usize = 4;

    /// No 0/O or 1/I, they get mistyped.
    const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Generate a random code.
    pub fn generate(rng: &mut GameRng) -> Self {
        let code = (0..Self::LEN)
            .map(|_| Self::ALPHABET[rng.gen_range_usize(0..Self::ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalize a user-entered code.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
