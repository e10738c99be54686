//! Session registry.
//!
//! A session ties a stable token to the transient connection currently
//! using it. Sessions outlive disconnects; they are removed only through an
//! explicit leave, a kick or an expired grace window.

use rustc_hash::FxHashMap;

use crate::core::{ConnectionId, RoomCode, SessionToken};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    /// `None` while disconnected.
    pub conn: Option<ConnectionId>,
    pub room: RoomCode,
    pub name: String,
}

/// Token ↔ connection bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    by_token: FxHashMap<SessionToken, Session>,
    by_conn: FxHashMap<ConnectionId, SessionToken>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a connection that just took a seat.
    pub fn issue(&mut self, conn: ConnectionId, room: RoomCode, name: impl Into<String>) -> SessionToken {
        let token = SessionToken::issue();
        self.by_token.insert(
            token,
            Session {
                token,
                conn: Some(conn),
                room,
                name: name.into(),
            },
        );
        self.by_conn.insert(conn, token);
        token
    }

    #[must_use]
    pub fn get(&self, token: SessionToken) -> Option<&Session> {
        self.by_token.get(&token)
    }

    #[cfg(test)]
    fn token_of(&self, conn: ConnectionId) -> Option<SessionToken> {
        self.by_conn.get(&conn).copied()
    }

    /// The connection dropped. The session stays.
    pub fn detach(&mut self, conn: ConnectionId) -> Option<SessionToken> {
        let token = self.by_conn.remove(&conn)?;
        if let Some(session) = self.by_token.get_mut(&token) {
            session.conn = None;
        }
        Some(token)
    }

    /// Point a session at a new connection. Returns the previous one, if
    /// it was still attached.
    pub fn attach(&mut self, token: SessionToken, conn: ConnectionId) -> Option<ConnectionId> {
        let session = self.by_token.get_mut(&token)?;
        let previous = session.conn.replace(conn);
        if let Some(old) = previous {
            self.by_conn.remove(&old);
        }
        self.by_conn.insert(conn, token);
        previous
    }

    /// Delete a session outright.
    pub fn remove(&mut self, token: SessionToken) -> Option<Session> {
        let session = self.by_token.remove(&token)?;
        if let Some(conn) = session.conn {
            self.by_conn.remove(&conn);
        }
        Some(session)
    }

    /// Rename the session's player (after a name clash in the room).
    pub fn set_name(&mut self, token: SessionToken, name: impl Into<String>) {
        if let Some(session) = self.by_token.get_mut(&token) {
            session.name = name.into();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_keeps_session() {
        let mut sessions = SessionRegistry::new();
        let token = sessions.issue(ConnectionId(1), RoomCode::parse("ABCD"), "alice");

        assert_eq!(sessions.detach(ConnectionId(1)), Some(token));
        assert_eq!(sessions.token_of(ConnectionId(1)), None);
        assert_eq!(sessions.get(token).map(|s| s.conn), Some(None));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_attach_remaps_connection() {
        let mut sessions = SessionRegistry::new();
        let token = sessions.issue(ConnectionId(1), RoomCode::parse("ABCD"), "alice");
        sessions.detach(ConnectionId(1));

        assert_eq!(sessions.attach(token, ConnectionId(2)), None);
        assert_eq!(sessions.token_of(ConnectionId(2)), Some(token));

        // A second tab steals the session from the first.
        assert_eq!(sessions.attach(token, ConnectionId(3)), Some(ConnectionId(2)));
        assert_eq!(sessions.token_of(ConnectionId(2)), None);
        assert_eq!(sessions.token_of(ConnectionId(3)), Some(token));
    }

    #[test]
    fn test_remove() {
        let mut sessions = SessionRegistry::new();
        let token = sessions.issue(ConnectionId(4), RoomCode::parse("WXYZ"), "bob");
        assert!(sessions.remove(token).is_some());
        assert!(sessions.is_empty());
        assert_eq!(sessions.token_of(ConnectionId(4)), None);
        assert!(sessions.remove(token).is_none());
    }
}
