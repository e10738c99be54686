//! Server actor.
//!
//! One tokio task owns the [`Orchestrator`]; every connection and timer
//! talks to it over an unbounded channel, so room state is never shared
//! and commands for the same room apply strictly one at a time.
//!
//! ## Timers
//!
//! `Effect::Schedule` spawns a sleeping task that posts a timer message
//! back to the actor. At most one task per [`TimerKey`] is alive:
//! rescheduling or cancelling aborts the previous one. A firing that was
//! already queued when its task was superseded carries an old sequence
//! number and is dropped.
//!
//! Timer tasks hold only a weak sender, so the actor stops once every
//! [`ServerHandle`] is gone.
//!
//! ```no_run
//! # async fn demo() {
//! use okey_server::core::ServerConfig;
//! use okey_server::server;
//!
//! let handle = server::spawn(ServerConfig::default());
//! let (conn, mut events) = handle.connect();
//! handle.send_raw(conn, r#"{"event":"getRooms"}"#);
//! let _list = events.recv().await;
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::core::{ConnectionId, ServerConfig};
use crate::room::{ClientCommand, Effect, Orchestrator, ServerEvent, TimerEvent, TimerKey};

/// Outbound queue of one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Message to the actor.
#[derive(Debug)]
pub enum ServerMsg {
    Connect { conn: ConnectionId, tx: EventSender },
    Command { conn: ConnectionId, raw: String },
    Disconnect { conn: ConnectionId },
    Timer { event: TimerEvent, seq: u64 },
}

/// Cheap cloneable entry point to a running server.
#[derive(Clone, Debug)]
pub struct ServerHandle {
    tx: mpsc::UnboundedSender<ServerMsg>,
    next_conn: Arc<AtomicU64>,
}

impl ServerHandle {
    /// Register a new connection. Events for it arrive on the receiver.
    pub fn connect(&self) -> (ConnectionId, EventReceiver) {
        let conn = ConnectionId(self.next_conn.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.tx.send(ServerMsg::Connect { conn, tx });
        (conn, rx)
    }

    /// Forward one raw inbound message.
    pub fn send_raw(&self, conn: ConnectionId, raw: impl Into<String>) {
        let _ = self.tx.send(ServerMsg::Command {
            conn,
            raw: raw.into(),
        });
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        let _ = self.tx.send(ServerMsg::Disconnect { conn });
    }
}

/// Start the actor on the current runtime.
pub fn spawn(config: ServerConfig) -> ServerHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = Server::new(config, tx.downgrade());
    tokio::spawn(actor.run(rx));
    ServerHandle {
        tx,
        next_conn: Arc::new(AtomicU64::new(0)),
    }
}

struct Server {
    orchestrator: Orchestrator,
    outbound: FxHashMap<ConnectionId, EventSender>,
    timers: FxHashMap<TimerKey, (u64, JoinHandle<()>)>,
    timer_seq: u64,
    /// Handed to timer tasks so they can post back.
    tx: mpsc::WeakUnboundedSender<ServerMsg>,
}

impl Server {
    fn new(config: ServerConfig, tx: mpsc::WeakUnboundedSender<ServerMsg>) -> Self {
        Self {
            orchestrator: Orchestrator::new(config),
            outbound: FxHashMap::default(),
            timers: FxHashMap::default(),
            timer_seq: 0,
            tx,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ServerMsg>) {
        info!("server actor started");
        while let Some(msg) = rx.recv().await {
            let effects = self.handle(msg);
            self.execute(effects);
        }
        for (_, (_, handle)) in self.timers.drain() {
            handle.abort();
        }
        info!("server actor stopped");
    }

    fn handle(&mut self, msg: ServerMsg) -> Vec<Effect> {
        match msg {
            ServerMsg::Connect { conn, tx } => {
                self.outbound.insert(conn, tx);
                self.orchestrator.connect(conn)
            }
            ServerMsg::Command { conn, raw } => match ClientCommand::parse(&raw) {
                Ok(command) => {
                    trace!(%conn, command = command.name(), "command");
                    self.orchestrator.handle_command(conn, command)
                }
                Err(err) => self.orchestrator.reject(conn, err),
            },
            ServerMsg::Disconnect { conn } => {
                self.outbound.remove(&conn);
                self.orchestrator.disconnect(conn)
            }
            ServerMsg::Timer { event, seq } => {
                if !matches!(self.timers.get(&event.key), Some((live, _)) if *live == seq) {
                    trace!(kind = ?event.key.kind, seq, "superseded timer dropped");
                    return Vec::new();
                }
                self.timers.remove(&event.key);
                self.orchestrator.handle_timer(event)
            }
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { to, event } => {
                    if let Some(tx) = self.outbound.get(&to) {
                        if tx.send(event).is_err() {
                            debug!(conn = %to, "receiver gone, dropping event");
                        }
                    }
                }
                Effect::Schedule { key, after, epoch } => {
                    self.timer_seq += 1;
                    let seq = self.timer_seq;
                    let tx = self.tx.clone();
                    let event = TimerEvent {
                        key: key.clone(),
                        epoch,
                    };
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(ServerMsg::Timer { event, seq });
                        }
                    });
                    if let Some((_, previous)) = self.timers.insert(key, (seq, task)) {
                        previous.abort();
                    }
                }
                Effect::Cancel(key) => {
                    if let Some((_, task)) = self.timers.remove(&key) {
                        task.abort();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::TimerKind;
    use std::time::Duration;

    fn command(server: &mut Server, conn: ConnectionId, raw: &str) {
        let effects = server.handle(ServerMsg::Command {
            conn,
            raw: raw.to_string(),
        });
        server.execute(effects);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_is_dropped() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = ServerConfig::default().with_seed(1).with_start_countdown(3);
        let mut server = Server::new(config, tx.downgrade());

        let conn = ConnectionId(1);
        let (out, mut events) = mpsc::unbounded_channel();
        let effects = server.handle(ServerMsg::Connect { conn, tx: out });
        server.execute(effects);
        command(&mut server, conn, r#"{"event":"createRoom","data":{"name":"Alice"}}"#);
        command(&mut server, conn, r#"{"event":"addBot"}"#);
        command(&mut server, conn, r#"{"event":"startGame"}"#);

        let mut code = None;
        while let Ok(event) = events.try_recv() {
            if let ServerEvent::RoomCreated(created) = event {
                code = Some(created);
            }
        }
        let code = code.unwrap();
        let key = TimerKey::new(code.clone(), TimerKind::StartCountdown);
        let live = server.timers[&key].0;
        let epoch = server.orchestrator.room(&code).unwrap().epoch;
        let event = TimerEvent {
            key: key.clone(),
            epoch,
        };

        let stale = server.handle(ServerMsg::Timer {
            event: event.clone(),
            seq: live - 1,
        });
        assert!(stale.is_empty());
        assert!(server.timers.contains_key(&key));

        let fired = server.handle(ServerMsg::Timer { event, seq: live });
        assert!(!fired.is_empty());
        assert!(!server.timers.contains_key(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_stops_when_handles_drop() {
        let handle = spawn(ServerConfig::default().with_seed(2));
        let (conn, mut events) = handle.connect();
        handle.send_raw(conn, r#"{"event":"createRoom","data":{"name":"Alice"}}"#);
        drop(handle);

        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while events.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
