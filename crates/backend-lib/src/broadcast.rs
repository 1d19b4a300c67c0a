// ============================
// crates/backend-lib/src/broadcast.rs
// ============================
//! Broadcast router: translates a state change into outbound events for
//! a computed audience. The only component that touches connection
//! senders; it never mutates registry or room state.
//!
//! Delivery is best effort: a full or closed channel drops the event
//! for that recipient only and never blocks the others. Messages are
//! not durable beyond the room history.
use crate::metrics::EVENT_DROPPED;
use chatroom_common::ServerEvent;
use metrics::counter;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
pub struct Broadcaster {
    conns: HashMap<String, mpsc::Sender<ServerEvent>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn_id: String, tx: mpsc::Sender<ServerEvent>) {
        self.conns.insert(conn_id, tx);
    }

    pub fn unregister(&mut self, conn_id: &str) -> bool {
        self.conns.remove(conn_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Deliver to every currently registered connection.
    pub fn to_all(&self, event: &ServerEvent) {
        for (conn_id, tx) in &self.conns {
            deliver(conn_id, tx, event.clone());
        }
    }

    /// Deliver to every connection in `members`, optionally excluding
    /// one (the originator of a typing relay does not need its echo).
    /// The caller passes the member set as observed after its state
    /// mutation, so the audience is a post-mutation snapshot.
    pub fn to_room(&self, members: &HashSet<String>, event: &ServerEvent, excluding: Option<&str>) {
        for conn_id in members {
            if excluding == Some(conn_id.as_str()) {
                continue;
            }
            if let Some(tx) = self.conns.get(conn_id) {
                deliver(conn_id, tx, event.clone());
            }
        }
    }

    /// Deliver to a single connection (initial history sync).
    pub fn to_one(&self, conn_id: &str, event: ServerEvent) {
        if let Some(tx) = self.conns.get(conn_id) {
            deliver(conn_id, tx, event);
        }
    }
}

fn deliver(conn_id: &str, tx: &mpsc::Sender<ServerEvent>, event: ServerEvent) {
    if let Err(err) = tx.try_send(event) {
        counter!(EVENT_DROPPED).increment(1);
        debug!(conn_id, "dropping outbound event: {err}");
    }
}
