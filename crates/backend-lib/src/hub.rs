// ============================
// crates/backend-lib/src/hub.rs
// ============================
//! Chat hub actor: the single serialization point for session registry,
//! room store and broadcast routing.
//!
//! Every inbound event becomes one actor message, so state mutation and
//! the audience computation for the resulting broadcasts always execute
//! back to back. No two broadcasts for the same room can be observed
//! out of order by any recipient, and disconnect cleanup (registry +
//! all rooms + notifications) is one atomic unit from the perspective
//! of any concurrent sender.
use crate::broadcast::Broadcaster;
use crate::config::Settings;
use crate::error::AppError;
use crate::metrics::{MESSAGE_APPENDED, ROOM_CREATED, USER_JOINED, WS_ACTIVE, WS_CONNECTION};
use crate::registry::SessionRegistry;
use crate::rooms::RoomStore;
use crate::typing::TypingCoordinator;
use chatroom_common::{ChatMessage, ClientEvent, RoomSummary, ServerEvent, Session};
use chrono::Utc;
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Message sent *into* the hub actor.
pub enum HubCommand {
    /// A transport connection opened; register its outbound sender.
    Connect {
        conn_id: String,
        tx: mpsc::Sender<ServerEvent>,
    },
    /// A decoded client event from one connection.
    Client { conn_id: String, event: ClientEvent },
    /// The transport connection closed.
    Disconnect { conn_id: String },
    /// Point-in-time presence snapshot (REST boundary).
    Users {
        resp_tx: mpsc::UnboundedSender<Vec<Session>>,
    },
    /// Point-in-time room-list snapshot (REST boundary).
    Rooms {
        resp_tx: mpsc::UnboundedSender<Vec<RoomSummary>>,
    },
}

/// Handle that transport and boundary layers keep.
#[derive(Clone)]
pub struct ChatHandle {
    cmd_tx: mpsc::UnboundedSender<HubCommand>,
    send_buffer: usize,
}

impl ChatHandle {
    /// Capacity for per-connection outbound channels.
    pub fn send_buffer(&self) -> usize {
        self.send_buffer
    }

    pub fn connect(&self, conn_id: String, tx: mpsc::Sender<ServerEvent>) -> Result<(), AppError> {
        self.cmd_tx.send(HubCommand::Connect { conn_id, tx })?;
        Ok(())
    }

    pub fn client_event(&self, conn_id: &str, event: ClientEvent) -> Result<(), AppError> {
        self.cmd_tx.send(HubCommand::Client {
            conn_id: conn_id.to_string(),
            event,
        })?;
        Ok(())
    }

    pub fn disconnect(&self, conn_id: &str) -> Result<(), AppError> {
        self.cmd_tx.send(HubCommand::Disconnect {
            conn_id: conn_id.to_string(),
        })?;
        Ok(())
    }

    pub async fn users(&self) -> Result<Vec<Session>, AppError> {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        self.cmd_tx.send(HubCommand::Users { resp_tx })?;
        resp_rx.recv().await.ok_or(AppError::HubClosed)
    }

    pub async fn rooms(&self) -> Result<Vec<RoomSummary>, AppError> {
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        self.cmd_tx.send(HubCommand::Rooms { resp_tx })?;
        resp_rx.recv().await.ok_or(AppError::HubClosed)
    }
}

pub struct ChatHub {
    registry: SessionRegistry,
    rooms: RoomStore,
    typing: TypingCoordinator,
    broadcaster: Broadcaster,
    sync_window: usize,
}

/// Spawn the hub actor and return its handle.
pub fn spawn_hub(settings: &Settings) -> ChatHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let hub = ChatHub::new(settings);

    tokio::spawn(hub.run(cmd_rx));

    ChatHandle {
        cmd_tx,
        send_buffer: settings.send_buffer,
    }
}

impl ChatHub {
    pub fn new(settings: &Settings) -> Self {
        Self {
            registry: SessionRegistry::new(),
            rooms: RoomStore::new(
                &settings.default_room_id,
                &settings.default_room_name,
                settings.history_cap,
            ),
            typing: TypingCoordinator::new(),
            broadcaster: Broadcaster::new(),
            sync_window: settings.sync_window,
        }
    }

    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<HubCommand>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                HubCommand::Connect { conn_id, tx } => self.handle_connect(conn_id, tx),
                HubCommand::Client { conn_id, event } => self.handle_event(&conn_id, event),
                HubCommand::Disconnect { conn_id } => self.handle_disconnect(&conn_id),
                HubCommand::Users { resp_tx } => {
                    let _ = resp_tx.send(self.registry.list().to_vec());
                },
                HubCommand::Rooms { resp_tx } => {
                    let _ = resp_tx.send(self.rooms.snapshot());
                },
            }
        }
    }

    fn handle_connect(&mut self, conn_id: String, tx: mpsc::Sender<ServerEvent>) {
        debug!(conn_id, "connection opened");
        self.broadcaster.register(conn_id, tx);
        counter!(WS_CONNECTION).increment(1);
        gauge!(WS_ACTIVE).increment(1.0);
    }

    fn handle_event(&mut self, conn_id: &str, event: ClientEvent) {
        match event {
            ClientEvent::UserJoin { username, avatar } => self.user_join(conn_id, username, avatar),
            ClientEvent::SendMessage {
                content,
                room_id,
                kind,
                reply_to,
            } => self.send_message(conn_id, content, room_id, kind, reply_to),
            ClientEvent::TypingStart { room_id } => self.typing_start(conn_id, room_id),
            ClientEvent::TypingStop { room_id } => self.typing_stop(conn_id, room_id),
            ClientEvent::CreateRoom { name } => self.create_room(conn_id, name),
            ClientEvent::JoinRoom { room_id } => self.join_room(conn_id, &room_id),
            ClientEvent::LeaveRoom { room_id } => self.leave_room(conn_id, &room_id),
        }
    }

    fn user_join(&mut self, conn_id: &str, username: String, avatar: Option<String>) {
        let user = self.registry.join(conn_id, username, avatar);

        let default_room = self.rooms.default_room_id().to_string();
        // the default room always exists
        let _ = self.rooms.join_room(&default_room, conn_id);

        self.broadcaster
            .to_all(&ServerEvent::UserJoined { user: user.clone() });
        self.broadcast_presence();
        self.broadcast_rooms();

        let messages = self
            .rooms
            .recent_history(&default_room, self.sync_window)
            .unwrap_or_default();
        self.broadcaster.to_one(
            conn_id,
            ServerEvent::RoomMessages {
                room_id: default_room,
                messages,
            },
        );

        counter!(USER_JOINED).increment(1);
        debug!(conn_id, username = %user.username, "user joined");
    }

    fn send_message(
        &mut self,
        conn_id: &str,
        content: String,
        room_id: Option<String>,
        kind: chatroom_common::MessageKind,
        reply_to: Option<String>,
    ) {
        let Some(sender) = self.registry.get(conn_id).cloned() else {
            debug!(conn_id, "send_message from unregistered connection ignored");
            return;
        };

        let room_id = room_id.unwrap_or_else(|| self.rooms.default_room_id().to_string());

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            user_id: sender.id,
            username: sender.username,
            avatar: sender.avatar,
            content,
            timestamp: Utc::now(),
            room_id: room_id.clone(),
            kind,
            reply_to,
        };

        // append first, then snapshot the audience: a member that left
        // before this point is not in the set, one that just joined is
        if let Err(err) = self.rooms.append_message(message.clone()) {
            debug!(conn_id, room_id, "message dropped: {err}");
            return;
        }
        if let Some(members) = self.rooms.members(&room_id) {
            self.broadcaster
                .to_room(members, &ServerEvent::NewMessage { message }, None);
        }
        counter!(MESSAGE_APPENDED).increment(1);
    }

    fn typing_start(&self, conn_id: &str, room_id: Option<String>) {
        // typing-start carries the username, so it needs a registered session
        let Some(typist) = self.registry.get(conn_id) else {
            return;
        };
        let room_id = room_id.unwrap_or_else(|| self.rooms.default_room_id().to_string());
        self.typing
            .start(&self.rooms, &self.broadcaster, &room_id, typist);
    }

    fn typing_stop(&self, conn_id: &str, room_id: Option<String>) {
        let room_id = room_id.unwrap_or_else(|| self.rooms.default_room_id().to_string());
        self.typing
            .stop(&self.rooms, &self.broadcaster, &room_id, conn_id);
    }

    fn create_room(&mut self, conn_id: &str, name: String) {
        // membership sets only ever hold registered sessions
        if !self.registry.contains(conn_id) {
            debug!(conn_id, "create_room from unregistered connection ignored");
            return;
        }

        let room = self.rooms.create_room(name, conn_id);
        debug!(conn_id, room_id = %room.id, "room created");

        self.broadcaster.to_all(&ServerEvent::RoomCreated { room });
        self.broadcast_rooms();
        counter!(ROOM_CREATED).increment(1);
    }

    fn join_room(&mut self, conn_id: &str, room_id: &str) {
        if !self.registry.contains(conn_id) {
            debug!(conn_id, "join_room from unregistered connection ignored");
            return;
        }
        if let Err(err) = self.rooms.join_room(room_id, conn_id) {
            debug!(conn_id, room_id, "join_room ignored: {err}");
            return;
        }

        let messages = self
            .rooms
            .recent_history(room_id, self.sync_window)
            .unwrap_or_default();
        self.broadcaster.to_one(
            conn_id,
            ServerEvent::RoomMessages {
                room_id: room_id.to_string(),
                messages,
            },
        );
        self.broadcast_rooms();
    }

    fn leave_room(&mut self, conn_id: &str, room_id: &str) {
        if let Err(err) = self.rooms.leave_room(room_id, conn_id) {
            debug!(conn_id, room_id, "leave_room ignored: {err}");
            return;
        }
        self.broadcast_rooms();
    }

    /// Disconnect cleanup is one atomic unit: registry removal, the
    /// unconditional room scan and the resulting notifications all run
    /// before any other command is processed.
    fn handle_disconnect(&mut self, conn_id: &str) {
        self.broadcaster.unregister(conn_id);
        gauge!(WS_ACTIVE).decrement(1.0);

        let Some(user) = self.registry.remove(conn_id) else {
            debug!(conn_id, "connection closed before joining");
            return;
        };

        self.rooms.remove_session_everywhere(conn_id);

        self.broadcaster.to_all(&ServerEvent::UserLeft { user });
        self.broadcast_presence();
        self.broadcast_rooms();
        debug!(conn_id, "user disconnected");
    }

    fn broadcast_presence(&self) {
        self.broadcaster.to_all(&ServerEvent::UsersUpdate {
            users: self.registry.list().to_vec(),
        });
    }

    fn broadcast_rooms(&self) {
        self.broadcaster.to_all(&ServerEvent::RoomsUpdate {
            rooms: self.rooms.snapshot(),
        });
    }
}
