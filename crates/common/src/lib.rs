// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the chat client and server.
//! This module defines the WebSocket protocol events and supporting types.
//!
//! Event names and payload field casing follow the browser client's
//! vocabulary: snake_case event tags (`user_join`, `new_message`) and
//! camelCase payload fields (`roomId`, `replyTo`, `userCount`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presence status of a connected session. Only `online` is modeled.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Online,
}

/// Server-side record of one active connection and its display identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Connection identifier assigned by the transport, stable for the
    /// connection's lifetime.
    pub id: String,
    /// Display name supplied at join. Not unique, not re-validated.
    pub username: String,
    /// URI to a display image.
    pub avatar: String,
    pub status: Status,
    pub joined_at: DateTime<Utc>,
}

/// Message kind tag. `text` is the default; the enum is the extension
/// point for richer kinds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
}

/// A chat message as stored in room history and broadcast to members.
///
/// `username` and `avatar` are a denormalized snapshot of the sender at
/// send time, so history stays readable after the sender disconnects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-generated unique identifier.
    pub id: String,
    /// Sender's connection id at time of send.
    pub user_id: String,
    pub username: String,
    pub avatar: String,
    pub content: String,
    /// Server-assigned send time. Never client-supplied.
    pub timestamp: DateTime<Utc>,
    pub room_id: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Optional reference to another message id in the same room.
    /// Not validated for existence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Read-only room projection used for room-list broadcasts. Never
/// carries the member set itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub user_count: usize,
}

/// Room definition sent with `room_created`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub user_count: usize,
}

/// Events sent from client to server.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Register a session and join the default room.
    UserJoin {
        username: String,
        #[serde(default)]
        avatar: Option<String>,
    },
    /// Send a message to a room (default room when `roomId` is absent).
    SendMessage {
        content: String,
        #[serde(default)]
        room_id: Option<String>,
        #[serde(rename = "type", default)]
        kind: MessageKind,
        #[serde(default)]
        reply_to: Option<String>,
    },
    /// Relay a "composing" indicator to the room, excluding the sender.
    TypingStart {
        #[serde(default)]
        room_id: Option<String>,
    },
    /// Clear the "composing" indicator. The client is responsible for
    /// emitting this after its quiet period; the server never times
    /// typing out on its own.
    TypingStop {
        #[serde(default)]
        room_id: Option<String>,
    },
    /// Create a room and move the sender into it.
    CreateRoom { name: String },
    JoinRoom { room_id: String },
    LeaveRoom { room_id: String },
}

/// Events sent from server to client(s).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A session registered. Audience: everyone.
    UserJoined { user: Session },
    /// A session disconnected (last known state). Audience: everyone.
    UserLeft { user: Session },
    /// Full presence list in registration order. Audience: everyone.
    UsersUpdate { users: Vec<Session> },
    /// Full room list with live member counts. Audience: everyone.
    RoomsUpdate { rooms: Vec<RoomSummary> },
    /// A room was created. Audience: everyone.
    RoomCreated { room: RoomInfo },
    /// A message was appended to a room. Audience: room members.
    NewMessage { message: ChatMessage },
    /// Initial history sync, oldest-first. Audience: requester only.
    RoomMessages {
        room_id: String,
        messages: Vec<ChatMessage>,
    },
    /// Audience: room members, excluding the typist.
    UserTyping { user_id: String, username: String },
    /// Audience: room members, excluding the typist.
    UserStopTyping { user_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_wire_format() {
        let json = r#"{"event":"user_join","username":"ada","avatar":"https://img/a.png"}"#;
        let parsed: ClientEvent = serde_json::from_str(json).unwrap();
        match parsed {
            ClientEvent::UserJoin { username, avatar } => {
                assert_eq!(username, "ada");
                assert_eq!(avatar.as_deref(), Some("https://img/a.png"));
            },
            other => panic!("Wrong variant: {other:?}"),
        }

        // avatar, roomId, type and replyTo are all optional
        let json = r#"{"event":"send_message","content":"hi"}"#;
        let parsed: ClientEvent = serde_json::from_str(json).unwrap();
        match parsed {
            ClientEvent::SendMessage {
                content,
                room_id,
                kind,
                reply_to,
            } => {
                assert_eq!(content, "hi");
                assert!(room_id.is_none());
                assert_eq!(kind, MessageKind::Text);
                assert!(reply_to.is_none());
            },
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn server_event_wire_format() {
        let event = ServerEvent::UserTyping {
            user_id: "c1".to_string(),
            username: "ada".to_string(),
        };
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "user_typing");
        assert_eq!(value["userId"], "c1");
        assert_eq!(value["username"], "ada");

        let event = ServerEvent::RoomsUpdate {
            rooms: vec![RoomSummary {
                id: "general".to_string(),
                name: "General".to_string(),
                user_count: 2,
            }],
        };
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "rooms_update");
        assert_eq!(value["rooms"][0]["userCount"], 2);
    }

    #[test]
    fn message_kind_and_reply_to() {
        let message = ChatMessage {
            id: "m1".to_string(),
            user_id: "c1".to_string(),
            username: "ada".to_string(),
            avatar: "a.png".to_string(),
            content: "hello".to_string(),
            timestamp: Utc::now(),
            room_id: "general".to_string(),
            kind: MessageKind::Text,
            reply_to: None,
        };

        let value: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["roomId"], "general");
        // absent replyTo is omitted, not null
        assert!(value.get("replyTo").is_none());

        let round: ChatMessage = serde_json::from_value(value).unwrap();
        assert_eq!(round, message);
    }
}
