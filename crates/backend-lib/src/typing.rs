// ============================
// crates/backend-lib/src/typing.rs
// ============================
//! Typing relay. Ephemeral: nothing is stored server-side and no timer
//! runs here. Clients emit `typing_stop` after their own quiet period;
//! the server never originates a stop event, including on session
//! removal. A client that disconnects mid-composition can therefore
//! leave a stale indicator for other clients to clear locally.
use crate::broadcast::Broadcaster;
use crate::rooms::RoomStore;
use chatroom_common::{ServerEvent, Session};

#[derive(Default)]
pub struct TypingCoordinator;

impl TypingCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Relay a typing-start to the room, excluding the typist. Repeated
    /// starts repeat the relay; there is no server-side deduplication.
    pub fn start(&self, rooms: &RoomStore, broadcaster: &Broadcaster, room_id: &str, typist: &Session) {
        if let Some(members) = rooms.members(room_id) {
            broadcaster.to_room(
                members,
                &ServerEvent::UserTyping {
                    user_id: typist.id.clone(),
                    username: typist.username.clone(),
                },
                Some(&typist.id),
            );
        }
    }

    /// Relay a typing-stop to the room, excluding the typist.
    pub fn stop(&self, rooms: &RoomStore, broadcaster: &Broadcaster, room_id: &str, typist_id: &str) {
        if let Some(members) = rooms.members(room_id) {
            broadcaster.to_room(
                members,
                &ServerEvent::UserStopTyping {
                    user_id: typist_id.to_string(),
                },
                Some(typist_id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::HISTORY_CAP;
    use chatroom_common::Status;
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn session(id: &str, username: &str) -> Session {
        Session {
            id: id.to_string(),
            username: username.to_string(),
            avatar: String::new(),
            status: Status::Online,
            joined_at: Utc::now(),
        }
    }

    fn setup() -> (RoomStore, Broadcaster, mpsc::Receiver<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        let mut rooms = RoomStore::new("general", "General", HISTORY_CAP);
        rooms.join_room("general", "c1").unwrap();
        rooms.join_room("general", "c2").unwrap();

        let mut broadcaster = Broadcaster::new();
        let (tx1, rx1) = mpsc::channel(8);
        let (tx2, rx2) = mpsc::channel(8);
        broadcaster.register("c1".to_string(), tx1);
        broadcaster.register("c2".to_string(), tx2);

        (rooms, broadcaster, rx1, rx2)
    }

    #[tokio::test]
    async fn start_relays_to_room_excluding_typist() {
        let (rooms, broadcaster, mut rx1, mut rx2) = setup();
        let typing = TypingCoordinator::new();

        typing.start(&rooms, &broadcaster, "general", &session("c1", "ada"));

        assert_eq!(
            rx2.recv().await.unwrap(),
            ServerEvent::UserTyping {
                user_id: "c1".to_string(),
                username: "ada".to_string(),
            }
        );
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn repeated_starts_repeat_the_relay() {
        let (rooms, broadcaster, _rx1, mut rx2) = setup();
        let typing = TypingCoordinator::new();
        let ada = session("c1", "ada");

        typing.start(&rooms, &broadcaster, "general", &ada);
        typing.start(&rooms, &broadcaster, "general", &ada);

        assert!(rx2.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn stop_relays_without_username() {
        let (rooms, broadcaster, mut rx1, mut rx2) = setup();
        let typing = TypingCoordinator::new();

        typing.stop(&rooms, &broadcaster, "general", "c2");

        assert_eq!(
            rx1.recv().await.unwrap(),
            ServerEvent::UserStopTyping {
                user_id: "c2".to_string()
            }
        );
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_room_is_a_no_op() {
        let (rooms, broadcaster, mut rx1, mut rx2) = setup();
        let typing = TypingCoordinator::new();

        typing.start(&rooms, &broadcaster, "deleted-room", &session("c1", "ada"));
        typing.stop(&rooms, &broadcaster, "deleted-room", "c1");

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
    }
}
