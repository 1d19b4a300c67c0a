// ============================
// crates/backend-lib/src/rooms.rs
// ============================
//! Room store: room definitions, membership sets and per-room bounded
//! message history.
//!
//! Rooms live for the whole process: the default room is created at
//! startup and never removed, created rooms are never garbage
//! collected. History is trimmed FIFO at the cap, independent of
//! reads.
use crate::error::AppError;
use crate::metrics::HISTORY_EVICTED;
use chatroom_common::{ChatMessage, RoomInfo, RoomSummary};
use metrics::counter;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// Maximum messages retained per room before FIFO eviction.
pub const HISTORY_CAP: usize = 1000;
/// Default window of recent messages sent on initial room sync.
pub const SYNC_WINDOW: usize = 100;

pub struct Room {
    pub id: String,
    pub name: String,
    /// Connection id of the creator; `None` for the default room.
    pub created_by: Option<String>,
    members: HashSet<String>,
    history: VecDeque<ChatMessage>,
}

impl Room {
    fn new(id: String, name: String, created_by: Option<String>) -> Self {
        Self {
            id,
            name,
            created_by,
            members: HashSet::new(),
            history: VecDeque::new(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

pub struct RoomStore {
    rooms: HashMap<String, Room>,
    // creation order, so room-list snapshots are stable
    order: Vec<String>,
    default_room_id: String,
    history_cap: usize,
}

impl RoomStore {
    pub fn new(default_room_id: &str, default_room_name: &str, history_cap: usize) -> Self {
        let mut store = Self {
            rooms: HashMap::new(),
            order: Vec::new(),
            default_room_id: default_room_id.to_string(),
            history_cap,
        };
        store.ensure_default_room(default_room_name);
        store
    }

    /// Create the default room if absent. Idempotent.
    pub fn ensure_default_room(&mut self, name: &str) {
        if !self.rooms.contains_key(&self.default_room_id) {
            let id = self.default_room_id.clone();
            self.rooms
                .insert(id.clone(), Room::new(id.clone(), name.to_string(), None));
            self.order.push(id);
        }
    }

    pub fn default_room_id(&self) -> &str {
        &self.default_room_id
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Allocate a new room with the creator as its sole member, and
    /// remove the creator from the default room in the same operation.
    pub fn create_room(&mut self, name: String, creator_id: &str) -> RoomInfo {
        let id = Uuid::new_v4().to_string();
        let mut room = Room::new(id.clone(), name.clone(), Some(creator_id.to_string()));
        room.members.insert(creator_id.to_string());
        self.rooms.insert(id.clone(), room);
        self.order.push(id.clone());

        if let Some(default) = self.rooms.get_mut(&self.default_room_id) {
            default.members.remove(creator_id);
        }

        RoomInfo {
            id,
            name,
            created_by: creator_id.to_string(),
            user_count: 1,
        }
    }

    /// Add a session to a room's member set. Joining twice is a no-op.
    pub fn join_room(&mut self, room_id: &str, session_id: &str) -> Result<(), AppError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;
        room.members.insert(session_id.to_string());
        Ok(())
    }

    /// Remove a session from a room's member set. Absent is a no-op.
    pub fn leave_room(&mut self, room_id: &str, session_id: &str) -> Result<(), AppError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;
        room.members.remove(session_id);
        Ok(())
    }

    /// Remove a session from every room's member set. Unconditional
    /// scan: cleanup must not assume a session is only ever in one room.
    pub fn remove_session_everywhere(&mut self, session_id: &str) {
        for room in self.rooms.values_mut() {
            room.members.remove(session_id);
        }
    }

    /// Append to a room's history, evicting the oldest entry past the cap.
    pub fn append_message(&mut self, message: ChatMessage) -> Result<(), AppError> {
        let room = self
            .rooms
            .get_mut(&message.room_id)
            .ok_or_else(|| AppError::RoomNotFound(message.room_id.clone()))?;

        room.history.push_back(message);
        while room.history.len() > self.history_cap {
            room.history.pop_front();
            counter!(HISTORY_EVICTED).increment(1);
        }
        Ok(())
    }

    /// Up to `limit` most recent messages, oldest-first.
    pub fn recent_history(&self, room_id: &str, limit: usize) -> Result<Vec<ChatMessage>, AppError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;

        let skip = room.history.len().saturating_sub(limit);
        Ok(room.history.iter().skip(skip).cloned().collect())
    }

    /// Member set for audience computation. Crate-internal: consumers of
    /// the public surface get counts via [`RoomStore::snapshot`] only.
    pub(crate) fn members(&self, room_id: &str) -> Option<&HashSet<String>> {
        self.rooms.get(room_id).map(|r| &r.members)
    }

    /// Owned read-only projection for room-list broadcasts, in creation
    /// order.
    pub fn snapshot(&self) -> Vec<RoomSummary> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .map(|room| RoomSummary {
                id: room.id.clone(),
                name: room.name.clone(),
                user_count: room.members.len(),
            })
            .collect()
    }
}
