// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_ACTIVE: &str = "ws.active";
pub const USER_JOINED: &str = "chat.user_joined";
pub const MESSAGE_APPENDED: &str = "chat.message_appended";
pub const HISTORY_EVICTED: &str = "chat.history_evicted";
pub const ROOM_CREATED: &str = "chat.room_created";
pub const EVENT_DROPPED: &str = "chat.event_dropped";
