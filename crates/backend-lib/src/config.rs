// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use crate::rooms::{HISTORY_CAP, SYNC_WINDOW};
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Identifier of the default room, created at startup and never removed
    pub default_room_id: String,
    /// Display name of the default room
    pub default_room_name: String,
    /// Per-room history cap; oldest messages are evicted past this
    pub history_cap: usize,
    /// Number of recent messages sent on initial room sync
    pub sync_window: usize,
    /// Per-connection outbound channel capacity
    pub send_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            default_room_id: "general".to_string(),
            default_room_name: "General".to_string(),
            history_cap: HISTORY_CAP,
            sync_window: SYNC_WINDOW,
            send_buffer: 64,
        }
    }
}

impl Settings {
    /// Load settings: defaults, then `config.toml`, then `CHAT_`-prefixed
    /// environment variables, later sources winning.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CHAT_"))
            .extract()?;

        Ok(settings)
    }
}
