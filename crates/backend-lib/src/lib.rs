// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core library for the room-based real-time chat coordinator.
//!
//! The hub actor in [`hub`] owns all mutable state (session registry,
//! room store, broadcast routing) and serializes every inbound event;
//! [`ws_router`] is the WebSocket transport in front of it and [`api`]
//! the read-only snapshot surface.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod hub;
pub mod metrics;
pub mod registry;
pub mod rooms;
pub mod typing;
pub mod ws_router;

pub use config::Settings;
pub use error::AppError;
pub use hub::{spawn_hub, ChatHandle};
