// ============================
// crates/backend-lib/src/api.rs
// ============================
//! Read-only query surface: point-in-time snapshots of the session
//! registry and room store. No protocol beyond request/response.
use crate::error::AppError;
use crate::hub::ChatHandle;
use axum::{extract::State, Json};
use chatroom_common::{RoomSummary, Session};

/// `GET /api/users` — current sessions in registration order.
pub async fn list_users(State(handle): State<ChatHandle>) -> Result<Json<Vec<Session>>, AppError> {
    Ok(Json(handle.users().await?))
}

/// `GET /api/rooms` — rooms with live member counts.
pub async fn list_rooms(
    State(handle): State<ChatHandle>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    Ok(Json(handle.rooms().await?))
}
