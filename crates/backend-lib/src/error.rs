// ============================
// crates/backend-lib/src/error.rs
// ============================
//! Central error type + axum integration.
//!
//! Protocol-level "not found" conditions are resolved as silent no-ops
//! inside the hub and never reach a client as an error; `AppError`
//! exists for the REST boundary and internal plumbing.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("coordinator unavailable")]
    HubClosed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::RoomNotFound(_) | AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::HubClosed => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Json(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::RoomNotFound(_) => "ROOM_001",
            AppError::SessionNotFound(_) => "SESSION_001",
            AppError::HubClosed => "HUB_001",
            AppError::Json(_) => "JSON_001",
            AppError::Io(_) => "IO_001",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AppError::HubClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::RoomNotFound("nope".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::SessionNotFound("nope".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::HubClosed.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        assert_eq!(
            AppError::Json(json_err).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_codes() {
        assert_eq!(AppError::RoomNotFound("x".to_string()).error_code(), "ROOM_001");
        assert_eq!(AppError::HubClosed.error_code(), "HUB_001");
    }

    #[test]
    fn into_response_sets_status_and_content_type() {
        let response = AppError::RoomNotFound("lobby".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn from_send_error() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        drop(rx);
        let err: AppError = tx.send(1).unwrap_err().into();
        assert!(matches!(err, AppError::HubClosed));
    }
}
