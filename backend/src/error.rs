use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use room_core::{RoomError, ValidationFailure};
use serde_json::json;
use thiserror::Error;

use crate::repository::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Room(RoomError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            AppError::Room(RoomError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Room(RoomError::Forbidden(_)) => StatusCode::FORBIDDEN,
            AppError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Builds the `{"error": {...}}` body shared by every failure response.
pub fn error_body(
    status: StatusCode,
    error_type: &str,
    message: &str,
    failures: &[ValidationFailure],
) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "errors": failures,
            }
        })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Room(err) => {
                let error_type = match err {
                    RoomError::BadRequest(_) => "bad_request",
                    RoomError::NotFound(_) => "not_found",
                    RoomError::Forbidden(_) => "forbidden",
                };
                let message = err
                    .failures()
                    .first()
                    .map(|f| f.error_message.as_str())
                    .unwrap_or("Request failed.");
                error_body(status, error_type, message, err.failures())
            }
            AppError::Store(StoreError::Conflict { .. }) => error_body(
                status,
                "conflict",
                "Room was modified by another request. Please retry.",
                &[],
            ),
            AppError::Store(err) => {
                tracing::error!(%err, "store error");
                error_body(status, "internal_error", "An internal error occurred", &[])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        let cases = [
            (AppError::from(RoomError::bad_request("room", "x")), StatusCode::BAD_REQUEST),
            (AppError::from(RoomError::not_found("id", "x")), StatusCode::NOT_FOUND),
            (AppError::from(RoomError::forbidden("id", "x")), StatusCode::FORBIDDEN),
            (
                AppError::from(StoreError::Conflict { id: 1, expected: 0, found: 1 }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.into_response().status(), status);
        }
    }
}
