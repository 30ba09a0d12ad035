use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Event {0} not found")]
    EventNotFound(Uuid),

    #[error("Reminder {0} not found")]
    ReminderNotFound(Uuid),

    #[error("User is already registered for this event")]
    AlreadyRegistered,

    #[error("Event is full ({max_participants} participants)")]
    CapacityExceeded { max_participants: i32 },

    #[error("Helper {helper_id} is already assigned to overlapping event {conflicting_event_id}")]
    HelperUnavailable {
        helper_id: Uuid,
        conflicting_event_id: Uuid,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Event has already started")]
    EventAlreadyStarted,

    #[error("Helper is not assigned to this event")]
    NotAssigned,

    #[error("Registration was cancelled")]
    RegistrationCancelled,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Coarse classification used by callers that map errors onto transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Persistence,
    Validation,
    Unauthorized,
    Forbidden,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(_) => ErrorKind::Persistence,
            AppError::NotFound(_) | AppError::EventNotFound(_) | AppError::ReminderNotFound(_) => {
                ErrorKind::NotFound
            }
            AppError::AlreadyRegistered
            | AppError::CapacityExceeded { .. }
            | AppError::HelperUnavailable { .. }
            | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::EventAlreadyStarted
            | AppError::NotAssigned
            | AppError::RegistrationCancelled
            | AppError::InvalidState(_) => ErrorKind::InvalidState,
            AppError::BadRequest(_) | AppError::Validation(_) => ErrorKind::Validation,
            AppError::Unauthorized => ErrorKind::Unauthorized,
            AppError::Forbidden => ErrorKind::Forbidden,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match (&self, kind) {
            (AppError::Validation(_), _) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Conflict | ErrorKind::InvalidState | ErrorKind::Validation) => {
                StatusCode::BAD_REQUEST
            }
            (_, ErrorKind::Unauthorized) => StatusCode::UNAUTHORIZED,
            (_, ErrorKind::Forbidden) => StatusCode::FORBIDDEN,
            (_, ErrorKind::Persistence) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::Database(ref msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error occurred".to_string()
            }
            ref other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
