//! Error types and handling
//!
//! Common error types used by the task manager and the jobs it drives.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::RoomId;

/// Error type shared by the task manager and record task implementations
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("no task for the room {0}")]
    NotFound(RoomId),

    #[error("the task {0} is not ready yet")]
    NotReady(RoomId),

    #[error("the task {0} already exists")]
    AlreadyExists(RoomId),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API request failed (code {code}): {message}")]
    ApiRequest { code: i64, message: String },

    #[error("Task error: {0}")]
    Job(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl TaskError {
    /// Whether task creation should be retried after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TaskError::Timeout(_) | TaskError::Connection(_) | TaskError::ApiRequest { .. }
        )
    }
}

/// Error response for the API layer
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&TaskError> for ErrorResponse {
    fn from(error: &TaskError) -> Self {
        let code = match error {
            TaskError::NotFound(_) => "NOT_FOUND",
            TaskError::NotReady(_) => "NOT_READY",
            TaskError::AlreadyExists(_) => "ALREADY_EXISTS",
            TaskError::Timeout(_) => "TIMEOUT",
            TaskError::Connection(_) => "CONNECTION_ERROR",
            TaskError::ApiRequest { .. } => "API_REQUEST_ERROR",
            TaskError::Job(_) => "TASK_ERROR",
            TaskError::Settings(_) => "SETTINGS_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<TaskError> for ErrorResponse {
    fn from(error: TaskError) -> Self {
        ErrorResponse::from(&error)
    }
}

/// Result type alias using TaskError
pub type TaskResult<T> = Result<T, TaskError>;
