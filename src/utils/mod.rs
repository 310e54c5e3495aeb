//! Shared utilities

pub mod error;
pub mod retry;

pub use error::{ErrorResponse, TaskError, TaskResult};
pub use retry::{RetryConfig, RetryPolicy};
