// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling across handlers, store and payment code.
#[derive(Debug)]
pub enum AppError {
    /// Bad user input (age out of range, empty required field, unknown
    /// callback token). Recovered locally by reprompting.
    Validation(String),

    /// Database failure (connection, constraint violation). Retried once
    /// by the event loop before the user sees "try again later".
    Store(String),

    /// Outbound send failure. Non-fatal; pending notifications are kept
    /// so delivery is retried on the recipient's next activity.
    Transport(String),

    /// Payment provider rejection, payload mismatch or expired correlation.
    Payment(String),

    /// Malformed inbound event. Logged and dropped.
    Protocol(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "validation error: {}", msg),
            AppError::Store(msg) => write!(f, "store error: {}", msg),
            AppError::Transport(msg) => write!(f, "transport error: {}", msg),
            AppError::Payment(msg) => write!(f, "payment error: {}", msg),
            AppError::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `sqlx::Error` into `AppError::Store`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Protocol(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}
