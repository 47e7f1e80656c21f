//! Error taxonomy of the hours tracker.
//!
//! Validation and permission failures never leave partial effects behind:
//! every mutating path runs inside a transaction that is dropped (rolled
//! back) when one of these errors is returned.

use crate::libs::messages::Message;
use crate::libs::permission::Capability;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HoursError {
    /// Bad numeric or date input. Shown as a warning, nothing is mutated.
    #[error("{0}")]
    Validation(Message),

    /// The caller lacks a capability.
    #[error("{0} privileges are required to perform this operation")]
    PermissionDenied(Capability),

    /// Unknown saved query, ticket or time entry.
    #[error("{0}")]
    NotFound(Message),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, HoursError>;

impl HoursError {
    pub fn validation(msg: Message) -> Self {
        HoursError::Validation(msg)
    }

    pub fn not_found(msg: Message) -> Self {
        HoursError::NotFound(msg)
    }

    /// The message to surface to the user, if the error carries one.
    pub fn message(&self) -> Option<&Message> {
        match self {
            HoursError::Validation(msg) | HoursError::NotFound(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_error_names_capability() {
        let err = HoursError::PermissionDenied(Capability::TicketAddHours);
        assert_eq!(err.to_string(), "TICKET_ADD_HOURS privileges are required to perform this operation");
    }

    #[test]
    fn validation_error_exposes_message() {
        let err = HoursError::validation(Message::InvalidHours);
        assert_eq!(err.message(), Some(&Message::InvalidHours));
        assert_eq!(err.to_string(), "Please enter a valid number of hours");
    }
}
