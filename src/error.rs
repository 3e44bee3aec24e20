//! Error taxonomy for chatrelay.
//!
//! `ActionError` covers the client-input failures action handlers can return;
//! each variant carries the exact text the client sees in an `error` frame.
//! `ProtocolError` covers failures the connection handler detects before an
//! action handler ever runs (oversize frame, invalid JSON, unknown action).

use thiserror::Error;

/// Failures an action handler can report about the request it was given.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Username cannot be empty")]
    UsernameEmpty,

    #[error("Username must be at least 3 characters long")]
    UsernameTooShort,

    #[error("Username must be less than 20 characters")]
    UsernameTooLong,

    #[error("Username \"{0}\" is already taken. Please choose another.")]
    UsernameTaken(String),

    #[error("username already set")]
    UsernameAlreadySet,

    #[error("Client not registered")]
    NotRegistered,

    #[error("{action} requires {field}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("Room {0} not found")]
    RoomNotFound(String),

    #[error("Already in this room")]
    AlreadyMember,

    #[error("not joined to room")]
    NotMember,

    #[error("private message requires recipient name")]
    PrivateRecipientMissing,

    #[error("private message text is empty")]
    PrivateTextEmpty,

    #[error("User \"{0}\" not found or offline")]
    PrivateRecipientOffline(String),
}

/// Failures detected by the connection handler itself, before dispatch.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Message too large. Max size: {limit} bytes")]
    FrameTooLarge { limit: usize },

    #[error("invalid json")]
    InvalidJson,

    #[error("unknown action {0}")]
    UnknownAction(String),
}

/// Truncate a handler-exception message to the length the spec's
/// `handler error: <short>` disposition expects on the wire.
pub fn truncate_handler_error(detail: &str) -> String {
    const MAX: usize = 100;
    if detail.len() <= MAX {
        detail.to_string()
    } else {
        let mut cut = MAX;
        while !detail.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &detail[..cut])
    }
}
