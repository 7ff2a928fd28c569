//! Error types for the session layer.

use eriantys_core::Nickname;

/// Errors that can occur during session management.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the nickname.
    #[error("session not found for player {0}")]
    NotFound(Nickname),

    /// The reconnection token doesn't match what the server issued.
    #[error("invalid reconnection token")]
    InvalidToken,

    /// The reconnection grace period has elapsed.
    #[error("session expired for player {0}")]
    SessionExpired(Nickname),

    /// The nickname already has a live connection. Nicknames are unique
    /// across the server.
    #[error("player {0} already has an active session")]
    AlreadyConnected(Nickname),

    /// There is no live connection to deliver to. Callers skip the
    /// recipient and carry on.
    #[error("player {0} is not connected")]
    NotConnected(Nickname),
}
