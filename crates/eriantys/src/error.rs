//! Unified error type for the Eriantys server.

use eriantys_core::GameError;
use eriantys_match::MatchError;
use eriantys_protocol::ProtocolError;
use eriantys_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `eriantys` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum EriantysError {
    /// A rule-engine error (validation, not found, no movement).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A directory error (unknown player, bad token, not connected).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A match-level error (full, not found, not in match).
    #[error(transparent)]
    Match(#[from] MatchError),
}

#[cfg(test)]
mod tests {
    use eriantys_core::Nickname;
    use eriantys_protocol::MatchId;

    use super::*;

    #[test]
    fn test_from_game_error() {
        let err: EriantysError = GameError::NotFound("island 13".into()).into();
        assert!(matches!(err, EriantysError::Game(_)));
        assert_eq!(err.to_string(), "island 13 not found");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: EriantysError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, EriantysError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: EriantysError = SessionError::NotConnected(Nickname::from("ada")).into();
        assert!(matches!(err, EriantysError::Session(_)));
        assert!(err.to_string().contains("ada"));
    }

    #[test]
    fn test_from_match_error() {
        let err: EriantysError = MatchError::NotFound(MatchId(1)).into();
        assert!(matches!(err, EriantysError::Match(_)));
    }
}
