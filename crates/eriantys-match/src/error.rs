//! Error types for the match layer.

use eriantys_core::{GameError, Nickname};
use eriantys_protocol::{MatchId, PhaseName};

/// Errors that can occur during match operations.
///
/// Everything a player did wrong becomes a `Refused { reason }` message
/// built from this error's `Display` text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The match does not exist.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// Every seat in the match is taken.
    #[error("match {0} is full")]
    Full(MatchId),

    /// The player is already seated in a match.
    #[error("player {0} already in match {1}")]
    AlreadyInMatch(Nickname, MatchId),

    /// The player has no seat in this match (or in any match).
    #[error("player {0} is not in a match")]
    NotInMatch(Nickname),

    /// The match is in a state that doesn't allow this operation, for
    /// example joining after it started.
    #[error("invalid match state for this operation: {0}")]
    InvalidState(String),

    /// The current phase takes a different kind of action.
    #[error("unexpected message: {action} during {phase}")]
    UnexpectedMessage {
        action: &'static str,
        phase: PhaseName,
    },

    /// Someone other than the turn holder tried to act.
    #[error("not your turn, waiting for {0}")]
    NotYourTurn(Nickname),

    /// A game rule refused the action.
    #[error(transparent)]
    Rule(#[from] GameError),

    /// The match's command channel is full or closed.
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),
}
