//! Error types for the rule engine.

/// Errors that can occur while applying a game rule.
///
/// None of these are fatal for the match. The coordinator turns each one
/// into a refusal for the player who sent the offending request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The request is malformed: an unknown literal, a resource already
    /// taken by someone else, a parameter list of the wrong shape.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The request names something that does not exist, like an island id
    /// that was merged away or a cloud index past the end.
    #[error("{0} not found")]
    NotFound(String),

    /// A token transfer could not proceed: the source ran dry or the
    /// destination is full. Bulk transfers raise this after moving as
    /// much as they could.
    #[error("no movement possible: source is empty or destination is full")]
    NoMovement,

    /// An internal invariant would be broken. Indicates a bug or a
    /// protocol violation rather than a player mistake.
    #[error("illegal state: {0}")]
    IllegalState(String),
}

/// Shorthand used throughout the rule engine.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = GameError::NotFound("island 13".into());
        assert_eq!(err.to_string(), "island 13 not found");

        let err = GameError::Validation("unknown category 'purple'".into());
        assert!(err.to_string().contains("purple"));
    }
}
