//! Match configuration and lifecycle state.

use std::time::Duration;

use eriantys_core::{CharacterId, GameOptions};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Configuration for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Seats at the table: 2 or 3. The match starts once all are taken.
    pub player_count: usize,

    /// Expert variant: coins and character cards.
    pub expert: bool,

    /// How long the match waits after a disconnect before checking
    /// whether enough players are still connected.
    pub reconnect_grace: Duration,

    /// Fewest connected players the match can go on with.
    pub min_connected: usize,

    /// Seed for every random draw; fresh entropy when `None`.
    pub seed: Option<u64>,

    /// Fixed expert-mode characters; drawn at random when `None`.
    pub characters: Option<Vec<CharacterId>>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            expert: false,
            reconnect_grace: Duration::from_secs(60),
            min_connected: 2,
            seed: None,
            characters: None,
        }
    }
}

impl MatchConfig {
    /// The rule-engine options this config carries.
    pub fn game_options(&self) -> GameOptions {
        GameOptions {
            expert: self.expert,
            characters: self.characters.clone(),
            seed: self.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchState
// ---------------------------------------------------------------------------

/// The lifecycle state of a match.
///
/// ```text
/// WaitingForPlayers → InProgress → Finished
/// ```
///
/// - **WaitingForPlayers**: accepting joins until every seat is taken.
/// - **InProgress**: the phase machine is running.
/// - **Finished**: a winner (or a tie) was announced. Players can still
///   fetch the final board but every action is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    WaitingForPlayers,
    InProgress,
    Finished,
}

impl MatchState {
    /// Returns `true` if the match is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers)
    }

    /// Returns `true` while the phase machine is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
