//! Printed-rule constants and the per-player-count table.

use serde::{Deserialize, Serialize};

use crate::{CharacterId, GameError, GameResult, TowerColor};

/// Islands on the table at the start of a match.
pub const ISLAND_COUNT: usize = 12;

/// A match ends as soon as this few island groups remain.
pub const MIN_ISLAND_GROUPS: usize = 3;

/// Tokens of each category drawn for the initial island placement.
pub const SETUP_TOKENS_PER_CATEGORY: usize = 2;

/// Dining-room seats per category.
pub const DINING_CAPACITY: usize = 10;

/// Coins in the general reserve at the start of an expert match.
pub const COIN_RESERVE: usize = 20;

/// A coin is earned for every this-many tokens of one category seated in
/// the dining room.
pub const COIN_STEP: usize = 3;

/// Character cards drawn for an expert match.
pub const CHARACTERS_PER_MATCH: usize = 3;

/// Everything that depends on how many players sit at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Players in the match.
    pub player_count: usize,
    /// Cloud tiles on the board (one per player).
    pub cloud_count: usize,
    /// Tokens on each cloud after a refill.
    pub cloud_size: usize,
    /// Tokens a player moves out of the entrance each turn.
    pub moves_per_turn: usize,
    /// Entrance bound.
    pub entrance_size: usize,
    /// Towers each player starts with.
    pub towers: usize,
}

impl Rules {
    /// Smallest supported table.
    pub const MIN_PLAYERS: usize = 2;
    /// Largest supported table.
    pub const MAX_PLAYERS: usize = 3;

    /// The rule table for `player_count` players.
    ///
    /// # Errors
    /// [`GameError::Validation`] for unsupported player counts.
    pub fn for_players(player_count: usize) -> GameResult<Self> {
        match player_count {
            2 => Ok(Self {
                player_count,
                cloud_count: 2,
                cloud_size: 3,
                moves_per_turn: 3,
                entrance_size: 7,
                towers: 8,
            }),
            3 => Ok(Self {
                player_count,
                cloud_count: 3,
                cloud_size: 4,
                moves_per_turn: 4,
                entrance_size: 9,
                towers: 6,
            }),
            n => Err(GameError::Validation(format!(
                "unsupported player count {n} (expected {}..={})",
                Self::MIN_PLAYERS,
                Self::MAX_PLAYERS
            ))),
        }
    }

    /// Tower colours in play: one per player.
    pub fn tower_colors(&self) -> &'static [TowerColor] {
        &TowerColor::ALL[..self.player_count]
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            player_count: 2,
            cloud_count: 2,
            cloud_size: 3,
            moves_per_turn: 3,
            entrance_size: 7,
            towers: 8,
        }
    }
}

/// Per-match switches chosen when the match is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    /// Expert variant: coins and character cards.
    pub expert: bool,
    /// Fixed character selection; drawn at random when `None`.
    pub characters: Option<Vec<CharacterId>>,
    /// Seed for every random draw in the match; fresh entropy when `None`.
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_players_two_matches_default() {
        assert_eq!(Rules::for_players(2).unwrap(), Rules::default());
    }

    #[test]
    fn test_for_players_three_has_larger_entrance() {
        let rules = Rules::for_players(3).unwrap();
        assert_eq!(rules.entrance_size, 9);
        assert_eq!(rules.moves_per_turn, rules.cloud_size);
        assert_eq!(rules.tower_colors().len(), 3);
    }

    #[test]
    fn test_for_players_unsupported_is_validation_error() {
        assert!(matches!(
            Rules::for_players(5),
            Err(GameError::Validation(_))
        ));
        assert!(Rules::for_players(1).is_err());
    }
}
