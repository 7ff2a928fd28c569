//! Serializable copy of a match's public state.

use serde::{Deserialize, Serialize};

use crate::{
    CharacterCard, InfluenceCalculator, IslandGroup, Nickname, Player, ProfessorOwnership,
    TokenContainer,
};

/// Everything a client needs to draw the table, sent after each change and
/// to a player who reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub players: Vec<Player>,
    pub turn_order: Vec<Nickname>,
    pub islands: Vec<IslandGroup>,
    /// Index into `islands`.
    pub mother_nature: usize,
    pub clouds: Vec<TokenContainer>,
    pub professors: ProfessorOwnership,
    pub influence: InfluenceCalculator,
    pub characters: Vec<CharacterCard>,
    pub bag_size: usize,
    pub coin_reserve: usize,
}
