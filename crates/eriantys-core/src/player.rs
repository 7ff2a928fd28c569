//! Players, their identity, and their hand of assistant cards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::DINING_CAPACITY;
use crate::{Category, GameError, GameResult, Rules, TokenContainer};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player's nickname: the unique key for a player within a match and
/// across the server directory.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Nickname(String);

impl Nickname {
    /// Wraps a nickname.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The nickname as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Nickname {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Nickname {
    fn from(name: String) -> Self {
        Self(name)
    }
}

literal_enum! {
    /// Tower colour a player picks during setup.
    pub enum TowerColor as "tower colour" {
        White => "white",
        Black => "black",
        Grey => "grey",
    }
}

literal_enum! {
    /// Wizard (assistant deck back) a player picks during setup.
    pub enum Wizard as "wizard" {
        Druid => "druid",
        King => "king",
        Witch => "witch",
        Sage => "sage",
    }
}

// ---------------------------------------------------------------------------
// AssistantCard
// ---------------------------------------------------------------------------

/// An assistant card. Its value orders the turn; half of it, rounded up,
/// is how far Mother Nature may travel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssistantCard(u8);

impl AssistantCard {
    /// Lowest card value.
    pub const MIN_VALUE: u8 = 1;
    /// Highest card value.
    pub const MAX_VALUE: u8 = 10;

    /// The card with the given value.
    ///
    /// # Errors
    /// [`GameError::Validation`] if `value` is outside `1..=10`.
    pub fn new(value: u8) -> GameResult<Self> {
        if (Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GameError::Validation(format!(
                "assistant card {value} does not exist"
            )))
        }
    }

    /// The turn-order value.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Mother-Nature steps this card allows.
    pub fn movement(self) -> usize {
        usize::from(self.0).div_ceil(2)
    }

    /// A fresh ten-card hand.
    pub fn full_hand() -> Vec<AssistantCard> {
        (Self::MIN_VALUE..=Self::MAX_VALUE).map(AssistantCard).collect()
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    nickname: Nickname,
    tower_color: Option<TowerColor>,
    wizard: Option<Wizard>,
    entrance: TokenContainer,
    dining: TokenContainer,
    towers: usize,
    coins: usize,
    hand: Vec<AssistantCard>,
    played: Option<AssistantCard>,
    movement_bonus: usize,
    connected: bool,
}

impl Player {
    /// A player with an empty entrance and dining room, a full hand and a
    /// full stock of towers.
    pub fn new(nickname: Nickname, rules: &Rules) -> Self {
        Self {
            nickname,
            tower_color: None,
            wizard: None,
            entrance: TokenContainer::with_capacity(rules.entrance_size),
            dining: TokenContainer::per_category(DINING_CAPACITY),
            towers: rules.towers,
            coins: 0,
            hand: AssistantCard::full_hand(),
            played: None,
            movement_bonus: 0,
            connected: true,
        }
    }

    /// The player's nickname.
    pub fn nickname(&self) -> &Nickname {
        &self.nickname
    }

    /// Chosen tower colour, once setup is done.
    pub fn tower_color(&self) -> Option<TowerColor> {
        self.tower_color
    }

    /// Chosen wizard, once setup is done.
    pub fn wizard(&self) -> Option<Wizard> {
        self.wizard
    }

    /// Returns `true` once both tower colour and wizard are chosen.
    pub fn has_completed_setup(&self) -> bool {
        self.tower_color.is_some() && self.wizard.is_some()
    }

    /// Tokens waiting to be moved this turn.
    pub fn entrance(&self) -> &TokenContainer {
        &self.entrance
    }

    /// Seated tokens, ten seats per category.
    pub fn dining(&self) -> &TokenContainer {
        &self.dining
    }

    /// Towers not yet on an island.
    pub fn towers(&self) -> usize {
        self.towers
    }

    /// Coins held (expert matches only).
    pub fn coins(&self) -> usize {
        self.coins
    }

    /// Assistant cards still in hand.
    pub fn hand(&self) -> &[AssistantCard] {
        &self.hand
    }

    /// The assistant card played this round, if any.
    pub fn played(&self) -> Option<AssistantCard> {
        self.played
    }

    /// Mother-Nature steps allowed this turn.
    pub fn movement_allowance(&self) -> usize {
        self.played.map_or(0, AssistantCard::movement) + self.movement_bonus
    }

    /// Whether the player currently has a live connection.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn entrance_mut(&mut self) -> &mut TokenContainer {
        &mut self.entrance
    }

    pub(crate) fn dining_mut(&mut self) -> &mut TokenContainer {
        &mut self.dining
    }

    /// Moves one token from the entrance to its dining-room row.
    pub(crate) fn seat(&mut self, category: Category) -> GameResult<()> {
        self.entrance.move_one(&mut self.dining, category)
    }

    /// Entrance and dining room, borrowed together.
    pub(crate) fn rooms_mut(&mut self) -> (&mut TokenContainer, &mut TokenContainer) {
        (&mut self.entrance, &mut self.dining)
    }

    pub(crate) fn choose(&mut self, tower: TowerColor, wizard: Wizard) {
        self.tower_color = Some(tower);
        self.wizard = Some(wizard);
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn add_coins(&mut self, coins: usize) {
        self.coins += coins;
    }

    pub(crate) fn spend_coins(&mut self, coins: usize) -> GameResult<()> {
        if self.coins < coins {
            return Err(GameError::Validation(format!(
                "{} has {} coins, {} needed",
                self.nickname, self.coins, coins
            )));
        }
        self.coins -= coins;
        Ok(())
    }

    /// Takes back `count` towers from the board.
    pub(crate) fn return_towers(&mut self, count: usize) {
        self.towers += count;
    }

    /// Places up to `count` towers; returns how many were actually placed.
    pub(crate) fn place_towers(&mut self, count: usize) -> usize {
        let placed = count.min(self.towers);
        self.towers -= placed;
        placed
    }

    /// Moves `card` from the hand to the table.
    pub(crate) fn play(&mut self, card: AssistantCard) -> GameResult<()> {
        let pos = self
            .hand
            .iter()
            .position(|c| *c == card)
            .ok_or_else(|| {
                GameError::Validation(format!(
                    "{} does not hold assistant card {}",
                    self.nickname,
                    card.value()
                ))
            })?;
        self.hand.remove(pos);
        self.played = Some(card);
        Ok(())
    }

    pub(crate) fn clear_played(&mut self) {
        self.played = None;
    }

    pub(crate) fn set_movement_bonus(&mut self, bonus: usize) {
        self.movement_bonus = bonus;
    }
}
