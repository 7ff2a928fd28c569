//! Character cards: paid abilities with a one-time cost increase.
//!
//! A card is plain state (cost flag, optional token reservoir, optional
//! no-entry tiles). What a card *does* lives in
//! [`GameManager::play_character`](crate::GameManager::play_character).

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::rules::CHARACTERS_PER_MATCH;
use crate::{Bag, Category, GameError, GameResult, TokenContainer};

literal_enum! {
    /// The twelve character cards.
    pub enum CharacterId as "character" {
        Monk => "monk",
        Farmer => "farmer",
        Herald => "herald",
        Messenger => "messenger",
        Herbalist => "herbalist",
        Centaur => "centaur",
        Jester => "jester",
        Knight => "knight",
        Mushroomer => "mushroomer",
        Minstrel => "minstrel",
        Princess => "princess",
        Thief => "thief",
    }
}

impl CharacterId {
    /// Coins needed for the first activation.
    pub fn initial_cost(self) -> usize {
        match self {
            CharacterId::Monk
            | CharacterId::Messenger
            | CharacterId::Jester
            | CharacterId::Minstrel => 1,
            CharacterId::Farmer
            | CharacterId::Herbalist
            | CharacterId::Knight
            | CharacterId::Princess => 2,
            CharacterId::Herald
            | CharacterId::Centaur
            | CharacterId::Mushroomer
            | CharacterId::Thief => 3,
        }
    }

    /// Tokens the card holds, drawn from the bag at setup.
    pub fn reservoir_size(self) -> usize {
        match self {
            CharacterId::Monk | CharacterId::Princess => 4,
            CharacterId::Jester => 6,
            _ => 0,
        }
    }

    /// No-entry tiles the card starts with.
    pub fn no_entry_tiles(self) -> u8 {
        match self {
            CharacterId::Herbalist => 4,
            _ => 0,
        }
    }

    /// Draws the cards for one expert match.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Vec<CharacterId> {
        CharacterId::ALL
            .choose_multiple(rng, CHARACTERS_PER_MATCH)
            .copied()
            .collect()
    }
}

/// Arguments for a character activation.
///
/// Which fields a card needs:
/// - Monk: `category`, `island`.
/// - Herald, Herbalist: `island`.
/// - Mushroomer, Princess, Thief: `category`.
/// - Jester: `from` (on the card) and `to` (in the entrance), equal length,
///   at most 3.
/// - Minstrel: `from` (in the entrance) and `to` (in the dining room),
///   equal length, at most 2.
/// - everything else: nothing.
///
/// Any field a card does not use must be left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterParams {
    pub island: Option<String>,
    pub category: Option<Category>,
    pub from: Vec<Category>,
    pub to: Vec<Category>,
}

impl CharacterParams {
    /// Parameters for a card that takes none.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parameters naming an island.
    pub fn island(id: impl Into<String>) -> Self {
        Self {
            island: Some(id.into()),
            ..Self::default()
        }
    }

    /// Parameters naming a category.
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Parameters for a swapping card.
    pub fn swaps(from: Vec<Category>, to: Vec<Category>) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    /// Checks that exactly the listed fields are present.
    pub(crate) fn expect(
        &self,
        card: CharacterId,
        island: bool,
        category: bool,
        max_swaps: usize,
    ) -> GameResult<()> {
        let fail = |what: &str| {
            Err(GameError::Validation(format!("{card}: {what}")))
        };
        match (island, &self.island) {
            (true, None) => return fail("an island is required"),
            (false, Some(_)) => return fail("takes no island"),
            _ => {}
        }
        match (category, self.category) {
            (true, None) => return fail("a category is required"),
            (false, Some(_)) => return fail("takes no category"),
            _ => {}
        }
        if self.from.len() != self.to.len() {
            return fail("swap lists must have the same length");
        }
        if max_swaps == 0 && !self.from.is_empty() {
            return fail("takes no swaps");
        }
        if max_swaps > 0 && (self.from.is_empty() || self.from.len() > max_swaps) {
            return fail(&format!("between 1 and {max_swaps} swaps are required"));
        }
        Ok(())
    }
}

/// One character card on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCard {
    id: CharacterId,
    increased_cost: bool,
    tokens: Option<TokenContainer>,
    no_entry: Vec<u8>,
}

impl CharacterCard {
    /// A fresh card: base cost, empty reservoir, full set of no-entry
    /// tiles.
    pub fn new(id: CharacterId) -> Self {
        let size = id.reservoir_size();
        Self {
            id,
            increased_cost: false,
            tokens: (size > 0).then(|| TokenContainer::with_capacity(size)),
            no_entry: (0..id.no_entry_tiles()).collect(),
        }
    }

    /// Which card this is.
    pub fn id(&self) -> CharacterId {
        self.id
    }

    /// Coins needed to activate the card now.
    pub fn cost(&self) -> usize {
        self.id.initial_cost() + usize::from(self.increased_cost)
    }

    /// Returns `true` once the card has been activated at least once.
    pub fn has_increased_cost(&self) -> bool {
        self.increased_cost
    }

    /// Tokens on the card, for reservoir cards.
    pub fn tokens(&self) -> Option<&TokenContainer> {
        self.tokens.as_ref()
    }

    /// No-entry tiles still on the card.
    pub fn no_entry_tiles(&self) -> &[u8] {
        &self.no_entry
    }

    /// One-time fill of the card's reservoir from the bag.
    pub fn setup_effect<R: Rng + ?Sized>(&mut self, bag: &mut Bag, rng: &mut R) -> GameResult<()> {
        if let Some(tokens) = self.tokens.as_mut() {
            tokens.refill_from(bag.tokens_mut(), rng)?;
        }
        Ok(())
    }

    pub(crate) fn tokens_mut(&mut self) -> GameResult<&mut TokenContainer> {
        let id = self.id;
        self.tokens.as_mut().ok_or_else(|| {
            GameError::IllegalState(format!("{id} holds no tokens"))
        })
    }

    /// Takes the lowest-numbered tile off the card.
    pub(crate) fn take_no_entry(&mut self) -> GameResult<u8> {
        if self.no_entry.is_empty() {
            return Err(GameError::Validation(format!(
                "{} has no no-entry tiles left",
                self.id
            )));
        }
        Ok(self.no_entry.remove(0))
    }

    /// Puts a tile back on the card.
    pub(crate) fn return_no_entry(&mut self, tile: u8) -> GameResult<()> {
        if self.no_entry.contains(&tile) {
            return Err(GameError::IllegalState(format!(
                "no-entry tile {tile} is already on {}",
                self.id
            )));
        }
        self.no_entry.push(tile);
        self.no_entry.sort_unstable();
        Ok(())
    }

    /// Records a successful activation. Returns `true` the first time,
    /// when the cost goes up.
    pub(crate) fn mark_used(&mut self) -> bool {
        !std::mem::replace(&mut self.increased_cost, true)
    }
}
