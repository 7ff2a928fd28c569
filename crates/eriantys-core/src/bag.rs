//! The token reservoir.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::container::{TOKENS_PER_CATEGORY, TokenContainer};
use crate::{Category, GameResult};

/// The bag every token starts in.
///
/// A [`TokenContainer`] whose bound is the whole token supply. Clouds,
/// entrances and card reservoirs are refilled from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    tokens: TokenContainer,
}

impl Bag {
    /// A bag holding the full supply: 26 tokens of every category.
    pub fn full() -> Self {
        Self {
            tokens: TokenContainer::filled(TOKENS_PER_CATEGORY),
        }
    }

    /// Read access to the bag's contents.
    pub fn tokens(&self) -> &TokenContainer {
        &self.tokens
    }

    /// Mutable access, for transfers in and out of the bag.
    pub fn tokens_mut(&mut self) -> &mut TokenContainer {
        &mut self.tokens
    }

    /// Tokens left in the bag.
    pub fn len(&self) -> usize {
        self.tokens.total()
    }

    /// Returns `true` once the bag has been drawn dry.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Draws the balanced setup pool: exactly `per_category` tokens of
    /// every category, moved out of the bag into a fresh container.
    ///
    /// The caller distributes the pool in random order with
    /// [`TokenContainer::shuffled`].
    pub fn draw_setup<R: Rng + ?Sized>(
        &mut self,
        per_category: usize,
        rng: &mut R,
    ) -> GameResult<(TokenContainer, Vec<Category>)> {
        let mut pool = TokenContainer::with_capacity(per_category * Category::COUNT);
        for category in Category::ALL.iter().copied() {
            for _ in 0..per_category {
                self.tokens.move_one(&mut pool, category)?;
            }
        }
        let order = pool.shuffled(rng);
        Ok((pool, order))
    }
}
