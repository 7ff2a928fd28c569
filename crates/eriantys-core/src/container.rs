//! Bounded multisets of tokens and the transfers between them.
//!
//! Tokens are never created or destroyed after the [`Bag`](crate::Bag) is
//! filled: every operation here moves them from one container to another,
//! so the per-category total across the whole game stays at
//! [`TOKENS_PER_CATEGORY`].

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{Category, GameError, GameResult};

/// Tokens of each category in a full game.
pub const TOKENS_PER_CATEGORY: usize = 26;

/// Tokens in a full game, all categories together.
pub const TOTAL_TOKENS: usize = TOKENS_PER_CATEGORY * Category::COUNT;

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// How a container bounds what it can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capacity {
    /// A single bound on the total number of tokens, whatever their
    /// category. Entrances, clouds, islands, the bag.
    Total(usize),

    /// An independent bound for each category, regardless of how full the
    /// other categories are. Dining rooms.
    PerCategory(usize),
}

// ---------------------------------------------------------------------------
// TokenContainer
// ---------------------------------------------------------------------------

/// A bounded multiset of tokens.
///
/// All five categories are always present (possibly at zero). Counts never
/// go negative and never exceed the [`Capacity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenContainer {
    counts: [usize; Category::COUNT],
    capacity: Capacity,
}

impl Default for TokenContainer {
    fn default() -> Self {
        Self::with_capacity(TOTAL_TOKENS)
    }
}

impl TokenContainer {
    /// An empty container holding at most `max` tokens in total.
    pub fn with_capacity(max: usize) -> Self {
        Self {
            counts: [0; Category::COUNT],
            capacity: Capacity::Total(max),
        }
    }

    /// An empty container holding at most `max` tokens of each category.
    pub fn per_category(max: usize) -> Self {
        Self {
            counts: [0; Category::COUNT],
            capacity: Capacity::PerCategory(max),
        }
    }

    /// A container pre-filled with `per_category` tokens of every category.
    ///
    /// Only the bag is built this way: it is where tokens enter the game.
    pub(crate) fn filled(per_category: usize) -> Self {
        Self {
            counts: [per_category; Category::COUNT],
            capacity: Capacity::Total(per_category * Category::COUNT),
        }
    }

    /// Builds a new container holding the tokens of both inputs.
    ///
    /// Used when two islands fuse; the inputs are discarded by the caller,
    /// so the game-wide totals are unchanged.
    pub(crate) fn union(&self, other: &TokenContainer) -> TokenContainer {
        let mut counts = [0; Category::COUNT];
        for (i, slot) in counts.iter_mut().enumerate() {
            *slot = self.counts[i] + other.counts[i];
        }
        TokenContainer {
            counts,
            capacity: Capacity::Total(TOTAL_TOKENS),
        }
    }

    /// How many tokens of `category` are here.
    pub fn quantity(&self, category: Category) -> usize {
        self.counts[category.index()]
    }

    /// How many tokens are here in total.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Returns `true` if the container holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// The container's bound.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// How many more tokens of `category` would fit.
    pub fn remaining_capacity(&self, category: Category) -> usize {
        match self.capacity {
            Capacity::Total(max) => max.saturating_sub(self.total()),
            Capacity::PerCategory(max) => max.saturating_sub(self.quantity(category)),
        }
    }

    /// How many more tokens would fit, all categories together.
    pub fn remaining_total(&self) -> usize {
        match self.capacity {
            Capacity::Total(max) => max.saturating_sub(self.total()),
            Capacity::PerCategory(_) => Category::ALL
                .iter()
                .map(|c| self.remaining_capacity(*c))
                .sum(),
        }
    }

    /// Iterates `(category, count)` pairs in category order.
    pub fn counts(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        Category::ALL.iter().map(|c| (*c, self.quantity(*c)))
    }

    /// Categories with at least one token here.
    pub fn available(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|c| self.quantity(*c) > 0)
            .collect()
    }

    /// Lists every token here, one entry per token, in random order.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Category> {
        let mut tokens: Vec<Category> = self
            .counts()
            .flat_map(|(c, n)| std::iter::repeat_n(c, n))
            .collect();
        tokens.shuffle(rng);
        tokens
    }

    /// Moves one token of `category` into `dest`.
    ///
    /// # Errors
    /// [`GameError::NoMovement`] if there is no such token here or `dest`
    /// has no room for it. Nothing moves in that case.
    pub fn move_one(&mut self, dest: &mut TokenContainer, category: Category) -> GameResult<()> {
        if self.quantity(category) == 0 || dest.remaining_capacity(category) == 0 {
            return Err(GameError::NoMovement);
        }
        self.counts[category.index()] -= 1;
        dest.counts[category.index()] += 1;
        Ok(())
    }

    /// Moves `amount` tokens into `dest`, one at a time, each time picking
    /// uniformly among the categories that are both present here and still
    /// fit in `dest`.
    ///
    /// # Errors
    /// [`GameError::NoMovement`] as soon as no category qualifies. Tokens
    /// moved before that point stay moved.
    pub fn move_many<R: Rng + ?Sized>(
        &mut self,
        dest: &mut TokenContainer,
        amount: usize,
        rng: &mut R,
    ) -> GameResult<()> {
        for _ in 0..amount {
            let movable: Vec<Category> = Category::ALL
                .iter()
                .copied()
                .filter(|c| self.quantity(*c) > 0 && dest.remaining_capacity(*c) > 0)
                .collect();
            let category = *movable.choose(rng).ok_or(GameError::NoMovement)?;
            self.move_one(dest, category)?;
        }
        Ok(())
    }

    /// Moves as many tokens as fit into `dest`, category by category.
    ///
    /// # Errors
    /// [`GameError::NoMovement`] if some category could not be fully
    /// drained. The partial move is still performed.
    pub fn move_all(&mut self, dest: &mut TokenContainer) -> GameResult<()> {
        let mut drained = true;
        for category in Category::ALL.iter().copied() {
            let here = self.quantity(category);
            let fits = dest.remaining_capacity(category).min(here);
            self.counts[category.index()] -= fits;
            dest.counts[category.index()] += fits;
            if fits < here {
                drained = false;
            }
        }
        if drained {
            Ok(())
        } else {
            Err(GameError::NoMovement)
        }
    }

    /// Tops this container up to its total capacity with random tokens
    /// drawn from `source`.
    ///
    /// # Errors
    /// [`GameError::NoMovement`] if `source` runs out first; whatever was
    /// drawn stays here.
    pub fn refill_from<R: Rng + ?Sized>(
        &mut self,
        source: &mut TokenContainer,
        rng: &mut R,
    ) -> GameResult<()> {
        let missing = self.remaining_total();
        source.move_many(self, missing, rng)
    }

    /// Exchanges one `mine` token from here with one `theirs` token from
    /// `other`, atomically.
    ///
    /// Both sides' bounds are checked before anything changes. Swapping a
    /// category for itself is a no-op once both sides are known to hold
    /// it.
    ///
    /// # Errors
    /// - [`GameError::NoMovement`] if either token is missing.
    /// - [`GameError::Validation`] if the exchange would overflow either
    ///   side's per-category bound.
    pub fn swap(
        &mut self,
        other: &mut TokenContainer,
        mine: Category,
        theirs: Category,
    ) -> GameResult<()> {
        if self.quantity(mine) == 0 || other.quantity(theirs) == 0 {
            return Err(GameError::NoMovement);
        }
        if mine == theirs {
            return Ok(());
        }
        // Totals are unchanged by a swap, so only per-category bounds can
        // be exceeded: `self` gains `theirs`, `other` gains `mine`.
        if !self.fits_after_swap(theirs) || !other.fits_after_swap(mine) {
            return Err(GameError::Validation(format!(
                "swapping {mine} for {theirs} would overflow a container"
            )));
        }
        self.counts[mine.index()] -= 1;
        self.counts[theirs.index()] += 1;
        other.counts[theirs.index()] -= 1;
        other.counts[mine.index()] += 1;
        Ok(())
    }

    fn fits_after_swap(&self, incoming: Category) -> bool {
        match self.capacity {
            Capacity::Total(_) => true,
            Capacity::PerCategory(max) => self.quantity(incoming) < max,
        }
    }
}
