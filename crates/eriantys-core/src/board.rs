//! The shared board: bag, islands, Mother Nature and clouds.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rules::{ISLAND_COUNT, SETUP_TOKENS_PER_CATEGORY};
use crate::{Bag, GameError, GameResult, IslandGroup, TokenContainer};

/// Everything on the table that no single player owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    bag: Bag,
    /// Current island groups in table order. Only ever shrinks.
    islands: Vec<IslandGroup>,
    /// Index into `islands`. Always valid.
    mother_nature: usize,
    clouds: Vec<TokenContainer>,
}

impl Board {
    /// A fresh board: full bag, twelve empty islands, empty clouds.
    pub fn new(cloud_count: usize, cloud_size: usize) -> Self {
        let islands = (0..ISLAND_COUNT)
            .map(|i| IslandGroup::new(i as u8))
            .collect();
        Self {
            bag: Bag::full(),
            islands,
            mother_nature: 0,
            clouds: (0..cloud_count)
                .map(|_| TokenContainer::with_capacity(cloud_size))
                .collect(),
        }
    }

    /// Places Mother Nature on a random island and seeds every other
    /// island, except the one opposite her, with one token from a balanced
    /// setup draw.
    pub fn setup<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameResult<()> {
        let count = self.islands.len();
        self.mother_nature = rng.random_range(0..count);
        let opposite = (self.mother_nature + count / 2) % count;

        let (mut pool, order) = self.bag.draw_setup(SETUP_TOKENS_PER_CATEGORY, rng)?;
        let mut order = order.into_iter();

        for (idx, island) in self.islands.iter_mut().enumerate() {
            if idx == self.mother_nature || idx == opposite {
                continue;
            }
            let category = order.next().ok_or_else(|| {
                GameError::IllegalState("setup draw ran out of tokens".into())
            })?;
            pool.move_one(island.tokens_mut(), category)?;
        }

        if !pool.is_empty() {
            return Err(GameError::IllegalState(format!(
                "{} setup tokens left undistributed",
                pool.total()
            )));
        }

        tracing::debug!(mother_nature = self.mother_nature, "board set up");
        Ok(())
    }

    /// The token reservoir.
    pub fn bag(&self) -> &Bag {
        &self.bag
    }

    /// Mutable access to the reservoir.
    pub fn bag_mut(&mut self) -> &mut Bag {
        &mut self.bag
    }

    /// Island groups in table order.
    pub fn islands(&self) -> &[IslandGroup] {
        &self.islands
    }

    /// Position of the group with the given id.
    ///
    /// # Errors
    /// [`GameError::NotFound`] for ids that never existed or were merged
    /// into a composite.
    pub fn island_index(&self, id: &str) -> GameResult<usize> {
        self.islands
            .iter()
            .position(|i| i.id() == id)
            .ok_or_else(|| GameError::NotFound(format!("island {id}")))
    }

    /// The group with the given id.
    pub fn island(&self, id: &str) -> GameResult<&IslandGroup> {
        let idx = self.island_index(id)?;
        Ok(&self.islands[idx])
    }

    pub(crate) fn island_mut(&mut self, id: &str) -> GameResult<&mut IslandGroup> {
        let idx = self.island_index(id)?;
        Ok(&mut self.islands[idx])
    }

    pub(crate) fn island_at(&self, idx: usize) -> GameResult<&IslandGroup> {
        self.islands
            .get(idx)
            .ok_or_else(|| GameError::NotFound(format!("island #{idx}")))
    }

    pub(crate) fn island_at_mut(&mut self, idx: usize) -> GameResult<&mut IslandGroup> {
        self.islands
            .get_mut(idx)
            .ok_or_else(|| GameError::NotFound(format!("island #{idx}")))
    }

    /// Index of the group Mother Nature stands on.
    pub fn mother_nature(&self) -> usize {
        self.mother_nature
    }

    /// Clockwise steps from Mother Nature to the group at `idx`.
    pub fn distance_to(&self, idx: usize) -> usize {
        let count = self.islands.len();
        (idx + count - self.mother_nature % count) % count
    }

    pub(crate) fn move_mother_nature(&mut self, idx: usize) {
        self.mother_nature = idx;
    }

    /// The cloud tiles.
    pub fn clouds(&self) -> &[TokenContainer] {
        &self.clouds
    }

    pub(crate) fn cloud_mut(&mut self, index: usize) -> GameResult<&mut TokenContainer> {
        self.clouds
            .get_mut(index)
            .ok_or_else(|| GameError::NotFound(format!("cloud {index}")))
    }

    /// Tops every cloud up from the bag.
    ///
    /// Returns `false` if the bag could not fill them all; the shortfall is
    /// logged and whatever was drawn stays on the clouds.
    pub fn refill_clouds<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let mut complete = true;
        for (index, cloud) in self.clouds.iter_mut().enumerate() {
            if let Err(e) = cloud.refill_from(self.bag.tokens_mut(), rng) {
                tracing::warn!(
                    cloud = index,
                    filled = cloud.total(),
                    error = %e,
                    "bag could not fill cloud"
                );
                complete = false;
            }
        }
        complete
    }

    /// Fuses the group `target_id` with its neighbours if they share its
    /// controller: first the previous group, then the next one relative to
    /// the (possibly new) position. Uncontrolled groups never fuse.
    ///
    /// Returns the id of the group that now contains `target_id`.
    pub fn unify(&mut self, target_id: &str) -> GameResult<String> {
        let mut idx = self.island_index(target_id)?;
        let Some(controller) = self.islands[idx].controller().cloned() else {
            return Ok(target_id.to_string());
        };

        if self.islands.len() > 1 {
            let prev = (idx + self.islands.len() - 1) % self.islands.len();
            if self.islands[prev].controller() == Some(&controller) {
                idx = self.merge_pair(prev, idx)?;
            }
        }

        if self.islands.len() > 1 {
            let next = (idx + 1) % self.islands.len();
            if self.islands[next].controller() == Some(&controller) {
                idx = self.merge_pair(idx, next)?;
            }
        }

        Ok(self.islands[idx].id().to_string())
    }

    /// Replaces the neighbours `first` (earlier in table order) and
    /// `second` by their composite. Returns the composite's index.
    fn merge_pair(&mut self, first: usize, second: usize) -> GameResult<usize> {
        let composite = IslandGroup::merge(&self.islands[first], &self.islands[second])?;
        let keep = first.min(second);
        let drop = first.max(second);

        tracing::info!(
            first = self.islands[first].id(),
            second = self.islands[second].id(),
            merged = composite.id(),
            "islands merged"
        );

        self.islands[keep] = composite;
        self.islands.remove(drop);

        if self.mother_nature == drop {
            self.mother_nature = keep;
        } else if self.mother_nature > drop {
            self.mother_nature -= 1;
        }
        Ok(keep)
    }
}
