//! Island groups: one or more fused islands sharing a controller.

use serde::{Deserialize, Serialize};

use crate::{GameError, GameResult, Nickname, TokenContainer};

/// Separator between component ids in a composite island id.
const ID_SEPARATOR: char = '-';

/// One placement on the board: a single island, or several fused ones.
///
/// An island group is never mutated into a bigger one. Fusing builds a new
/// composite with [`IslandGroup::merge`] and the board swaps it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandGroup {
    id: String,
    components: Vec<u8>,
    tokens: TokenContainer,
    controller: Option<Nickname>,
    /// No-entry tiles, oldest first. Never holds the same tile twice.
    no_entry: Vec<u8>,
}

impl IslandGroup {
    /// A single, uncontrolled, empty island.
    pub fn new(component: u8) -> Self {
        Self {
            id: component.to_string(),
            components: vec![component],
            tokens: TokenContainer::default(),
            controller: None,
            no_entry: Vec::new(),
        }
    }

    /// Fuses two groups into a new composite.
    ///
    /// The composite's component list is `first`'s followed by `second`'s;
    /// its tokens and no-entry tiles are the union of both.
    ///
    /// # Errors
    /// - [`GameError::Validation`] if the controllers differ.
    /// - [`GameError::IllegalState`] if both carry the same no-entry tile.
    pub fn merge(first: &IslandGroup, second: &IslandGroup) -> GameResult<IslandGroup> {
        if first.controller != second.controller {
            return Err(GameError::Validation(format!(
                "islands {} and {} have different controllers",
                first.id, second.id
            )));
        }

        let components: Vec<u8> = first
            .components
            .iter()
            .chain(second.components.iter())
            .copied()
            .collect();
        let id = components
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(&ID_SEPARATOR.to_string());

        let mut merged = IslandGroup {
            id,
            components,
            tokens: first.tokens.union(&second.tokens),
            controller: first.controller.clone(),
            no_entry: first.no_entry.clone(),
        };
        for tile in &second.no_entry {
            merged.add_no_entry(*tile)?;
        }
        Ok(merged)
    }

    /// The group's id: component ids joined with `-`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Component island ids, in board order.
    pub fn components(&self) -> &[u8] {
        &self.components
    }

    /// Number of fused islands.
    pub fn size(&self) -> usize {
        self.components.len()
    }

    /// Tokens placed on the group.
    pub fn tokens(&self) -> &TokenContainer {
        &self.tokens
    }

    /// Mutable access for transfers onto the group.
    pub fn tokens_mut(&mut self) -> &mut TokenContainer {
        &mut self.tokens
    }

    /// The player whose towers stand here.
    pub fn controller(&self) -> Option<&Nickname> {
        self.controller.as_ref()
    }

    /// Towers standing here: one per component while controlled.
    pub fn tower_count(&self) -> usize {
        if self.controller.is_some() {
            self.components.len()
        } else {
            0
        }
    }

    /// No-entry tiles on the group, oldest first.
    pub fn no_entry_tiles(&self) -> &[u8] {
        &self.no_entry
    }

    /// Places a no-entry tile.
    ///
    /// # Errors
    /// [`GameError::IllegalState`] if the tile is already here.
    pub fn add_no_entry(&mut self, tile: u8) -> GameResult<()> {
        if self.no_entry.contains(&tile) {
            return Err(GameError::IllegalState(format!(
                "no-entry tile {tile} already on island {}",
                self.id
            )));
        }
        self.no_entry.push(tile);
        Ok(())
    }

    /// Removes the most recently placed no-entry tile.
    pub fn take_no_entry(&mut self) -> Option<u8> {
        self.no_entry.pop()
    }

    pub(crate) fn set_controller(&mut self, controller: Option<Nickname>) {
        self.controller = controller;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    fn island(component: u8, controller: Option<&str>) -> IslandGroup {
        let mut i = IslandGroup::new(component);
        i.set_controller(controller.map(Nickname::from));
        i
    }

    #[test]
    fn test_merge_different_controllers_is_refused() {
        let a = island(1, Some("ada"));
        let b = island(2, Some("bob"));
        assert!(matches!(
            IslandGroup::merge(&a, &b),
            Err(GameError::Validation(_))
        ));
    }

    #[test]
    fn test_merge_controlled_with_uncontrolled_is_refused() {
        let a = island(1, Some("ada"));
        let b = island(2, None);
        assert!(IslandGroup::merge(&a, &b).is_err());
    }

    #[test]
    fn test_merge_preserves_order_tokens_and_towers() {
        let mut a = IslandGroup::merge(
            &island(3, Some("ada")),
            &island(4, Some("ada")),
        )
        .unwrap();
        let mut b = island(5, Some("ada"));
        let mut bag = crate::Bag::full();
        bag.tokens_mut()
            .move_one(a.tokens_mut(), Category::Red)
            .unwrap();
        bag.tokens_mut()
            .move_one(b.tokens_mut(), Category::Red)
            .unwrap();
        bag.tokens_mut()
            .move_one(b.tokens_mut(), Category::Blue)
            .unwrap();

        let merged = IslandGroup::merge(&a, &b).unwrap();

        assert_eq!(merged.components(), &[3, 4, 5]);
        assert_eq!(merged.id(), "3-4-5");
        assert_eq!(merged.tokens().quantity(Category::Red), 2);
        assert_eq!(merged.tokens().quantity(Category::Blue), 1);
        assert_eq!(merged.tower_count(), a.tower_count() + b.tower_count());
        assert_eq!(merged.controller(), Some(&Nickname::from("ada")));
    }

    #[test]
    fn test_merge_unions_no_entry_tiles() {
        let mut a = island(0, Some("ada"));
        let mut b = island(1, Some("ada"));
        a.add_no_entry(2).unwrap();
        b.add_no_entry(0).unwrap();

        let merged = IslandGroup::merge(&a, &b).unwrap();
        assert_eq!(merged.no_entry_tiles(), &[2, 0]);
    }

    #[test]
    fn test_add_no_entry_duplicate_is_illegal_state() {
        let mut a = island(0, None);
        a.add_no_entry(1).unwrap();
        assert!(matches!(
            a.add_no_entry(1),
            Err(GameError::IllegalState(_))
        ));
        assert_eq!(a.take_no_entry(), Some(1));
        assert_eq!(a.take_no_entry(), None);
    }

    #[test]
    fn test_tower_count_zero_when_uncontrolled() {
        assert_eq!(island(0, None).tower_count(), 0);
        assert_eq!(island(0, Some("ada")).tower_count(), 1);
    }
}
