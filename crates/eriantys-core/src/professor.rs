//! Per-category professor ownership.

use serde::{Deserialize, Serialize};

use crate::{Category, Nickname, Player};

/// How a dining-room tie between challenger and owner is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The challenger needs strictly more tokens.
    #[default]
    Strict,
    /// An equal count is enough for the challenger.
    FavorChallenger,
}

impl TieBreak {
    /// Returns `true` if a challenger with `challenger` tokens takes the
    /// professor from an owner with `owner` tokens.
    pub fn challenger_wins(self, challenger: usize, owner: usize) -> bool {
        match self {
            TieBreak::Strict => challenger > owner,
            TieBreak::FavorChallenger => challenger >= owner,
        }
    }
}

/// Which player controls each category's professor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorOwnership {
    owners: [Option<Nickname>; Category::COUNT],
    tie_break: TieBreak,
}

impl ProfessorOwnership {
    /// No professor owned, strict tie-break.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current owner of `category`'s professor.
    pub fn owner(&self, category: Category) -> Option<&Nickname> {
        self.owners[category.index()].as_ref()
    }

    /// Returns `true` if `nickname` owns `category`'s professor.
    pub fn owns(&self, nickname: &Nickname, category: Category) -> bool {
        self.owner(category) == Some(nickname)
    }

    /// Number of professors held by `nickname`.
    pub fn count_owned(&self, nickname: &Nickname) -> usize {
        self.owners
            .iter()
            .filter(|o| o.as_ref() == Some(nickname))
            .count()
    }

    /// The active tie-break rule.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Lets ties go to the challenger until [`deactivate_effect`] runs.
    ///
    /// [`deactivate_effect`]: ProfessorOwnership::deactivate_effect
    pub fn activate_effect(&mut self) {
        self.tie_break = TieBreak::FavorChallenger;
    }

    /// Restores the strict rule.
    pub fn deactivate_effect(&mut self) {
        self.tie_break = TieBreak::Strict;
    }

    /// Re-evaluates `categories` after `challenger` changed their dining
    /// room. Each category is settled on its own.
    ///
    /// A challenger with no token of a category never takes its professor.
    pub fn update(&mut self, categories: &[Category], challenger: &Nickname, players: &[Player]) {
        let count_of = |who: &Nickname, category: Category| {
            players
                .iter()
                .find(|p| p.nickname() == who)
                .map_or(0, |p| p.dining().quantity(category))
        };

        for category in categories.iter().copied() {
            let challenger_count = count_of(challenger, category);
            let slot = &mut self.owners[category.index()];
            let takes = match slot.as_ref() {
                Some(owner) if owner == challenger => false,
                Some(owner) => {
                    challenger_count > 0
                        && self
                            .tie_break
                            .challenger_wins(challenger_count, count_of(owner, category))
                }
                None => challenger_count > 0,
            };
            if takes {
                tracing::debug!(
                    %category,
                    owner = %challenger,
                    "professor changed hands"
                );
                *slot = Some(challenger.clone());
            }
        }
    }

    /// Drops every professor whose owner no longer has a token of its
    /// category, then hands it to the player with a unique maximum.
    ///
    /// Used after an effect removes tokens from several dining rooms.
    pub fn recompute(&mut self, categories: &[Category], players: &[Player]) {
        for category in categories.iter().copied() {
            let slot = &mut self.owners[category.index()];
            let owner_count = slot.as_ref().map_or(0, |owner| {
                players
                    .iter()
                    .find(|p| p.nickname() == owner)
                    .map_or(0, |p| p.dining().quantity(category))
            });

            let best = players
                .iter()
                .map(|p| (p.nickname(), p.dining().quantity(category)))
                .max_by_key(|(_, n)| *n);
            let Some((leader, leader_count)) = best else {
                continue;
            };
            let unique = players
                .iter()
                .filter(|p| p.dining().quantity(category) == leader_count)
                .count()
                == 1;

            if leader_count == 0 {
                *slot = None;
            } else if leader_count > owner_count && unique {
                *slot = Some(leader.clone());
            } else if owner_count == 0 {
                *slot = None;
            }
        }
    }
}
