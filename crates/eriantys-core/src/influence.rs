//! Influence scoring strategies.

use serde::{Deserialize, Serialize};

use crate::{Category, IslandGroup, Nickname, ProfessorOwnership};

/// How a player's influence on an island is counted.
///
/// [`GameManager`](crate::GameManager) holds exactly one active variant.
/// Character cards install a non-base variant for the rest of the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfluenceCalculator {
    /// Tokens of owned-professor categories plus towers.
    #[default]
    Base,
    /// As base, but `category` contributes nothing.
    ExcludeCategory { category: Category },
    /// As base, without the tower term.
    IgnoreTowers,
    /// As base, plus a flat bonus for one player.
    Bonus { player: Nickname, amount: usize },
}

impl InfluenceCalculator {
    /// `player`'s influence on `island`.
    pub fn score(
        &self,
        island: &IslandGroup,
        player: &Nickname,
        professors: &ProfessorOwnership,
    ) -> usize {
        let excluded = match self {
            InfluenceCalculator::ExcludeCategory { category } => Some(*category),
            _ => None,
        };
        let tokens: usize = Category::ALL
            .iter()
            .copied()
            .filter(|c| Some(*c) != excluded && professors.owns(player, *c))
            .map(|c| island.tokens().quantity(c))
            .sum();

        let towers = match self {
            InfluenceCalculator::IgnoreTowers => 0,
            _ if island.controller() == Some(player) => island.tower_count(),
            _ => 0,
        };

        let bonus = match self {
            InfluenceCalculator::Bonus { player: who, amount } if who == player => *amount,
            _ => 0,
        };

        tokens + towers + bonus
    }

    /// The player with the unique highest non-zero score, if any.
    pub fn dominant<'a>(
        &self,
        island: &IslandGroup,
        players: impl IntoIterator<Item = &'a Nickname>,
        professors: &ProfessorOwnership,
    ) -> Option<Nickname> {
        let mut best: Option<(&Nickname, usize)> = None;
        let mut tied = false;
        for player in players {
            let score = self.score(island, player, professors);
            match best {
                Some((_, top)) if score == top => tied = true,
                Some((_, top)) if score < top => {}
                _ => {
                    best = Some((player, score));
                    tied = false;
                }
            }
        }
        match best {
            Some((player, score)) if score > 0 && !tied => Some(player.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bag, Player, Rules};

    struct Fixture {
        island: IslandGroup,
        professors: ProfessorOwnership,
        ada: Nickname,
        bob: Nickname,
    }

    /// Island with 2 red and 1 blue; ada owns red and controls the island,
    /// bob owns blue.
    fn fixture() -> Fixture {
        let ada = Nickname::from("ada");
        let bob = Nickname::from("bob");
        let rules = Rules::default();
        let mut players = vec![Player::new(ada.clone(), &rules), Player::new(bob.clone(), &rules)];
        let mut bag = Bag::full();

        bag.tokens_mut().move_one(players[0].dining_mut(), Category::Red).unwrap();
        bag.tokens_mut().move_one(players[1].dining_mut(), Category::Blue).unwrap();
        let mut professors = ProfessorOwnership::new();
        professors.update(&[Category::Red], &ada, &players);
        professors.update(&[Category::Blue], &bob, &players);

        let mut island = IslandGroup::new(0);
        for c in [Category::Red, Category::Red, Category::Blue] {
            bag.tokens_mut().move_one(island.tokens_mut(), c).unwrap();
        }
        island.set_controller(Some(ada.clone()));

        Fixture { island, professors, ada, bob }
    }

    #[test]
    fn test_score_base_counts_professors_and_towers() {
        let f = fixture();
        let calc = InfluenceCalculator::Base;
        assert_eq!(calc.score(&f.island, &f.ada, &f.professors), 3);
        assert_eq!(calc.score(&f.island, &f.bob, &f.professors), 1);
    }

    #[test]
    fn test_score_exclude_category_drops_its_tokens() {
        let f = fixture();
        let calc = InfluenceCalculator::ExcludeCategory { category: Category::Red };
        assert_eq!(calc.score(&f.island, &f.ada, &f.professors), 1);
        assert_eq!(calc.score(&f.island, &f.bob, &f.professors), 1);
    }

    #[test]
    fn test_score_ignore_towers_drops_tower_term() {
        let f = fixture();
        let calc = InfluenceCalculator::IgnoreTowers;
        assert_eq!(calc.score(&f.island, &f.ada, &f.professors), 2);
    }

    #[test]
    fn test_score_bonus_only_for_designated_player() {
        let f = fixture();
        let calc = InfluenceCalculator::Bonus { player: f.bob.clone(), amount: 2 };
        assert_eq!(calc.score(&f.island, &f.bob, &f.professors), 3);
        assert_eq!(calc.score(&f.island, &f.ada, &f.professors), 3);
    }

    #[test]
    fn test_dominant_tie_yields_none() {
        let f = fixture();
        let calc = InfluenceCalculator::Bonus { player: f.bob.clone(), amount: 2 };
        assert_eq!(calc.dominant(&f.island, [&f.ada, &f.bob], &f.professors), None);
        assert_eq!(
            InfluenceCalculator::Base.dominant(&f.island, [&f.ada, &f.bob], &f.professors),
            Some(f.ada.clone())
        );
    }

    #[test]
    fn test_dominant_all_zero_yields_none() {
        let f = fixture();
        let empty = IslandGroup::new(4);
        assert_eq!(
            InfluenceCalculator::Base.dominant(&empty, [&f.ada, &f.bob], &f.professors),
            None
        );
    }
}
