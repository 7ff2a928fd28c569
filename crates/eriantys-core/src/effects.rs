//! What each character card does when played.

use crate::{
    Category, CharacterId, CharacterParams, GameError, GameManager, GameResult,
    InfluenceCalculator, Nickname,
};

/// Allowance bonus granted by the Messenger.
const MESSENGER_BONUS: usize = 2;
/// Influence bonus granted by the Knight.
const KNIGHT_BONUS: usize = 2;
/// Swaps allowed by the Jester.
const JESTER_SWAPS: usize = 3;
/// Swaps allowed by the Minstrel.
const MINSTREL_SWAPS: usize = 2;
/// Tokens each player gives up to the Thief.
const THIEF_TAKES: usize = 3;

impl GameManager {
    /// Plays character `card` for `nickname`.
    ///
    /// The effect runs first; coins are only taken once it succeeded. On
    /// the card's first activation one coin stays on it, the rest go to
    /// the reserve.
    ///
    /// # Errors
    /// - [`GameError::Validation`] outside expert mode, on a second
    ///   activation in the same turn, when the player cannot pay, or when
    ///   `params` do not fit the card. Nothing changes in that case.
    /// - [`GameError::NotFound`] if the card is not on the table or a named
    ///   island does not exist.
    pub fn play_character(
        &mut self,
        nickname: &Nickname,
        card: CharacterId,
        params: &CharacterParams,
    ) -> GameResult<()> {
        if !self.expert {
            return Err(GameError::Validation(
                "character cards are only played in expert matches".into(),
            ));
        }
        if self.character_used {
            return Err(GameError::Validation(
                "a character was already played this turn".into(),
            ));
        }
        let slot = self
            .characters
            .iter()
            .position(|c| c.id() == card)
            .ok_or_else(|| GameError::NotFound(format!("character {card}")))?;
        let idx = self.player_index(nickname)?;
        let cost = self.characters[slot].cost();
        let coins = self.players[idx].coins();
        if coins < cost {
            return Err(GameError::Validation(format!(
                "{card} costs {cost} coins, {nickname} has {coins}"
            )));
        }

        self.apply_effect(idx, slot, params)?;

        self.players[idx].spend_coins(cost)?;
        let kept = usize::from(self.characters[slot].mark_used());
        self.coin_reserve += cost - kept;
        self.character_used = true;

        tracing::info!(%nickname, %card, cost, "character played");
        Ok(())
    }

    fn apply_effect(
        &mut self,
        idx: usize,
        slot: usize,
        params: &CharacterParams,
    ) -> GameResult<()> {
        let card = self.characters[slot].id();
        let actor = self.players[idx].nickname().clone();

        match card {
            CharacterId::Monk => {
                params.expect(card, true, true, 0)?;
                let category = category_param(params)?;
                let island = self.board.island_mut(island_param(params)?)?;
                let tokens = self.characters[slot].tokens_mut()?;
                tokens.move_one(island.tokens_mut(), category)?;
                self.refill_card(slot)?;
            }
            CharacterId::Farmer => {
                params.expect(card, false, false, 0)?;
                self.professors.activate_effect();
            }
            CharacterId::Herald => {
                params.expect(card, true, false, 0)?;
                let island = self.board.island_index(island_param(params)?)?;
                self.visit_island(island)?;
            }
            CharacterId::Messenger => {
                params.expect(card, false, false, 0)?;
                self.players[idx].set_movement_bonus(MESSENGER_BONUS);
            }
            CharacterId::Herbalist => {
                params.expect(card, true, false, 0)?;
                let island = self.board.island_mut(island_param(params)?)?;
                let tile = self.characters[slot].take_no_entry()?;
                if let Err(e) = island.add_no_entry(tile) {
                    self.characters[slot].return_no_entry(tile)?;
                    return Err(e);
                }
            }
            CharacterId::Centaur => {
                params.expect(card, false, false, 0)?;
                self.change_influence_state(Some(InfluenceCalculator::IgnoreTowers))?;
            }
            CharacterId::Jester => {
                params.expect(card, false, false, JESTER_SWAPS)?;
                let mut on_card = self.characters[slot].tokens_mut()?.clone();
                let mut entrance = self.players[idx].entrance().clone();
                for (from, to) in params.from.iter().zip(&params.to) {
                    on_card.swap(&mut entrance, *from, *to)?;
                }
                *self.characters[slot].tokens_mut()? = on_card;
                *self.players[idx].entrance_mut() = entrance;
            }
            CharacterId::Knight => {
                params.expect(card, false, false, 0)?;
                self.change_influence_state(Some(InfluenceCalculator::Bonus {
                    player: actor,
                    amount: KNIGHT_BONUS,
                }))?;
            }
            CharacterId::Mushroomer => {
                params.expect(card, false, true, 0)?;
                let category = category_param(params)?;
                self.change_influence_state(Some(InfluenceCalculator::ExcludeCategory {
                    category,
                }))?;
            }
            CharacterId::Minstrel => {
                params.expect(card, false, false, MINSTREL_SWAPS)?;
                let before = self.players[idx].dining().clone();
                let mut entrance = self.players[idx].entrance().clone();
                let mut dining = before.clone();
                for (from, to) in params.from.iter().zip(&params.to) {
                    entrance.swap(&mut dining, *from, *to)?;
                }
                let (live_entrance, live_dining) = self.players[idx].rooms_mut();
                *live_entrance = entrance;
                *live_dining = dining;

                for category in Category::ALL.iter().copied() {
                    if self.players[idx].dining().quantity(category) != before.quantity(category) {
                        self.after_seating(idx, category, before.quantity(category));
                    }
                }
                // Losing tokens can cost the actor a professor.
                self.professors.recompute(&params.to, &self.players);
            }
            CharacterId::Princess => {
                params.expect(card, false, true, 0)?;
                let category = category_param(params)?;
                let before = self.players[idx].dining().quantity(category);
                let tokens = self.characters[slot].tokens_mut()?;
                tokens.move_one(self.players[idx].dining_mut(), category)?;
                self.refill_card(slot)?;
                self.after_seating(idx, category, before);
            }
            CharacterId::Thief => {
                params.expect(card, false, true, 0)?;
                let category = category_param(params)?;
                let bag = self.board.bag_mut().tokens_mut();
                for player in &mut self.players {
                    for _ in 0..THIEF_TAKES {
                        if player.dining_mut().move_one(bag, category).is_err() {
                            break;
                        }
                    }
                }
                self.professors.recompute(&[category], &self.players);
            }
        }
        Ok(())
    }

    /// Tops a reservoir card back up. An empty bag is not an error here.
    fn refill_card(&mut self, slot: usize) -> GameResult<()> {
        let bag = self.board.bag_mut().tokens_mut();
        let tokens = self.characters[slot].tokens_mut()?;
        if tokens.refill_from(bag, &mut self.rng).is_err() {
            tracing::warn!(card = %self.characters[slot].id(), "bag could not refill card");
        }
        Ok(())
    }
}

fn island_param(params: &CharacterParams) -> GameResult<&str> {
    params
        .island
        .as_deref()
        .ok_or_else(|| GameError::Validation("an island is required".into()))
}

fn category_param(params: &CharacterParams) -> GameResult<Category> {
    params
        .category
        .ok_or_else(|| GameError::Validation("a category is required".into()))
}
