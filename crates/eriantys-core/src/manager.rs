//! The per-match aggregate and its rule operations.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::rules::{CHARACTERS_PER_MATCH, COIN_RESERVE, COIN_STEP, MIN_ISLAND_GROUPS};
use crate::{
    AssistantCard, Board, Category, CharacterCard, CharacterId, GameError, GameOptions, GameResult,
    GameSnapshot, InfluenceCalculator, Nickname, Player, ProfessorOwnership, Rules, TowerColor,
    Wizard,
};

/// Where a token leaving the entrance goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "island", rename_all = "snake_case")]
pub enum Destination {
    DiningRoom,
    Island(String),
}

/// One match's full rule state.
///
/// Every operation takes the acting player's nickname explicitly. Turn
/// ownership is enforced by the caller; the manager only enforces the
/// game rules.
#[derive(Debug)]
pub struct GameManager {
    pub(crate) rules: Rules,
    pub(crate) expert: bool,
    pub(crate) board: Board,
    /// Seating order. Fixed for the whole match.
    pub(crate) players: Vec<Player>,
    /// Acting order for the current round.
    pub(crate) turn_order: Vec<Nickname>,
    pub(crate) professors: ProfessorOwnership,
    pub(crate) influence: InfluenceCalculator,
    pub(crate) characters: Vec<CharacterCard>,
    pub(crate) coin_reserve: usize,
    pub(crate) character_used: bool,
    pub(crate) rng: StdRng,
}

impl GameManager {
    /// A match for `nicknames`, seated in the given order.
    ///
    /// `characters` fixes the expert-mode cards; `None` draws them at
    /// random. Ignored outside expert mode.
    ///
    /// # Errors
    /// [`GameError::Validation`] if the roster does not match the rules,
    /// nicknames repeat, or the fixed card list is not three distinct
    /// cards.
    pub fn new(
        rules: Rules,
        nicknames: Vec<Nickname>,
        expert: bool,
        mut rng: StdRng,
        characters: Option<Vec<CharacterId>>,
    ) -> GameResult<Self> {
        if nicknames.len() != rules.player_count {
            return Err(GameError::Validation(format!(
                "expected {} players, got {}",
                rules.player_count,
                nicknames.len()
            )));
        }
        let unique: HashSet<&Nickname> = nicknames.iter().collect();
        if unique.len() != nicknames.len() {
            return Err(GameError::Validation("nicknames must be unique".into()));
        }

        let characters = if expert {
            let ids = match characters {
                Some(ids) => {
                    let distinct: HashSet<CharacterId> = ids.iter().copied().collect();
                    if ids.len() != CHARACTERS_PER_MATCH || distinct.len() != ids.len() {
                        return Err(GameError::Validation(format!(
                            "exactly {CHARACTERS_PER_MATCH} distinct characters are required"
                        )));
                    }
                    ids
                }
                None => CharacterId::draw(&mut rng),
            };
            ids.into_iter().map(CharacterCard::new).collect()
        } else {
            Vec::new()
        };

        let players: Vec<Player> = nicknames
            .iter()
            .map(|n| Player::new(n.clone(), &rules))
            .collect();

        Ok(Self {
            rules,
            expert,
            board: Board::new(rules.cloud_count, rules.cloud_size),
            players,
            turn_order: nicknames,
            professors: ProfessorOwnership::new(),
            influence: InfluenceCalculator::Base,
            characters,
            coin_reserve: if expert { COIN_RESERVE } else { 0 },
            character_used: false,
            rng,
        })
    }

    /// Builds a manager from per-match options: rules follow the roster
    /// size, the RNG follows the seed.
    pub fn from_options(nicknames: Vec<Nickname>, options: &GameOptions) -> GameResult<Self> {
        let rules = Rules::for_players(nicknames.len())?;
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(rules, nicknames, options.expert, rng, options.characters.clone())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The rule table in force.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Returns `true` for expert matches.
    pub fn is_expert(&self) -> bool {
        self.expert
    }

    /// The shared board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Players in seating order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks a player up by nickname.
    pub fn player(&self, nickname: &Nickname) -> GameResult<&Player> {
        self.players
            .iter()
            .find(|p| p.nickname() == nickname)
            .ok_or_else(|| GameError::NotFound(format!("player {nickname}")))
    }

    /// Acting order for the current round.
    pub fn turn_order(&self) -> &[Nickname] {
        &self.turn_order
    }

    /// Professor ownership.
    pub fn professors(&self) -> &ProfessorOwnership {
        &self.professors
    }

    /// The active influence variant.
    pub fn influence(&self) -> &InfluenceCalculator {
        &self.influence
    }

    /// Character cards on the table (empty outside expert mode).
    pub fn characters(&self) -> &[CharacterCard] {
        &self.characters
    }

    /// Coins in the general reserve.
    pub fn coin_reserve(&self) -> usize {
        self.coin_reserve
    }

    /// Returns `true` if a character has already been played this turn.
    pub fn character_used_this_turn(&self) -> bool {
        self.character_used
    }

    pub(crate) fn player_index(&self, nickname: &Nickname) -> GameResult<usize> {
        self.players
            .iter()
            .position(|p| p.nickname() == nickname)
            .ok_or_else(|| GameError::NotFound(format!("player {nickname}")))
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    /// Lays out the board, fills every entrance and, in expert mode, hands
    /// out starting coins and prepares the character cards.
    pub fn setup_board(&mut self) -> GameResult<()> {
        self.board.setup(&mut self.rng)?;

        for player in &mut self.players {
            player
                .entrance_mut()
                .refill_from(self.board.bag_mut().tokens_mut(), &mut self.rng)?;
        }

        if self.expert {
            for player in &mut self.players {
                if self.coin_reserve > 0 {
                    self.coin_reserve -= 1;
                    player.add_coins(1);
                }
            }
            for card in &mut self.characters {
                card.setup_effect(self.board.bag_mut(), &mut self.rng)?;
            }
        }

        tracing::info!(
            players = self.players.len(),
            expert = self.expert,
            characters = ?self.characters.iter().map(CharacterCard::id).collect::<Vec<_>>(),
            "board ready"
        );
        Ok(())
    }

    /// Records `nickname`'s tower colour and wizard.
    ///
    /// # Errors
    /// - [`GameError::NotFound`] for an unknown nickname.
    /// - [`GameError::Validation`] if the player already chose, either
    ///   choice is taken, or the colour is not in play at this table size.
    pub fn setup_player(
        &mut self,
        nickname: &Nickname,
        tower: TowerColor,
        wizard: Wizard,
    ) -> GameResult<()> {
        let idx = self.player_index(nickname)?;
        if self.players[idx].has_completed_setup() {
            return Err(GameError::Validation(format!(
                "{nickname} has already chosen"
            )));
        }
        if !self.available_towers().contains(&tower) {
            return Err(GameError::Validation(format!(
                "tower colour {tower} is not available"
            )));
        }
        if !self.available_wizards().contains(&wizard) {
            return Err(GameError::Validation(format!(
                "wizard {wizard} is not available"
            )));
        }
        self.players[idx].choose(tower, wizard);
        tracing::debug!(%nickname, %tower, %wizard, "player set up");
        Ok(())
    }

    /// Tower colours still free.
    pub fn available_towers(&self) -> Vec<TowerColor> {
        self.rules
            .tower_colors()
            .iter()
            .copied()
            .filter(|t| self.players.iter().all(|p| p.tower_color() != Some(*t)))
            .collect()
    }

    /// Wizards still free.
    pub fn available_wizards(&self) -> Vec<Wizard> {
        Wizard::ALL
            .iter()
            .copied()
            .filter(|w| self.players.iter().all(|p| p.wizard() != Some(*w)))
            .collect()
    }

    /// Returns `true` once every player has chosen.
    pub fn all_players_ready(&self) -> bool {
        self.players.iter().all(Player::has_completed_setup)
    }

    /// Starts a round: clears last round's assistant cards and refills the
    /// clouds.
    ///
    /// Returns `true` if this has to be the final round because the bag
    /// could not fill the clouds or is now empty.
    pub fn setup_round(&mut self) -> bool {
        for player in &mut self.players {
            player.clear_played();
        }
        let filled = self.board.refill_clouds(&mut self.rng);
        let last = !filled || self.board.bag().is_empty();
        if last {
            tracing::info!(bag = self.board.bag().len(), "final round");
        }
        last
    }

    // -----------------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------------

    /// Checks that `nickname` may play `card`, given the cards already
    /// played this round.
    ///
    /// A card someone else already played is allowed only if every card in
    /// the player's hand was already played.
    pub fn validate_assistant(
        &self,
        nickname: &Nickname,
        card: AssistantCard,
        played_this_round: &[AssistantCard],
    ) -> GameResult<()> {
        let player = self.player(nickname)?;
        if !player.hand().contains(&card) {
            return Err(GameError::Validation(format!(
                "{nickname} does not hold assistant card {}",
                card.value()
            )));
        }
        let forced = player.hand().iter().all(|c| played_this_round.contains(c));
        if played_this_round.contains(&card) && !forced {
            return Err(GameError::Validation(format!(
                "assistant card {} was already played this round",
                card.value()
            )));
        }
        Ok(())
    }

    /// Applies the round's assistant cards and recomputes the turn order.
    ///
    /// Players act in ascending card value; equal values keep last round's
    /// relative order. Players who played nothing (disconnected) act last.
    ///
    /// Returns `true` if some player's hand is now empty, making this the
    /// final round.
    pub fn handle_assistant_cards(
        &mut self,
        played: &[(Nickname, AssistantCard)],
    ) -> GameResult<bool> {
        for (nickname, card) in played {
            let player = self.player(nickname)?;
            if !player.hand().contains(card) {
                return Err(GameError::Validation(format!(
                    "{nickname} does not hold assistant card {}",
                    card.value()
                )));
            }
        }
        for (nickname, card) in played {
            let idx = self.player_index(nickname)?;
            self.players[idx].play(*card)?;
        }

        let previous = std::mem::take(&mut self.turn_order);
        let value_of = |n: &Nickname| {
            played
                .iter()
                .find(|(who, _)| who == n)
                .map(|(_, card)| card.value())
        };
        let (mut acting, idle): (Vec<Nickname>, Vec<Nickname>) =
            previous.into_iter().partition(|n| value_of(n).is_some());
        // Stable sort keeps the previous order among equal values.
        acting.sort_by_key(|n| value_of(n));
        acting.extend(idle);
        self.turn_order = acting;

        tracing::info!(order = ?self.turn_order, "turn order set");
        Ok(self.players.iter().any(|p| p.hand().is_empty()))
    }

    // -----------------------------------------------------------------------
    // Action phase
    // -----------------------------------------------------------------------

    /// Moves one `category` token out of `nickname`'s entrance.
    ///
    /// A token seated in the dining room re-runs professor ownership and,
    /// in expert mode, earns a coin on every third seat of its category.
    ///
    /// # Errors
    /// - [`GameError::NotFound`] for an unknown player or island.
    /// - [`GameError::NoMovement`] if the entrance lacks the token or the
    ///   dining-room row is full.
    pub fn handle_moved_student(
        &mut self,
        nickname: &Nickname,
        category: Category,
        destination: &Destination,
    ) -> GameResult<()> {
        let idx = self.player_index(nickname)?;
        match destination {
            Destination::DiningRoom => {
                let before = self.players[idx].dining().quantity(category);
                self.players[idx].seat(category)?;
                self.after_seating(idx, category, before);
            }
            Destination::Island(id) => {
                let island = self.board.island_mut(id)?;
                self.players[idx]
                    .entrance_mut()
                    .move_one(island.tokens_mut(), category)?;
            }
        }
        Ok(())
    }

    /// Bookkeeping after tokens of `category` were added to player `idx`'s
    /// dining room, which held `before` of them.
    pub(crate) fn after_seating(&mut self, idx: usize, category: Category, before: usize) {
        let nickname = self.players[idx].nickname().clone();
        self.professors.update(&[category], &nickname, &self.players);

        if !self.expert {
            return;
        }
        let after = self.players[idx].dining().quantity(category);
        let earned = (after / COIN_STEP).saturating_sub(before / COIN_STEP);
        let paid = earned.min(self.coin_reserve);
        if paid > 0 {
            self.coin_reserve -= paid;
            self.players[idx].add_coins(paid);
            tracing::debug!(%nickname, coins = paid, "coin earned");
        }
    }

    /// Moves Mother Nature to `island_id` and resolves the island there.
    ///
    /// Returns `true` if the island changed controller.
    ///
    /// # Errors
    /// - [`GameError::NotFound`] for an unknown island.
    /// - [`GameError::Validation`] if the distance is zero or beyond the
    ///   player's allowance.
    pub fn handle_mother_nature_movement(
        &mut self,
        nickname: &Nickname,
        island_id: &str,
    ) -> GameResult<bool> {
        let allowance = self.player(nickname)?.movement_allowance();
        let idx = self.board.island_index(island_id)?;
        let steps = self.board.distance_to(idx);
        if steps == 0 || steps > allowance {
            return Err(GameError::Validation(format!(
                "Mother Nature can move 1 to {allowance} steps, not {steps}"
            )));
        }
        self.board.move_mother_nature(idx);
        tracing::debug!(%nickname, island = island_id, steps, "Mother Nature moved");
        self.visit_island(idx)
    }

    /// Resolves the island at `idx` unless a no-entry tile blocks it, in
    /// which case the tile goes back to its card.
    pub(crate) fn visit_island(&mut self, idx: usize) -> GameResult<bool> {
        let island = self.board.island_at_mut(idx)?;
        if let Some(tile) = island.take_no_entry() {
            let id = island.id().to_string();
            let card = self
                .characters
                .iter_mut()
                .find(|c| c.id() == CharacterId::Herbalist)
                .ok_or_else(|| {
                    GameError::IllegalState(format!("no-entry tile {tile} has no card"))
                })?;
            card.return_no_entry(tile)?;
            tracing::debug!(island = %id, tile, "resolution blocked by no-entry tile");
            return Ok(false);
        }
        let id = island.id().to_string();
        self.resolve(&id)
    }

    /// Recomputes the controller of `island_id` with the active influence
    /// variant, swaps towers accordingly and fuses it with matching
    /// neighbours.
    ///
    /// Returns `true` if control changed. A tie or an all-zero score
    /// leaves the island as it is.
    pub fn resolve(&mut self, island_id: &str) -> GameResult<bool> {
        let island = self.board.island(island_id)?;
        let current = island.controller().cloned();
        let size = island.size();
        let winner = self.influence.dominant(
            island,
            self.players.iter().map(Player::nickname),
            &self.professors,
        );
        let Some(winner) = winner else {
            return Ok(false);
        };
        if current.as_ref() == Some(&winner) {
            return Ok(false);
        }

        if let Some(previous) = &current {
            let idx = self.player_index(previous)?;
            self.players[idx].return_towers(size);
        }
        let idx = self.player_index(&winner)?;
        let placed = self.players[idx].place_towers(size);
        if placed < size {
            tracing::debug!(player = %winner, placed, size, "ran out of towers");
        }
        self.board
            .island_mut(island_id)?
            .set_controller(Some(winner.clone()));

        tracing::info!(
            island = island_id,
            from = ?current,
            to = %winner,
            "island control changed"
        );
        self.board.unify(island_id)?;
        Ok(true)
    }

    /// Moves every token on cloud `index` into `nickname`'s entrance.
    ///
    /// # Errors
    /// - [`GameError::NotFound`] for an unknown player or cloud index.
    /// - [`GameError::Validation`] if the cloud is empty or the entrance
    ///   cannot take its tokens.
    pub fn handle_selected_cloud(&mut self, nickname: &Nickname, index: usize) -> GameResult<()> {
        let idx = self.player_index(nickname)?;
        let cloud = self.board.cloud_mut(index)?;
        if cloud.is_empty() {
            return Err(GameError::Validation(format!("cloud {index} is empty")));
        }
        let entrance = self.players[idx].entrance_mut();
        if entrance.remaining_total() < cloud.total() {
            return Err(GameError::Validation(format!(
                "entrance has room for {} tokens, cloud {index} holds {}",
                entrance.remaining_total(),
                cloud.total()
            )));
        }
        cloud.move_all(entrance)
    }

    /// Returns `true` if some cloud has tokens to take.
    pub fn any_cloud_available(&self) -> bool {
        self.board.clouds().iter().any(|c| !c.is_empty())
    }

    // -----------------------------------------------------------------------
    // Effects and turn end
    // -----------------------------------------------------------------------

    /// Installs an influence variant for the rest of the turn.
    ///
    /// # Errors
    /// [`GameError::IllegalState`] if no variant is given.
    pub fn change_influence_state(
        &mut self,
        calculator: Option<InfluenceCalculator>,
    ) -> GameResult<()> {
        let calculator = calculator.ok_or_else(|| {
            GameError::IllegalState("influence variant must not be empty".into())
        })?;
        tracing::debug!(variant = ?calculator, "influence variant installed");
        self.influence = calculator;
        Ok(())
    }

    /// Clears everything a character installed for `nickname`'s turn.
    pub fn end_turn(&mut self, nickname: &Nickname) -> GameResult<()> {
        let idx = self.player_index(nickname)?;
        self.players[idx].set_movement_bonus(0);
        self.influence = InfluenceCalculator::Base;
        self.professors.deactivate_effect();
        self.character_used = false;
        Ok(())
    }

    /// Marks a player (dis)connected.
    pub fn set_connected(&mut self, nickname: &Nickname, connected: bool) -> GameResult<()> {
        let idx = self.player_index(nickname)?;
        self.players[idx].set_connected(connected);
        Ok(())
    }

    /// Players with a live connection.
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_connected()).count()
    }

    // -----------------------------------------------------------------------
    // End of match
    // -----------------------------------------------------------------------

    /// Returns `true` once the match cannot go on: someone placed their
    /// last tower, too few island groups remain, or fewer than two players
    /// are connected.
    pub fn game_over(&self) -> bool {
        self.decided_on_board() || self.connected_count() < 2
    }

    /// The board half of [`game_over`](Self::game_over): a player is out
    /// of towers or too few island groups remain. Connection loss is left
    /// to the caller's reconnect timer.
    pub fn decided_on_board(&self) -> bool {
        self.players.iter().any(|p| p.towers() == 0)
            || self.board.islands().len() <= MIN_ISLAND_GROUPS
    }

    /// The winner: fewest towers left, then most professors. `None` on a
    /// full tie. With fewer than two players connected, the one still
    /// connected wins.
    pub fn winner(&self) -> Option<Nickname> {
        if self.connected_count() < 2 {
            return self
                .players
                .iter()
                .find(|p| p.is_connected())
                .map(|p| p.nickname().clone());
        }

        let rank = |p: &Player| {
            (
                p.towers(),
                std::cmp::Reverse(self.professors.count_owned(p.nickname())),
            )
        };
        let best = self.players.iter().map(rank).min()?;
        let mut leaders = self.players.iter().filter(|p| rank(*p) == best);
        match (leaders.next(), leaders.next()) {
            (Some(only), None) => Some(only.nickname().clone()),
            _ => None,
        }
    }

    /// A full copy of the public match state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.clone(),
            turn_order: self.turn_order.clone(),
            islands: self.board.islands().to_vec(),
            mother_nature: self.board.mother_nature(),
            clouds: self.board.clouds().to_vec(),
            professors: self.professors.clone(),
            influence: self.influence.clone(),
            characters: self.characters.clone(),
            bag_size: self.board.bag().len(),
            coin_reserve: self.coin_reserve,
        }
    }
}
