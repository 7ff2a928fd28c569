//! The phase state machine.
//!
//! A match moves through a fixed cycle:
//!
//! ```text
//!            ┌─────────────────────────────────────────────────────┐
//!            ▼                                                     │
//! Setup → Planning → MoveTokens → MoveMotherNature → SelectCloud ──┤
//!                        ▲                               │         │
//!                        └──────── next player ──────────┘         │
//!                                                                  ▼
//!                                                              GameOver
//! ```
//!
//! Each phase takes one kind of [`ClientAction`] (character cards are
//! also taken during the three action phases). [`transition`] applies
//! the action to the [`GameManager`] and returns the next phase together
//! with every message the action produced. Turn ownership is checked by
//! the caller before `transition` runs.

use eriantys_core::{AssistantCard, GameError, GameManager, Nickname};
use eriantys_protocol::{
    ClientAction, Hand, PhaseName, PlayedCard, Recipient, ServerMessage, SetupChoice,
};

use crate::MatchError;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where the match is, with the data each phase needs.
///
/// `last_round` is set when the bag ran dry or a hand emptied; the match
/// ends when that round does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Players pick tower colours and wizards.
    Setup,

    /// Players lay assistant cards one at a time, following last round's
    /// turn order. `player` is `None` while nobody left to play is
    /// connected.
    Planning {
        player: Option<Nickname>,
        played: Vec<(Nickname, AssistantCard)>,
        last_round: bool,
    },

    /// `player` moves tokens out of their entrance.
    MoveTokens {
        player: Nickname,
        moved: usize,
        last_round: bool,
    },

    /// `player` moves Mother Nature.
    MoveMotherNature { player: Nickname, last_round: bool },

    /// `player` claims a cloud.
    SelectCloud { player: Nickname, last_round: bool },

    /// The match is over. `None` is a tie.
    GameOver { winner: Option<Nickname> },
}

impl Phase {
    /// The name clients see.
    pub fn name(&self) -> PhaseName {
        match self {
            Phase::Setup => PhaseName::Setup,
            Phase::Planning { .. } => PhaseName::Planning,
            Phase::MoveTokens { .. } => PhaseName::MoveTokens,
            Phase::MoveMotherNature { .. } => PhaseName::MoveMotherNature,
            Phase::SelectCloud { .. } => PhaseName::SelectCloud,
            Phase::GameOver { .. } => PhaseName::GameOver,
        }
    }

    /// The player whose action the phase waits for.
    pub fn current_player(&self) -> Option<&Nickname> {
        match self {
            Phase::Planning { player, .. } => player.as_ref(),
            Phase::MoveTokens { player, .. }
            | Phase::MoveMotherNature { player, .. }
            | Phase::SelectCloud { player, .. } => Some(player),
            _ => None,
        }
    }

    /// Returns `true` once the match is decided.
    pub fn is_over(&self) -> bool {
        matches!(self, Phase::GameOver { .. })
    }

    fn last_round(&self) -> bool {
        match self {
            Phase::Planning { last_round, .. }
            | Phase::MoveTokens { last_round, .. }
            | Phase::MoveMotherNature { last_round, .. }
            | Phase::SelectCloud { last_round, .. } => *last_round,
            Phase::Setup | Phase::GameOver { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// The outcome of an accepted action: the phase to enter and what to
/// tell whom.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Phase,
    pub messages: Vec<(Recipient, ServerMessage)>,
}

impl Transition {
    fn to(next: Phase) -> Self {
        Self {
            next,
            messages: Vec::new(),
        }
    }

    fn accepted(sender: &Nickname, next: Phase) -> Self {
        Self {
            next,
            messages: vec![(Recipient::Player(sender.clone()), ServerMessage::Accepted)],
        }
    }

    fn broadcast(mut self, message: ServerMessage) -> Self {
        self.messages.push((Recipient::All, message));
        self
    }

    /// Appends `later`'s messages and moves on to its phase.
    fn then(mut self, later: Transition) -> Self {
        self.messages.extend(later.messages);
        self.next = later.next;
        self
    }
}

/// Applies `action` from `sender` in `phase`.
///
/// # Errors
/// - [`MatchError::UnexpectedMessage`] if the phase takes another kind of
///   action.
/// - [`MatchError::Rule`] if the game rules refuse it. The manager is left
///   as it was.
pub fn transition(
    phase: &Phase,
    game: &mut GameManager,
    sender: &Nickname,
    action: ClientAction,
) -> Result<Transition, MatchError> {
    let last_round = phase.last_round();

    match (phase, action) {
        (Phase::Setup, ClientAction::SelectSetup { tower, wizard }) => {
            game.setup_player(sender, tower, wizard)?;
            let t = Transition::accepted(sender, phase.clone()).broadcast(selection_update(game));
            if game.all_players_ready() {
                return Ok(t.then(start_round(game)));
            }
            Ok(t)
        }

        (Phase::Planning { played, .. }, ClientAction::PlayAssistant { card }) => {
            if played.iter().any(|(who, _)| who == sender) {
                return Err(GameError::Validation(format!(
                    "{sender} already played an assistant card this round"
                ))
                .into());
            }
            let card = AssistantCard::new(card)?;
            let on_table: Vec<AssistantCard> = played.iter().map(|(_, c)| *c).collect();
            game.validate_assistant(sender, card, &on_table)?;

            let mut played = played.clone();
            played.push((sender.clone(), card));
            let t = Transition::accepted(sender, phase.clone())
                .broadcast(assistant_update(game, &played));

            match next_planner(game, &played) {
                Some(next) => Ok(t.then(planning_turn(Some(next), played, last_round))),
                None => Ok(t.then(close_planning(game, &played, last_round)?)),
            }
        }

        (
            Phase::MoveTokens { player, moved, .. },
            ClientAction::MoveToken {
                category,
                destination,
            },
        ) => {
            game.handle_moved_student(sender, category, &destination)?;
            let moved = moved + 1;
            let t = Transition::accepted(sender, phase.clone()).broadcast(board_update(game));

            if moved < game.rules().moves_per_turn {
                return Ok(Transition {
                    next: Phase::MoveTokens {
                        player: player.clone(),
                        moved,
                        last_round,
                    },
                    ..t
                });
            }
            let next = Phase::MoveMotherNature {
                player: player.clone(),
                last_round,
            };
            Ok(t.then(Transition::to(next.clone()).broadcast(phase_update(&next))))
        }

        (Phase::MoveMotherNature { player, .. }, ClientAction::MoveMotherNature { island }) => {
            game.handle_mother_nature_movement(sender, &island)?;
            let t = Transition::accepted(sender, phase.clone()).broadcast(board_update(game));

            if game.decided_on_board() {
                return Ok(t.then(finish(game)));
            }
            if !game.any_cloud_available() {
                tracing::debug!(%player, "no cloud to claim, skipping SelectCloud");
                return Ok(t.then(pass_turn(game, player, last_round)?));
            }
            let next = Phase::SelectCloud {
                player: player.clone(),
                last_round,
            };
            Ok(t.then(Transition::to(next.clone()).broadcast(phase_update(&next))))
        }

        (Phase::SelectCloud { player, .. }, ClientAction::SelectCloud { index }) => {
            game.handle_selected_cloud(sender, index)?;
            let t = Transition::accepted(sender, phase.clone()).broadcast(board_update(game));
            Ok(t.then(pass_turn(game, player, last_round)?))
        }

        (
            Phase::MoveTokens { .. } | Phase::MoveMotherNature { .. } | Phase::SelectCloud { .. },
            ClientAction::PlayCharacter { card, params },
        ) => {
            game.play_character(sender, card, &params)?;
            let t = Transition::accepted(sender, phase.clone()).broadcast(board_update(game));
            if game.decided_on_board() {
                return Ok(t.then(finish(game)));
            }
            Ok(t)
        }

        (phase, action) => Err(MatchError::UnexpectedMessage {
            action: action.name(),
            phase: phase.name(),
        }),
    }
}

/// Called when `nickname` lost their connection.
///
/// Skips their turn if they held it. A planner who leaves passes the
/// planning turn on, or closes planning if everyone else connected has
/// laid a card. `None` if nothing changes.
///
/// # Errors
/// [`MatchError::Rule`] if the manager rejects the turn change.
pub fn on_disconnect(
    phase: &Phase,
    game: &mut GameManager,
    nickname: &Nickname,
) -> Result<Option<Transition>, MatchError> {
    match phase {
        Phase::Planning {
            player: Some(player),
            played,
            last_round,
        } if player == nickname => {
            tracing::info!(%nickname, "planner left, passing the planning turn");
            match next_planner(game, played) {
                None if !played.is_empty() => close_planning(game, played, *last_round).map(Some),
                next => Ok(Some(planning_turn(next, played.clone(), *last_round))),
            }
        }
        Phase::MoveTokens { player, last_round, .. }
        | Phase::MoveMotherNature { player, last_round }
        | Phase::SelectCloud { player, last_round }
            if player == nickname =>
        {
            tracing::info!(%nickname, "turn holder left, skipping turn");
            pass_turn(game, player, *last_round).map(Some)
        }
        _ => Ok(None),
    }
}

/// Called when a player is back. Restarts a planning round that stalled
/// because everyone still to play had left.
pub fn on_reconnect(phase: &Phase, game: &GameManager) -> Option<Transition> {
    match phase {
        Phase::Planning {
            player: None,
            played,
            last_round,
        } => next_planner(game, played)
            .map(|next| planning_turn(Some(next), played.clone(), *last_round)),
        _ => None,
    }
}

/// The opening of a freshly set-up match.
pub fn opening(game: &GameManager) -> Transition {
    Transition::to(Phase::Setup)
        .broadcast(ServerMessage::InitialBoardStatus {
            board: Box::new(game.snapshot()),
        })
        .broadcast(selection_update(game))
        .broadcast(phase_update(&Phase::Setup))
}

/// Ends the match and announces the winner.
pub fn finish(game: &GameManager) -> Transition {
    let winner = game.winner();
    tracing::info!(winner = ?winner, "game over");
    let next = Phase::GameOver {
        winner: winner.clone(),
    };
    Transition::to(next.clone())
        .broadcast(board_update(game))
        .broadcast(phase_update(&next))
        .broadcast(ServerMessage::GameOver { winner })
}

// ---------------------------------------------------------------------------
// Round and turn sequencing
// ---------------------------------------------------------------------------

fn start_round(game: &mut GameManager) -> Transition {
    let last_round = game.setup_round();
    let next = Phase::Planning {
        player: next_planner(game, &[]),
        played: Vec::new(),
        last_round,
    };
    Transition::to(next.clone())
        .broadcast(board_update(game))
        .broadcast(assistant_update(game, &[]))
        .broadcast(phase_update(&next))
}

/// The first connected player in the turn order who has not laid a card.
/// Until planning closes the order is last round's, or the seating order
/// in the first round.
fn next_planner(game: &GameManager, played: &[(Nickname, AssistantCard)]) -> Option<Nickname> {
    game.turn_order()
        .iter()
        .find(|n| {
            !played.iter().any(|(who, _)| who == *n)
                && game.player(n).is_ok_and(|p| p.is_connected())
        })
        .cloned()
}

fn planning_turn(
    player: Option<Nickname>,
    played: Vec<(Nickname, AssistantCard)>,
    last_round: bool,
) -> Transition {
    let next = Phase::Planning {
        player,
        played,
        last_round,
    };
    Transition::to(next.clone()).broadcast(phase_update(&next))
}

fn close_planning(
    game: &mut GameManager,
    played: &[(Nickname, AssistantCard)],
    last_round: bool,
) -> Result<Transition, MatchError> {
    let hand_empty = game.handle_assistant_cards(played)?;
    Ok(begin_turn(game, None, last_round || hand_empty))
}

/// Hands the turn to whoever follows `after` in the turn order, or ends
/// the round if nobody does.
fn begin_turn(game: &mut GameManager, after: Option<&Nickname>, last_round: bool) -> Transition {
    match next_player(game, after) {
        Some(player) => {
            let next = Phase::MoveTokens {
                player,
                moved: 0,
                last_round,
            };
            Transition::to(next.clone()).broadcast(phase_update(&next))
        }
        None => end_round(game, last_round),
    }
}

fn pass_turn(
    game: &mut GameManager,
    player: &Nickname,
    last_round: bool,
) -> Result<Transition, MatchError> {
    game.end_turn(player)?;
    Ok(begin_turn(game, Some(player), last_round))
}

fn end_round(game: &mut GameManager, last_round: bool) -> Transition {
    if last_round || game.decided_on_board() {
        return finish(game);
    }
    start_round(game)
}

/// The first connected player after `after` who laid a card this round.
fn next_player(game: &GameManager, after: Option<&Nickname>) -> Option<Nickname> {
    let order = game.turn_order();
    let start = after
        .and_then(|a| order.iter().position(|n| n == a))
        .map_or(0, |i| i + 1);
    order
        .iter()
        .skip(start)
        .find(|n| {
            game.player(n)
                .is_ok_and(|p| p.is_connected() && p.played().is_some())
        })
        .cloned()
}

// ---------------------------------------------------------------------------
// Message builders
// ---------------------------------------------------------------------------

/// `PhaseUpdate` for `phase`.
pub fn phase_update(phase: &Phase) -> ServerMessage {
    ServerMessage::PhaseUpdate {
        phase: phase.name(),
        current_player: phase.current_player().cloned(),
    }
}

/// `BoardUpdate` with a fresh snapshot.
pub fn board_update(game: &GameManager) -> ServerMessage {
    ServerMessage::BoardUpdate {
        board: Box::new(game.snapshot()),
    }
}

/// `UserSelectionUpdate`: choices made so far and what is still free.
pub fn selection_update(game: &GameManager) -> ServerMessage {
    let chosen = game
        .players()
        .iter()
        .filter_map(|p| {
            Some(SetupChoice {
                player: p.nickname().clone(),
                tower: p.tower_color()?,
                wizard: p.wizard()?,
            })
        })
        .collect();
    ServerMessage::UserSelectionUpdate {
        chosen,
        towers: game.available_towers(),
        wizards: game.available_wizards(),
    }
}

/// `AssistantCardUpdate`: the cards on the table and what each player
/// could still lay.
pub fn assistant_update(game: &GameManager, played: &[(Nickname, AssistantCard)]) -> ServerMessage {
    let hands = game
        .players()
        .iter()
        .map(|p| {
            let laid = played
                .iter()
                .find(|(who, _)| who == p.nickname())
                .map(|(_, c)| *c);
            Hand {
                player: p.nickname().clone(),
                cards: p
                    .hand()
                    .iter()
                    .filter(|c| Some(**c) != laid)
                    .map(|c| c.value())
                    .collect(),
            }
        })
        .collect();
    ServerMessage::AssistantCardUpdate {
        played: played
            .iter()
            .map(|(player, card)| PlayedCard {
                player: player.clone(),
                card: card.value(),
            })
            .collect(),
        hands,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use eriantys_core::{
        Category, CharacterId, CharacterParams, Destination, GameOptions, TowerColor, Wizard,
    };

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn nick(name: &str) -> Nickname {
        Nickname::from(name)
    }

    fn game(names: &[&str], expert: bool) -> GameManager {
        let options = GameOptions {
            expert,
            seed: Some(17),
            characters: expert
                .then(|| vec![CharacterId::Messenger, CharacterId::Farmer, CharacterId::Knight]),
        };
        let mut gm =
            GameManager::from_options(names.iter().map(|n| nick(n)).collect(), &options).unwrap();
        gm.setup_board().unwrap();
        gm
    }

    fn act(phase: &Phase, gm: &mut GameManager, who: &str, action: ClientAction) -> Transition {
        transition(phase, gm, &nick(who), action).unwrap()
    }

    fn setup_all(gm: &mut GameManager, names: &[&str]) -> Phase {
        let mut phase = Phase::Setup;
        let towers = gm.rules().tower_colors().to_vec();
        for (i, name) in names.iter().enumerate() {
            let action = ClientAction::SelectSetup {
                tower: towers[i],
                wizard: Wizard::ALL[i],
            };
            phase = act(&phase, gm, name, action).next;
        }
        phase
    }

    fn play(phase: &Phase, gm: &mut GameManager, who: &str, card: u8) -> Transition {
        act(phase, gm, who, ClientAction::PlayAssistant { card })
    }

    fn move_any_to_dining(phase: &Phase, gm: &mut GameManager, who: &str) -> Transition {
        let category = gm.player(&nick(who)).unwrap().entrance().available()[0];
        act(
            phase,
            gm,
            who,
            ClientAction::MoveToken {
                category,
                destination: Destination::DiningRoom,
            },
        )
    }

    fn one_step(gm: &GameManager) -> String {
        let islands = gm.board().islands();
        islands[(gm.board().mother_nature() + 1) % islands.len()]
            .id()
            .to_string()
    }

    fn has(messages: &[(Recipient, ServerMessage)], pred: impl Fn(&ServerMessage) -> bool) -> bool {
        messages.iter().any(|(_, m)| pred(m))
    }

    // =====================================================================
    // Setup
    // =====================================================================

    #[test]
    fn test_transition_setup_choice_broadcasts_selection() {
        let mut gm = game(&["ada", "bob"], false);
        let t = act(
            &Phase::Setup,
            &mut gm,
            "ada",
            ClientAction::SelectSetup {
                tower: TowerColor::Black,
                wizard: Wizard::ALL[0],
            },
        );

        assert_eq!(t.next, Phase::Setup);
        assert_eq!(
            t.messages[0],
            (Recipient::Player(nick("ada")), ServerMessage::Accepted)
        );
        assert!(has(&t.messages, |m| matches!(
            m,
            ServerMessage::UserSelectionUpdate { chosen, towers, .. }
                if chosen.len() == 1 && !towers.contains(&TowerColor::Black)
        )));
    }

    #[test]
    fn test_transition_second_setup_choice_is_refused() {
        let mut gm = game(&["ada", "bob"], false);
        let towers = gm.rules().tower_colors().to_vec();
        act(
            &Phase::Setup,
            &mut gm,
            "ada",
            ClientAction::SelectSetup {
                tower: towers[0],
                wizard: Wizard::ALL[0],
            },
        );

        let result = transition(
            &Phase::Setup,
            &mut gm,
            &nick("ada"),
            ClientAction::SelectSetup {
                tower: towers[1],
                wizard: Wizard::ALL[1],
            },
        );

        assert!(matches!(result, Err(MatchError::Rule(GameError::Validation(_)))));
    }

    #[test]
    fn test_transition_setup_complete_enters_planning() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        assert_eq!(phase.name(), PhaseName::Planning);
    }

    #[test]
    fn test_transition_wrong_action_is_unexpected_message() {
        let mut gm = game(&["ada", "bob"], false);
        let result = transition(
            &Phase::Setup,
            &mut gm,
            &nick("ada"),
            ClientAction::SelectCloud { index: 0 },
        );

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("unexpected message"));
    }

    // =====================================================================
    // Planning
    // =====================================================================

    #[test]
    fn test_transition_planning_lowest_card_moves_first() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);

        let phase = play(&phase, &mut gm, "ada", 7).next;
        assert_eq!(phase.name(), PhaseName::Planning);
        let t = play(&phase, &mut gm, "bob", 2);

        assert_eq!(
            t.next,
            Phase::MoveTokens {
                player: nick("bob"),
                moved: 0,
                last_round: false
            }
        );
        assert!(has(&t.messages, |m| matches!(
            m,
            ServerMessage::PhaseUpdate { phase: PhaseName::MoveTokens, current_player: Some(p) }
                if *p == nick("bob")
        )));
    }

    #[test]
    fn test_transition_planning_repeat_play_is_refused() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 7).next;

        let result = transition(&phase, &mut gm, &nick("ada"), ClientAction::PlayAssistant {
            card: 3,
        });
        assert!(matches!(result, Err(MatchError::Rule(GameError::Validation(_)))));
    }

    #[test]
    fn test_transition_planning_card_on_table_is_refused() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 7).next;

        let result = transition(&phase, &mut gm, &nick("bob"), ClientAction::PlayAssistant {
            card: 7,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_transition_planning_turn_follows_seating_then_turn_order() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        assert_eq!(phase.current_player(), Some(&nick("ada")));

        let t = play(&phase, &mut gm, "ada", 7);
        assert_eq!(t.next.current_player(), Some(&nick("bob")));
        assert!(has(&t.messages, |m| matches!(
            m,
            ServerMessage::PhaseUpdate { phase: PhaseName::Planning, current_player: Some(p) }
                if *p == nick("bob")
        )));
    }

    #[test]
    fn test_on_disconnect_planner_passes_planning_turn() {
        let mut gm = game(&["ada", "bob", "cyd"], false);
        let phase = setup_all(&mut gm, &["ada", "bob", "cyd"]);
        let phase = play(&phase, &mut gm, "ada", 5).next;

        gm.set_connected(&nick("bob"), false).unwrap();
        let t = on_disconnect(&phase, &mut gm, &nick("bob")).unwrap().unwrap();

        assert_eq!(t.next.name(), PhaseName::Planning);
        assert_eq!(t.next.current_player(), Some(&nick("cyd")));
    }

    #[test]
    fn test_on_disconnect_waiting_planner_changes_nothing() {
        let mut gm = game(&["ada", "bob", "cyd"], false);
        let phase = setup_all(&mut gm, &["ada", "bob", "cyd"]);

        gm.set_connected(&nick("cyd"), false).unwrap();
        assert!(on_disconnect(&phase, &mut gm, &nick("cyd")).unwrap().is_none());
    }

    #[test]
    fn test_on_reconnect_restarts_stalled_planning() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        gm.set_connected(&nick("bob"), false).unwrap();
        gm.set_connected(&nick("ada"), false).unwrap();
        let stalled = on_disconnect(&phase, &mut gm, &nick("ada"))
            .unwrap()
            .unwrap()
            .next;
        assert_eq!(stalled.current_player(), None);
        assert!(on_reconnect(&stalled, &gm).is_none());

        gm.set_connected(&nick("bob"), true).unwrap();
        let t = on_reconnect(&stalled, &gm).unwrap();

        assert_eq!(t.next.current_player(), Some(&nick("bob")));
    }

    #[test]
    fn test_assistant_update_hides_laid_card_from_hand() {
        let gm = game(&["ada", "bob"], false);
        let played = vec![(nick("ada"), AssistantCard::new(4).unwrap())];

        let ServerMessage::AssistantCardUpdate { played, hands } = assistant_update(&gm, &played)
        else {
            panic!("expected AssistantCardUpdate");
        };

        assert_eq!(played[0].card, 4);
        assert_eq!(hands[0].cards.len(), 9);
        assert!(!hands[0].cards.contains(&4));
        assert_eq!(hands[1].cards.len(), 10);
    }

    // =====================================================================
    // Action phases
    // =====================================================================

    #[test]
    fn test_transition_full_turn_passes_to_next_player() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 1).next;
        let mut phase = play(&phase, &mut gm, "bob", 9).next;

        for _ in 0..3 {
            phase = move_any_to_dining(&phase, &mut gm, "ada").next;
        }
        assert_eq!(phase.name(), PhaseName::MoveMotherNature);

        let island = one_step(&gm);
        phase = act(&phase, &mut gm, "ada", ClientAction::MoveMotherNature { island }).next;
        assert_eq!(phase.name(), PhaseName::SelectCloud);

        let t = act(&phase, &mut gm, "ada", ClientAction::SelectCloud { index: 0 });
        assert_eq!(t.next.current_player(), Some(&nick("bob")));
        assert_eq!(t.next.name(), PhaseName::MoveTokens);
    }

    #[test]
    fn test_transition_last_turn_of_round_returns_to_planning() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 1).next;
        let mut phase = play(&phase, &mut gm, "bob", 9).next;

        for (who, cloud) in [("ada", 0), ("bob", 1)] {
            for _ in 0..3 {
                phase = move_any_to_dining(&phase, &mut gm, who).next;
            }
            let island = one_step(&gm);
            phase = act(&phase, &mut gm, who, ClientAction::MoveMotherNature { island }).next;
            phase = act(&phase, &mut gm, who, ClientAction::SelectCloud { index: cloud }).next;
        }

        assert_eq!(
            phase,
            Phase::Planning {
                player: Some(nick("ada")),
                played: Vec::new(),
                last_round: false
            }
        );
    }

    #[test]
    fn test_transition_move_token_rejected_keeps_count() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 1).next;
        let phase = play(&phase, &mut gm, "bob", 9).next;

        let missing = Category::ALL
            .iter()
            .copied()
            .find(|c| gm.player(&nick("ada")).unwrap().entrance().quantity(*c) == 0);
        if let Some(category) = missing {
            let result = transition(&phase, &mut gm, &nick("ada"), ClientAction::MoveToken {
                category,
                destination: Destination::DiningRoom,
            });
            assert!(matches!(result, Err(MatchError::Rule(GameError::NoMovement))));
        }
        let result = transition(&phase, &mut gm, &nick("ada"), ClientAction::MoveToken {
            category: Category::Red,
            destination: Destination::Island("99".into()),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_transition_character_keeps_phase() {
        let mut gm = game(&["ada", "bob"], true);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 1).next;
        let phase = play(&phase, &mut gm, "bob", 9).next;

        let t = act(&phase, &mut gm, "ada", ClientAction::PlayCharacter {
            card: CharacterId::Messenger,
            params: CharacterParams::none(),
        });

        assert_eq!(t.next, phase);
        assert!(has(&t.messages, |m| matches!(m, ServerMessage::BoardUpdate { .. })));
    }

    #[test]
    fn test_transition_character_outside_action_phase_is_unexpected() {
        let mut gm = game(&["ada", "bob"], true);
        let result = transition(&Phase::Setup, &mut gm, &nick("ada"), ClientAction::PlayCharacter {
            card: CharacterId::Messenger,
            params: CharacterParams::none(),
        });
        assert!(matches!(result, Err(MatchError::UnexpectedMessage { .. })));
    }

    // =====================================================================
    // Disconnects and game over
    // =====================================================================

    #[test]
    fn test_on_disconnect_turn_holder_is_skipped() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 1).next;
        let phase = play(&phase, &mut gm, "bob", 9).next;

        gm.set_connected(&nick("ada"), false).unwrap();
        let t = on_disconnect(&phase, &mut gm, &nick("ada")).unwrap().unwrap();

        assert_eq!(t.next.current_player(), Some(&nick("bob")));
    }

    #[test]
    fn test_on_disconnect_other_player_changes_nothing() {
        let mut gm = game(&["ada", "bob"], false);
        let phase = setup_all(&mut gm, &["ada", "bob"]);
        let phase = play(&phase, &mut gm, "ada", 1).next;
        let phase = play(&phase, &mut gm, "bob", 9).next;

        gm.set_connected(&nick("bob"), false).unwrap();
        assert!(on_disconnect(&phase, &mut gm, &nick("bob")).unwrap().is_none());
    }

    #[test]
    fn test_on_disconnect_closes_planning_when_rest_have_played() {
        let mut gm = game(&["ada", "bob", "cyd"], false);
        let phase = setup_all(&mut gm, &["ada", "bob", "cyd"]);
        let phase = play(&phase, &mut gm, "ada", 5).next;
        let phase = play(&phase, &mut gm, "bob", 3).next;

        gm.set_connected(&nick("cyd"), false).unwrap();
        let t = on_disconnect(&phase, &mut gm, &nick("cyd")).unwrap().unwrap();

        assert_eq!(t.next.current_player(), Some(&nick("bob")));
        assert_eq!(gm.turn_order().last(), Some(&nick("cyd")));
    }

    #[test]
    fn test_finish_announces_winner() {
        let gm = game(&["ada", "bob"], false);
        let t = finish(&gm);

        assert!(t.next.is_over());
        assert!(has(&t.messages, |m| matches!(m, ServerMessage::GameOver { winner: None })));
    }

    #[test]
    fn test_opening_starts_in_setup() {
        let gm = game(&["ada", "bob"], false);
        let t = opening(&gm);

        assert_eq!(t.next, Phase::Setup);
        assert!(matches!(t.messages[0].1, ServerMessage::InitialBoardStatus { .. }));
        assert_eq!(t.messages.len(), 3);
    }
}
