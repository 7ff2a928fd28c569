//! Integration tests for match coordination, driven through
//! `MatchManager` with real game actors.
//!
//! `match_info` doubles as a barrier: the actor handles commands in
//! order, so once it answers, every earlier action has been applied and
//! its messages are sitting in the outboxes.

use std::time::Duration;

use eriantys_core::{Destination, GameError, Nickname, Wizard};
use eriantys_protocol::{ClientAction, MatchId, PhaseName, ServerMessage};
use eriantys_match::{MatchConfig, MatchError, MatchInfo, MatchManager, MatchState};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

fn nick(name: &str) -> Nickname {
    Nickname::from(name)
}

fn seeded() -> MatchConfig {
    MatchConfig {
        seed: Some(5),
        ..MatchConfig::default()
    }
}

/// Drains everything delivered so far.
fn drain(inbox: &mut Inbox) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = inbox.try_recv() {
        out.push(msg);
    }
    out
}

async fn info(mgr: &MatchManager, id: MatchId) -> MatchInfo {
    mgr.match_info(id).await.unwrap()
}

/// Creates a 2-player match with ada and bob seated.
async fn two_player_match(mgr: &mut MatchManager, config: MatchConfig) -> (MatchId, Inbox, Inbox) {
    let id = mgr.create_match(config).unwrap();
    let (ada_tx, ada_rx) = mpsc::unbounded_channel();
    let (bob_tx, bob_rx) = mpsc::unbounded_channel();
    mgr.join_match(nick("ada"), id, ada_tx).await.unwrap();
    mgr.join_match(nick("bob"), id, bob_tx).await.unwrap();
    (id, ada_rx, bob_rx)
}

async fn send(mgr: &MatchManager, who: &str, action: ClientAction) {
    mgr.route_message(&nick(who), action).await.unwrap();
}

/// Creates a 3-player match with ada, bob and cyd seated, setup done.
async fn three_player_table(mgr: &mut MatchManager) -> (MatchId, [Inbox; 3]) {
    let id = mgr
        .create_match(MatchConfig {
            player_count: 3,
            ..seeded()
        })
        .unwrap();
    let mut inboxes = Vec::new();
    for name in ["ada", "bob", "cyd"] {
        let (tx, rx) = mpsc::unbounded_channel();
        mgr.join_match(nick(name), id, tx).await.unwrap();
        inboxes.push(rx);
    }
    for (i, (name, tower)) in [("ada", "white"), ("bob", "black"), ("cyd", "grey")]
        .into_iter()
        .enumerate()
    {
        send(mgr, name, ClientAction::SelectSetup {
            tower: tower.parse().unwrap(),
            wizard: Wizard::ALL[i],
        })
        .await;
    }
    (id, inboxes.try_into().unwrap())
}

/// Both players pick distinct colours and wizards.
async fn finish_setup(mgr: &MatchManager) {
    send(mgr, "ada", ClientAction::SelectSetup {
        tower: "white".parse().unwrap(),
        wizard: Wizard::ALL[0],
    })
    .await;
    send(mgr, "bob", ClientAction::SelectSetup {
        tower: "black".parse().unwrap(),
        wizard: Wizard::ALL[1],
    })
    .await;
}

/// Setup plus one planning round: ada lays 6, bob lays 2.
async fn to_first_turn(mgr: &MatchManager) {
    finish_setup(mgr).await;
    send(mgr, "ada", ClientAction::PlayAssistant { card: 6 }).await;
    send(mgr, "bob", ClientAction::PlayAssistant { card: 2 }).await;
}

fn last_refusal(messages: &[ServerMessage]) -> Option<&str> {
    messages.iter().rev().find_map(|m| match m {
        ServerMessage::Refused { reason } => Some(reason.as_str()),
        _ => None,
    })
}

// =========================================================================
// MatchManager bookkeeping
// =========================================================================

#[tokio::test]
async fn test_create_match_returns_unique_ids() {
    let mut mgr = MatchManager::new();
    let m1 = mgr.create_match(MatchConfig::default()).unwrap();
    let m2 = mgr.create_match(MatchConfig::default()).unwrap();
    assert_ne!(m1, m2);
    assert_eq!(mgr.match_count(), 2);
}

#[tokio::test]
async fn test_create_match_unsupported_table_size_is_refused() {
    let mut mgr = MatchManager::new();
    let result = mgr.create_match(MatchConfig {
        player_count: 4,
        ..MatchConfig::default()
    });
    assert!(matches!(result, Err(MatchError::Rule(GameError::Validation(_)))));
    assert_eq!(mgr.match_count(), 0);
}

#[tokio::test]
async fn test_join_match_success() {
    let mut mgr = MatchManager::new();
    let id = mgr.create_match(MatchConfig::default()).unwrap();

    mgr.join_match(nick("ada"), id, mpsc::unbounded_channel().0)
        .await
        .unwrap();

    assert_eq!(mgr.match_of(&nick("ada")), Some(id));
    let info = info(&mgr, id).await;
    assert_eq!(info.state, MatchState::WaitingForPlayers);
    assert_eq!(info.players, vec![nick("ada")]);
}

#[tokio::test]
async fn test_join_match_not_found() {
    let mut mgr = MatchManager::new();
    let result = mgr
        .join_match(nick("ada"), MatchId(999_999), mpsc::unbounded_channel().0)
        .await;
    assert_eq!(result.unwrap_err(), MatchError::NotFound(MatchId(999_999)));
}

#[tokio::test]
async fn test_join_match_one_match_at_a_time() {
    let mut mgr = MatchManager::new();
    let m1 = mgr.create_match(MatchConfig::default()).unwrap();
    let m2 = mgr.create_match(MatchConfig::default()).unwrap();

    mgr.join_match(nick("ada"), m1, mpsc::unbounded_channel().0)
        .await
        .unwrap();
    let result = mgr
        .join_match(nick("ada"), m2, mpsc::unbounded_channel().0)
        .await;

    assert_eq!(result.unwrap_err(), MatchError::AlreadyInMatch(nick("ada"), m1));
}

#[tokio::test]
async fn test_join_match_full_table_is_refused() {
    let mut mgr = MatchManager::new();
    let (id, _a, _b) = two_player_match(&mut mgr, seeded()).await;

    let result = mgr
        .join_match(nick("cyd"), id, mpsc::unbounded_channel().0)
        .await;

    assert_eq!(result.unwrap_err(), MatchError::Full(id));
    assert_eq!(mgr.match_of(&nick("cyd")), None);
}

#[tokio::test]
async fn test_disconnect_before_start_frees_seat() {
    let mut mgr = MatchManager::new();
    let id = mgr.create_match(MatchConfig::default()).unwrap();
    mgr.join_match(nick("ada"), id, mpsc::unbounded_channel().0)
        .await
        .unwrap();

    mgr.disconnect(&nick("ada")).await.unwrap();

    assert_eq!(mgr.match_of(&nick("ada")), None);
    assert!(info(&mgr, id).await.players.is_empty());
}

#[tokio::test]
async fn test_route_message_not_in_match() {
    let mgr = MatchManager::new();
    let result = mgr
        .route_message(&nick("ada"), ClientAction::SelectCloud { index: 0 })
        .await;
    assert_eq!(result.unwrap_err(), MatchError::NotInMatch(nick("ada")));
}

#[tokio::test]
async fn test_destroy_match_frees_players() {
    let mut mgr = MatchManager::new();
    let (id, _a, _b) = two_player_match(&mut mgr, seeded()).await;

    mgr.destroy_match(id).await.unwrap();

    assert_eq!(mgr.match_count(), 0);
    assert_eq!(mgr.match_of(&nick("ada")), None);
    assert!(mgr.destroy_match(id).await.is_err());
}

#[tokio::test]
async fn test_open_matches_lists_joinable_only() {
    let mut mgr = MatchManager::new();
    let waiting = mgr.create_match(MatchConfig::default()).unwrap();
    let _ = two_player_match(&mut mgr, seeded()).await;

    let open = mgr.open_matches().await;

    assert_eq!(open.len(), 1);
    assert_eq!(open[0].match_id, waiting);
}

// =========================================================================
// Phase flow through the actor
// =========================================================================

#[tokio::test]
async fn test_match_start_broadcasts_board_and_setup_phase() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, mut bob) = two_player_match(&mut mgr, seeded()).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.state, MatchState::InProgress);
    assert_eq!(info.phase, PhaseName::Setup);
    for inbox in [&mut ada, &mut bob] {
        let messages = drain(inbox);
        assert!(matches!(messages[0], ServerMessage::InitialBoardStatus { .. }));
        assert!(matches!(messages[1], ServerMessage::UserSelectionUpdate { .. }));
        assert_eq!(messages[2], ServerMessage::PhaseUpdate {
            phase: PhaseName::Setup,
            current_player: None,
        });
    }
}

#[tokio::test]
async fn test_two_player_flow_lower_card_moves_first() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, _bob) = two_player_match(&mut mgr, seeded()).await;

    finish_setup(&mgr).await;
    assert_eq!(info(&mgr, id).await.phase, PhaseName::Planning);

    send(&mgr, "ada", ClientAction::PlayAssistant { card: 6 }).await;
    send(&mgr, "bob", ClientAction::PlayAssistant { card: 2 }).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.phase, PhaseName::MoveTokens);
    assert_eq!(info.current_player, Some(nick("bob")));
    let messages = drain(&mut ada);
    assert!(messages.contains(&ServerMessage::PhaseUpdate {
        phase: PhaseName::MoveTokens,
        current_player: Some(nick("bob")),
    }));
}

#[tokio::test]
async fn test_out_of_turn_action_is_refused() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, _bob) = two_player_match(&mut mgr, seeded()).await;
    to_first_turn(&mgr).await;
    info(&mgr, id).await;
    drain(&mut ada);

    send(&mgr, "ada", ClientAction::MoveToken {
        category: "red".parse().unwrap(),
        destination: Destination::DiningRoom,
    })
    .await;
    info(&mgr, id).await;

    let messages = drain(&mut ada);
    assert_eq!(messages.len(), 1);
    assert!(last_refusal(&messages).is_some_and(|r| r.starts_with("not your turn")));
}

#[tokio::test]
async fn test_planning_card_out_of_order_is_refused() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, mut bob) = two_player_match(&mut mgr, seeded()).await;
    finish_setup(&mgr).await;
    let before = info(&mgr, id).await;
    assert_eq!(before.current_player, Some(nick("ada")));
    drain(&mut ada);
    drain(&mut bob);

    send(&mgr, "bob", ClientAction::PlayAssistant { card: 1 }).await;
    info(&mgr, id).await;

    let messages = drain(&mut bob);
    assert_eq!(messages.len(), 1);
    assert!(last_refusal(&messages).is_some_and(|r| r.starts_with("not your turn")));
    assert!(drain(&mut ada).is_empty());

    send(&mgr, "ada", ClientAction::PlayAssistant { card: 1 }).await;
    let after = info(&mgr, id).await;

    assert_eq!(after.phase, PhaseName::Planning);
    assert_eq!(after.current_player, Some(nick("bob")));
    assert_eq!(drain(&mut ada)[0], ServerMessage::Accepted);
}

#[tokio::test]
async fn test_wrong_action_for_phase_is_unexpected_message() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, _bob) = two_player_match(&mut mgr, seeded()).await;
    finish_setup(&mgr).await;
    info(&mgr, id).await;
    drain(&mut ada);

    send(&mgr, "ada", ClientAction::SelectCloud { index: 0 }).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.phase, PhaseName::Planning);
    let messages = drain(&mut ada);
    assert!(last_refusal(&messages).is_some_and(|r| r.starts_with("unexpected message")));
}

#[tokio::test]
async fn test_duplicate_setup_choice_is_refused() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, mut bob) = two_player_match(&mut mgr, seeded()).await;
    send(&mgr, "ada", ClientAction::SelectSetup {
        tower: "white".parse().unwrap(),
        wizard: Wizard::ALL[0],
    })
    .await;
    info(&mgr, id).await;
    drain(&mut ada);
    drain(&mut bob);

    send(&mgr, "bob", ClientAction::SelectSetup {
        tower: "white".parse().unwrap(),
        wizard: Wizard::ALL[1],
    })
    .await;
    info(&mgr, id).await;

    assert!(last_refusal(&drain(&mut bob)).is_some());
    assert!(drain(&mut ada).is_empty(), "refusals go only to the sender");
}

// =========================================================================
// Disconnects
// =========================================================================

#[tokio::test]
async fn test_turn_holder_disconnect_skips_turn() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, _bob) = two_player_match(&mut mgr, seeded()).await;
    to_first_turn(&mgr).await;
    info(&mgr, id).await;
    drain(&mut ada);

    mgr.disconnect(&nick("bob")).await.unwrap();
    let info = info(&mgr, id).await;

    assert_eq!(info.current_player, Some(nick("ada")));
    assert_eq!(info.connected, 1);
    let messages = drain(&mut ada);
    assert_eq!(messages[0], ServerMessage::PlayerDisconnected { player: nick("bob") });
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_timer_ends_match_with_too_few_players() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, _bob) = two_player_match(&mut mgr, seeded()).await;
    finish_setup(&mgr).await;
    info(&mgr, id).await;
    drain(&mut ada);

    mgr.disconnect(&nick("bob")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(info(&mgr, id).await.state, MatchState::InProgress);

    tokio::time::sleep(Duration::from_secs(31)).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.state, MatchState::Finished);
    assert_eq!(info.phase, PhaseName::GameOver);
    assert!(drain(&mut ada).contains(&ServerMessage::GameOver {
        winner: Some(nick("ada"))
    }));
}

#[tokio::test(start_paused = true)]
async fn test_second_disconnect_gets_full_grace_period() {
    let mut mgr = MatchManager::new();
    let (id, [mut ada, _bob, _cyd]) = three_player_table(&mut mgr).await;
    assert_eq!(info(&mgr, id).await.phase, PhaseName::Planning);

    mgr.disconnect(&nick("cyd")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(59)).await;
    mgr.disconnect(&nick("bob")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(info(&mgr, id).await.state, MatchState::InProgress);

    tokio::time::sleep(Duration::from_secs(59)).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.state, MatchState::Finished);
    assert!(drain(&mut ada).contains(&ServerMessage::GameOver {
        winner: Some(nick("ada"))
    }));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_before_timer_resyncs_and_keeps_match() {
    let mut mgr = MatchManager::new();
    let (id, mut ada, _bob) = two_player_match(&mut mgr, seeded()).await;
    finish_setup(&mgr).await;
    mgr.disconnect(&nick("bob")).await.unwrap();
    info(&mgr, id).await;
    drain(&mut ada);

    let (bob_tx, mut bob) = mpsc::unbounded_channel();
    let rejoined = mgr.reconnect(&nick("bob"), bob_tx).await.unwrap();
    assert_eq!(rejoined, id);

    tokio::time::sleep(Duration::from_secs(120)).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.state, MatchState::InProgress);
    assert_eq!(info.phase, PhaseName::Planning);
    let resync = drain(&mut bob);
    assert!(matches!(resync[0], ServerMessage::InitialBoardStatus { .. }));
    assert_eq!(resync[1], ServerMessage::PhaseUpdate {
        phase: PhaseName::Planning,
        current_player: Some(nick("ada")),
    });
    assert_eq!(drain(&mut ada), vec![ServerMessage::PlayerReconnected {
        player: nick("bob")
    }]);
}

#[tokio::test]
async fn test_reconnect_while_connected_is_refused() {
    let mut mgr = MatchManager::new();
    let (_id, _ada, _bob) = two_player_match(&mut mgr, seeded()).await;

    let result = mgr
        .reconnect(&nick("ada"), mpsc::unbounded_channel().0)
        .await;

    assert!(matches!(result, Err(MatchError::InvalidState(_))));
}

#[tokio::test]
async fn test_messages_to_dropped_outbox_do_not_stop_broadcast() {
    let mut mgr = MatchManager::new();
    let (id, ada, mut bob) = two_player_match(&mut mgr, seeded()).await;
    drop(ada);

    finish_setup(&mgr).await;
    let info = info(&mgr, id).await;

    assert_eq!(info.phase, PhaseName::Planning);
    assert!(drain(&mut bob)
        .iter()
        .any(|m| matches!(m, ServerMessage::AssistantCardUpdate { .. })));
}
