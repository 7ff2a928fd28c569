//! Game actor: an isolated Tokio task that owns one match.
//!
//! Each match runs in its own task and talks to the outside world through
//! an mpsc channel. Nothing is shared: the [`GameManager`] lives inside
//! the task, and every player action reaches it as a message, one at a
//! time.
//!
//! ```text
//!  MatchManager ──GameCommand──→ ┌────────────────────────────┐
//!                                │ GameActor                  │
//!                                │  phase ─→ transition() ──┐ │
//!                                │  GameManager ←───────────┘ │
//!                                └──────────┬─────────────────┘
//!                                           │ ServerMessage
//!                               ┌───────────┼───────────┐
//!                               ▼           ▼           ▼
//!                            outbox      outbox      outbox
//! ```

use std::collections::HashMap;

use eriantys_core::{GameManager, Nickname};
use eriantys_protocol::{ClientAction, MatchId, PhaseName, Recipient, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

use crate::phase::{self, Phase, Transition};
use crate::{MatchConfig, MatchError, MatchState};

/// Channel sender for delivering server messages to one player.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a game actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the answer on it.
pub(crate) enum GameCommand {
    /// Take a seat.
    Join {
        nickname: Nickname,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// A seated player lost their connection. Replies whether the seat is
    /// kept (it is not before the match started).
    Disconnect {
        nickname: Nickname,
        reply: oneshot::Sender<Result<bool, MatchError>>,
    },

    /// A seated player is back with a fresh outbox.
    Reconnect {
        nickname: Nickname,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// A player action. The answer goes to the player's outbox.
    Message {
        sender: Nickname,
        action: ClientAction,
    },

    /// Request the current match info.
    GetInfo {
        reply: oneshot::Sender<MatchInfo>,
    },

    /// Shut down the match.
    Shutdown,
}

/// A summary of a match (not the board itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    /// The match's unique ID.
    pub match_id: MatchId,
    /// Current lifecycle state.
    pub state: MatchState,
    /// Current phase.
    pub phase: PhaseName,
    /// Whose turn it is, during planning and the action phases.
    pub current_player: Option<Nickname>,
    /// Seated players, in seating order.
    pub players: Vec<Nickname>,
    /// Players with a live connection.
    pub connected: usize,
    /// Seats at the table.
    pub seats: usize,
}

/// Handle to a running game actor.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. The
/// `MatchManager` holds one per match.
#[derive(Clone)]
pub struct GameHandle {
    match_id: MatchId,
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    /// Returns the match's unique ID.
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Asks for a seat.
    pub async fn join(&self, nickname: Nickname, sender: PlayerSender) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Join {
            nickname,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    /// Reports a lost connection. Returns whether the seat is kept.
    pub async fn disconnect(&self, nickname: Nickname) -> Result<bool, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Disconnect {
            nickname,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    /// Reattaches a seated player.
    pub async fn reconnect(
        &self,
        nickname: Nickname,
        sender: PlayerSender,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Reconnect {
            nickname,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    /// Forwards a player action (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: Nickname,
        action: ClientAction,
    ) -> Result<(), MatchError> {
        self.send(GameCommand::Message { sender, action }).await
    }

    /// Requests the current match info.
    pub async fn get_info(&self) -> Result<MatchInfo, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }

    /// Tells the match to shut down.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.send(GameCommand::Shutdown).await
    }

    async fn send(&self, command: GameCommand) -> Result<(), MatchError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct GameActor {
    match_id: MatchId,
    state: MatchState,
    config: MatchConfig,
    /// Seated players, in join order.
    seats: Vec<Nickname>,
    /// Outboxes of the players currently connected.
    senders: HashMap<Nickname, PlayerSender>,
    game: Option<GameManager>,
    phase: Phase,
    /// When to check the connected count after a disconnect.
    deadline: Option<Instant>,
    receiver: mpsc::Receiver<GameCommand>,
}

impl GameActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!(match_id = %self.match_id, "match actor started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline();
                }
            }
        }

        tracing::info!(match_id = %self.match_id, "match actor stopped");
    }

    /// Handles one command. Returns `false` to stop the actor.
    fn handle(&mut self, cmd: GameCommand) -> bool {
        match cmd {
            GameCommand::Join {
                nickname,
                sender,
                reply,
            } => {
                let result = self.handle_join(nickname, sender);
                let _ = reply.send(result);
            }
            GameCommand::Disconnect { nickname, reply } => {
                let result = self.handle_disconnect(nickname);
                let _ = reply.send(result);
            }
            GameCommand::Reconnect {
                nickname,
                sender,
                reply,
            } => {
                let result = self.handle_reconnect(nickname, sender);
                let _ = reply.send(result);
            }
            GameCommand::Message { sender, action } => {
                self.handle_message(sender, action);
            }
            GameCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            GameCommand::Shutdown => {
                tracing::info!(match_id = %self.match_id, "match shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(&mut self, nickname: Nickname, sender: PlayerSender) -> Result<(), MatchError> {
        if self.seats.contains(&nickname) {
            return Err(MatchError::AlreadyInMatch(nickname, self.match_id));
        }
        if self.seats.len() >= self.config.player_count {
            return Err(MatchError::Full(self.match_id));
        }
        if !self.state.is_joinable() {
            return Err(MatchError::InvalidState(format!(
                "cannot join match in state {}",
                self.state
            )));
        }

        self.seats.push(nickname.clone());
        self.senders.insert(nickname.clone(), sender);
        tracing::info!(
            match_id = %self.match_id,
            %nickname,
            players = self.seats.len(),
            "player joined"
        );

        if self.seats.len() == self.config.player_count {
            if let Err(err) = self.start() {
                self.seats.pop();
                self.senders.remove(&nickname);
                return Err(err);
            }
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), MatchError> {
        let mut game = GameManager::from_options(self.seats.clone(), &self.config.game_options())?;
        game.setup_board()?;

        let opening = phase::opening(&game);
        self.game = Some(game);
        self.state = MatchState::InProgress;
        tracing::info!(
            match_id = %self.match_id,
            players = ?self.seats,
            expert = self.config.expert,
            "match started"
        );
        self.apply(opening);
        Ok(())
    }

    fn handle_disconnect(&mut self, nickname: Nickname) -> Result<bool, MatchError> {
        if !self.seats.contains(&nickname) {
            return Err(MatchError::NotInMatch(nickname));
        }
        self.senders.remove(&nickname);

        if self.state.is_joinable() {
            self.seats.retain(|n| *n != nickname);
            tracing::info!(match_id = %self.match_id, %nickname, "player left before start");
            return Ok(false);
        }

        tracing::info!(match_id = %self.match_id, %nickname, "player disconnected");
        self.dispatch(vec![(
            Recipient::AllExcept(nickname.clone()),
            ServerMessage::PlayerDisconnected {
                player: nickname.clone(),
            },
        )]);

        if !self.state.is_active() {
            return Ok(true);
        }
        let Some(game) = self.game.as_mut() else {
            return Ok(true);
        };
        game.set_connected(&nickname, false)?;
        match phase::on_disconnect(&self.phase, game, &nickname) {
            Ok(Some(transition)) => self.apply(transition),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(match_id = %self.match_id, %nickname, %err, "turn skip failed");
            }
        }

        // Every disconnect restarts the full grace period.
        if self.state.is_active() {
            self.deadline = Some(Instant::now() + self.config.reconnect_grace);
            tracing::debug!(
                match_id = %self.match_id,
                grace = ?self.config.reconnect_grace,
                "disconnect timer armed"
            );
        }
        Ok(true)
    }

    fn handle_reconnect(
        &mut self,
        nickname: Nickname,
        sender: PlayerSender,
    ) -> Result<(), MatchError> {
        if !self.seats.contains(&nickname) {
            return Err(MatchError::NotInMatch(nickname));
        }
        if self.senders.contains_key(&nickname) {
            return Err(MatchError::InvalidState(format!(
                "{nickname} is already connected"
            )));
        }
        self.senders.insert(nickname.clone(), sender);

        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };
        game.set_connected(&nickname, true)?;
        if game.connected_count() >= self.config.min_connected && self.deadline.take().is_some() {
            tracing::debug!(match_id = %self.match_id, "disconnect timer cancelled");
        }

        tracing::info!(match_id = %self.match_id, %nickname, "player reconnected");
        let resync = vec![
            (
                Recipient::Player(nickname.clone()),
                ServerMessage::InitialBoardStatus {
                    board: Box::new(game.snapshot()),
                },
            ),
            (
                Recipient::Player(nickname.clone()),
                phase::phase_update(&self.phase),
            ),
            (
                Recipient::AllExcept(nickname.clone()),
                ServerMessage::PlayerReconnected { player: nickname },
            ),
        ];
        self.dispatch(resync);

        let resumed = self
            .game
            .as_ref()
            .and_then(|game| phase::on_reconnect(&self.phase, game));
        if let Some(transition) = resumed {
            self.apply(transition);
        }
        Ok(())
    }

    fn handle_message(&mut self, sender: Nickname, action: ClientAction) {
        if !self.seats.contains(&sender) {
            tracing::warn!(
                match_id = %self.match_id,
                %sender,
                "message from non-member, ignoring"
            );
            return;
        }

        let result = match (self.state, self.game.as_mut()) {
            (MatchState::InProgress, Some(game)) => match self.phase.current_player() {
                Some(holder) if *holder != sender => Err(MatchError::NotYourTurn(holder.clone())),
                _ => phase::transition(&self.phase, game, &sender, action),
            },
            (state, _) => Err(MatchError::InvalidState(format!(
                "no actions are taken while the match is {state}"
            ))),
        };

        match result {
            Ok(transition) => self.apply(transition),
            Err(err) => {
                tracing::debug!(
                    match_id = %self.match_id,
                    %sender,
                    phase = %self.phase.name(),
                    reason = %err,
                    "action refused"
                );
                self.send_to(
                    &sender,
                    ServerMessage::Refused {
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    fn on_deadline(&mut self) {
        self.deadline = None;
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if !self.state.is_active() {
            return;
        }
        let connected = game.connected_count();
        if connected < self.config.min_connected {
            tracing::info!(
                match_id = %self.match_id,
                connected,
                "disconnect timer expired with too few players"
            );
            let ending = phase::finish(game);
            self.apply(ending);
        }
    }

    /// Enters the transition's phase and delivers its messages.
    fn apply(&mut self, transition: Transition) {
        let Transition { next, messages } = transition;
        let before = self.phase.name();
        self.phase = next;
        if self.phase.name() != before {
            tracing::info!(
                match_id = %self.match_id,
                phase = %self.phase.name(),
                current_player = ?self.phase.current_player(),
                "phase changed"
            );
        }
        if self.phase.is_over() {
            self.state = MatchState::Finished;
            self.deadline = None;
        }
        self.dispatch(messages);
    }

    /// Delivers messages to every seated player they address.
    fn dispatch(&self, messages: Vec<(Recipient, ServerMessage)>) {
        for (recipient, message) in messages {
            for nickname in self.seats.iter().filter(|n| recipient.includes(n)) {
                self.send_to(nickname, message.clone());
            }
        }
    }

    /// Sends to one player. A player without a live outbox is skipped.
    fn send_to(&self, nickname: &Nickname, message: ServerMessage) {
        let delivered = self
            .senders
            .get(nickname)
            .is_some_and(|sender| sender.send(message).is_ok());
        if !delivered {
            tracing::warn!(
                match_id = %self.match_id,
                %nickname,
                "player not connected, message skipped"
            );
        }
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            match_id: self.match_id,
            state: self.state,
            phase: self.phase.name(),
            current_player: self.phase.current_player().cloned(),
            players: self.seats.clone(),
            connected: self.senders.len(),
            seats: self.config.player_count,
        }
    }
}

/// Spawns a new game actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_game(
    match_id: MatchId,
    config: MatchConfig,
    channel_size: usize,
) -> GameHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = GameActor {
        match_id,
        state: MatchState::WaitingForPlayers,
        config,
        seats: Vec::new(),
        senders: HashMap::new(),
        game: None,
        phase: Phase::Setup,
        deadline: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    GameHandle {
        match_id,
        sender: tx,
    }
}
