//! Match manager: creates, tracks, and routes players to matches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use eriantys_core::{Nickname, Rules};
use eriantys_protocol::{ClientAction, MatchId};

use crate::game::spawn_game;
use crate::{GameHandle, MatchConfig, MatchError, MatchInfo, PlayerSender};

/// Counter for generating unique match IDs.
static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for game actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Manages all running matches and tracks which player sits where.
///
/// This is the entry point for match operations from the server facade.
#[derive(Default)]
pub struct MatchManager {
    /// Running matches, keyed by match ID.
    matches: HashMap<MatchId, GameHandle>,

    /// Maps each player to the match they're seated in.
    /// A player sits in at most ONE match at a time.
    player_matches: HashMap<Nickname, MatchId>,
}

impl MatchManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new match and returns its ID.
    ///
    /// # Errors
    /// [`MatchError::Rule`] if the table size is not supported.
    pub fn create_match(&mut self, config: MatchConfig) -> Result<MatchId, MatchError> {
        Rules::for_players(config.player_count)?;
        if config.min_connected > config.player_count {
            return Err(MatchError::InvalidState(format!(
                "{} connected players required at a table of {}",
                config.min_connected, config.player_count
            )));
        }

        let match_id = MatchId(NEXT_MATCH_ID.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            %match_id,
            players = config.player_count,
            expert = config.expert,
            "match created"
        );
        let handle = spawn_game(match_id, config, DEFAULT_CHANNEL_SIZE);
        self.matches.insert(match_id, handle);
        Ok(match_id)
    }

    /// Seats a player in a match.
    ///
    /// Enforces the "one match at a time" invariant.
    pub async fn join_match(
        &mut self,
        nickname: Nickname,
        match_id: MatchId,
        sender: PlayerSender,
    ) -> Result<(), MatchError> {
        if let Some(current) = self.player_matches.get(&nickname) {
            return Err(MatchError::AlreadyInMatch(nickname, *current));
        }

        let handle = self
            .matches
            .get(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;

        handle.join(nickname.clone(), sender).await?;
        self.player_matches.insert(nickname, match_id);
        Ok(())
    }

    /// Routes a player action to their match.
    pub async fn route_message(
        &self,
        nickname: &Nickname,
        action: ClientAction,
    ) -> Result<(), MatchError> {
        let handle = self.handle_of(nickname)?;
        handle.send_message(nickname.clone(), action).await
    }

    /// Tells a player's match they lost their connection.
    ///
    /// Before the match starts this frees their seat.
    pub async fn disconnect(&mut self, nickname: &Nickname) -> Result<(), MatchError> {
        let handle = self.handle_of(nickname)?;
        let kept = handle.disconnect(nickname.clone()).await?;
        if !kept {
            self.player_matches.remove(nickname);
        }
        Ok(())
    }

    /// Reattaches a player to the match they were seated in.
    pub async fn reconnect(
        &self,
        nickname: &Nickname,
        sender: PlayerSender,
    ) -> Result<MatchId, MatchError> {
        let handle = self.handle_of(nickname)?;
        handle.reconnect(nickname.clone(), sender).await?;
        Ok(handle.match_id())
    }

    /// Returns info about one match.
    pub async fn match_info(&self, match_id: MatchId) -> Result<MatchInfo, MatchError> {
        let handle = self
            .matches
            .get(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;
        handle.get_info().await
    }

    /// Shuts a match down and frees every seat in it.
    pub async fn destroy_match(&mut self, match_id: MatchId) -> Result<(), MatchError> {
        let handle = self
            .matches
            .remove(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;

        let _ = handle.shutdown().await;
        self.player_matches.retain(|_, id| *id != match_id);

        tracing::info!(%match_id, "match destroyed");
        Ok(())
    }

    /// The match a player is seated in, if any.
    pub fn match_of(&self, nickname: &Nickname) -> Option<MatchId> {
        self.player_matches.get(nickname).copied()
    }

    /// Lists matches still waiting for players.
    ///
    /// Matches that fail to respond (shutting down) are skipped.
    pub async fn open_matches(&self) -> Vec<MatchInfo> {
        let mut infos = Vec::with_capacity(self.matches.len());
        for handle in self.matches.values() {
            if let Ok(info) = handle.get_info().await {
                if info.state.is_joinable() {
                    infos.push(info);
                }
            }
        }
        infos.sort_by_key(|info| info.match_id.0);
        infos
    }

    /// Returns the number of running matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    fn handle_of(&self, nickname: &Nickname) -> Result<&GameHandle, MatchError> {
        let match_id = self
            .player_matches
            .get(nickname)
            .ok_or_else(|| MatchError::NotInMatch(nickname.clone()))?;
        self.matches
            .get(match_id)
            .ok_or(MatchError::NotFound(*match_id))
    }
}
