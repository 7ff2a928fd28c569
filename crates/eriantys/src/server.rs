//! `GameServer` builder and request routing.
//!
//! This is the entry point for a transport: it ties the layers together.
//!
//! ```text
//! bytes ─→ Codec ─→ Envelope ─→ SessionManager (is the sender live?)
//!                                   │
//!                                   ▼
//!                             MatchManager ─→ game actor ─→ outboxes
//! ```
//!
//! Framing and sockets stay with the caller. A transport calls
//! [`GameServer::connect`] when a player arrives, pumps the returned
//! inbox to the socket, and feeds incoming frames to
//! [`GameServer::deliver_bytes`].

use eriantys_core::Nickname;
use eriantys_match::{MatchConfig, MatchInfo, MatchManager};
use eriantys_protocol::{Codec, Envelope, JsonCodec, MatchId, ServerMessage};
use eriantys_session::{SessionConfig, SessionError, SessionManager};
use tokio::sync::{Mutex, mpsc};

use crate::EriantysError;

/// A player's end of a live connection.
#[derive(Debug)]
pub struct Connection {
    /// Who is connected.
    pub nickname: Nickname,

    /// Secret for [`GameServer::reconnect`] after a drop.
    pub token: String,

    /// Everything the server sends this player.
    pub inbox: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Builder for configuring a [`GameServer`].
///
/// # Example
///
/// ```rust
/// use eriantys::prelude::*;
///
/// let server = GameServer::builder().reconnect_grace_secs(30).build();
/// # let _ = server;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GameServerBuilder {
    session_config: SessionConfig,
}

impl GameServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how long a dropped player may come back with their token.
    pub fn reconnect_grace_secs(mut self, secs: u64) -> Self {
        self.session_config.reconnect_grace_secs = secs;
        self
    }

    /// Builds a server speaking JSON.
    pub fn build(self) -> GameServer<JsonCodec> {
        self.build_with_codec(JsonCodec)
    }

    /// Builds a server with a custom codec.
    pub fn build_with_codec<C: Codec>(self, codec: C) -> GameServer<C> {
        GameServer {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            matches: Mutex::new(MatchManager::new()),
            codec,
        }
    }
}

/// The server core: the player directory plus every running match.
///
/// Share it across connection tasks with an `Arc`. Locks are taken
/// sessions first, matches second, and the sessions lock is released
/// before a match is contacted.
pub struct GameServer<C: Codec = JsonCodec> {
    sessions: Mutex<SessionManager>,
    matches: Mutex<MatchManager>,
    codec: C,
}

impl GameServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }
}

impl<C: Codec> GameServer<C> {
    /// Registers a new connection under `nickname`.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the nickname is in use.
    pub async fn connect(
        &self,
        nickname: impl Into<Nickname>,
    ) -> Result<Connection, EriantysError> {
        let nickname = nickname.into();
        let (outbox, inbox) = mpsc::unbounded_channel();
        let token = {
            let mut sessions = self.sessions.lock().await;
            sessions.create(nickname.clone(), outbox)?.reconnect_token.clone()
        };
        Ok(Connection {
            nickname,
            token,
            inbox,
        })
    }

    /// Opens a new match and returns its ID.
    pub async fn create_match(&self, config: MatchConfig) -> Result<MatchId, EriantysError> {
        let mut matches = self.matches.lock().await;
        Ok(matches.create_match(config)?)
    }

    /// Seats a connected player in a match.
    ///
    /// # Errors
    /// [`SessionError::NotConnected`] for a player without a live
    /// connection, or any [`MatchError`](eriantys_match::MatchError) from
    /// the join.
    pub async fn join_match(
        &self,
        nickname: &Nickname,
        match_id: MatchId,
    ) -> Result<(), EriantysError> {
        let outbox = self.sessions.lock().await.outbox(nickname)?;
        let mut matches = self.matches.lock().await;
        matches
            .join_match(nickname.clone(), match_id, outbox)
            .await?;
        Ok(())
    }

    /// Routes a decoded envelope to the sender's match.
    ///
    /// The answer (`Accepted` or `Refused`) arrives in the sender's inbox.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidMessage`](eriantys_protocol::ProtocolError)
    ///   if the envelope fails its checks.
    /// - [`SessionError::NotConnected`] if the sender has no live
    ///   connection.
    /// - [`MatchError::NotInMatch`](eriantys_match::MatchError) if the
    ///   sender is not seated anywhere.
    pub async fn deliver(&self, envelope: Envelope) -> Result<(), EriantysError> {
        envelope.validate()?;
        if !self.sessions.lock().await.is_connected(&envelope.sender) {
            return Err(SessionError::NotConnected(envelope.sender).into());
        }
        tracing::debug!(
            sender = %envelope.sender,
            seq = envelope.seq,
            action = envelope.payload.name(),
            "routing action"
        );
        let matches = self.matches.lock().await;
        matches
            .route_message(&envelope.sender, envelope.payload)
            .await?;
        Ok(())
    }

    /// Decodes a raw frame and routes it like [`deliver`](Self::deliver).
    pub async fn deliver_bytes(&self, frame: &[u8]) -> Result<(), EriantysError> {
        let envelope = self.codec.decode_envelope(frame)?;
        self.deliver(envelope).await
    }

    /// Encodes an outbound message with the server's codec.
    pub fn encode(&self, message: &ServerMessage) -> Result<Vec<u8>, EriantysError> {
        Ok(self.codec.encode(message)?)
    }

    /// Records a dropped connection and tells the player's match.
    pub async fn disconnect(&self, nickname: &Nickname) -> Result<(), EriantysError> {
        self.sessions.lock().await.disconnect(nickname)?;
        let mut matches = self.matches.lock().await;
        if matches.match_of(nickname).is_some() {
            matches.disconnect(nickname).await?;
        }
        Ok(())
    }

    /// Resumes a session with its token. If the player holds a seat, the
    /// match re-sends the full board to the new inbox.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] or [`SessionError::SessionExpired`].
    pub async fn reconnect(&self, token: &str) -> Result<Connection, EriantysError> {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let (nickname, token) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.reconnect(token, outbox.clone())?;
            (session.nickname.clone(), session.reconnect_token.clone())
        };

        let matches = self.matches.lock().await;
        if matches.match_of(&nickname).is_some() {
            matches.reconnect(&nickname, outbox).await?;
        }
        Ok(Connection {
            nickname,
            token,
            inbox,
        })
    }

    /// Expires sessions past their grace period and forgets them.
    /// Returns who was dropped.
    pub async fn expire_stale(&self) -> Vec<Nickname> {
        let mut sessions = self.sessions.lock().await;
        let expired = sessions.expire_stale();
        sessions.cleanup_expired();
        expired
    }

    /// The match a player is seated in, if any.
    pub async fn match_of(&self, nickname: &Nickname) -> Option<MatchId> {
        self.matches.lock().await.match_of(nickname)
    }

    /// Returns info about one match.
    pub async fn match_info(&self, match_id: MatchId) -> Result<MatchInfo, EriantysError> {
        let matches = self.matches.lock().await;
        Ok(matches.match_info(match_id).await?)
    }

    /// Matches still waiting for players.
    pub async fn open_matches(&self) -> Vec<MatchInfo> {
        self.matches.lock().await.open_matches().await
    }

    /// Shuts a finished (or abandoned) match down.
    pub async fn destroy_match(&self, match_id: MatchId) -> Result<(), EriantysError> {
        let mut matches = self.matches.lock().await;
        Ok(matches.destroy_match(match_id).await?)
    }
}
