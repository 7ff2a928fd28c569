//! The session manager: the server-wide nickname → connection directory.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap`, not a concurrent one. The server
//! facade wraps it in a `tokio::sync::Mutex` and takes the lock for every
//! connect, disconnect and lookup.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use eriantys_core::Nickname;
use eriantys_protocol::ServerMessage;
use rand::Rng;
use tokio::time::Instant;

use crate::{Outbox, Session, SessionConfig, SessionError, SessionState};

/// Tracks every connected (or recently disconnected) player.
///
/// ```text
/// create() ──→ disconnect() ──→ reconnect()
///    │               │                │
///    ▼               ▼                ▼
/// [Connected]   [Disconnected]   [Connected]
///                    │
///                    ▼ expire_stale() after the grace period
///                [Expired] ──→ cleanup_expired()
/// ```
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<Nickname, Session>,

    /// Reconnection token → nickname, kept in sync with `sessions`.
    tokens: HashMap<String, Nickname>,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates an empty directory.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Registers a new connection for `nickname`.
    ///
    /// A disconnected or expired session under the same nickname is
    /// replaced, and its token stops working.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the nickname is in use by a
    /// live connection.
    pub fn create(&mut self, nickname: Nickname, outbox: Outbox) -> Result<&Session, SessionError> {
        if let Some(existing) = self.sessions.get(&nickname) {
            if existing.is_connected() {
                return Err(SessionError::AlreadyConnected(nickname));
            }
            self.tokens.remove(&existing.reconnect_token);
        }

        let token = generate_token();
        let session = Session {
            nickname: nickname.clone(),
            state: SessionState::Connected,
            reconnect_token: token.clone(),
            outbox: Some(outbox),
        };
        self.tokens.insert(token, nickname.clone());

        tracing::info!(%nickname, "session created");

        Ok(match self.sessions.entry(nickname) {
            Entry::Occupied(mut slot) => {
                slot.insert(session);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(session),
        })
    }

    /// Marks a player as disconnected and drops their outbox. Starts the
    /// grace period.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, nickname: &Nickname) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(nickname)
            .ok_or_else(|| SessionError::NotFound(nickname.clone()))?;

        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };
        session.outbox = None;

        tracing::info!(%nickname, "player disconnected, grace period started");
        Ok(())
    }

    /// Resumes a session with its reconnection token and a fresh outbox.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] — token not recognized
    /// - [`SessionError::SessionExpired`] — grace period elapsed
    /// - [`SessionError::AlreadyConnected`] — the session never dropped
    pub fn reconnect(&mut self, token: &str, outbox: Outbox) -> Result<&Session, SessionError> {
        let grace = self.grace();
        let nickname = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(SessionError::InvalidToken)?;
        let session = self
            .sessions
            .get_mut(&nickname)
            .ok_or(SessionError::InvalidToken)?;

        match &session.state {
            SessionState::Disconnected { since } => {
                if since.elapsed() >= grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::SessionExpired(nickname));
                }
                session.state = SessionState::Connected;
                session.outbox = Some(outbox);
                tracing::info!(%nickname, "player reconnected");
                Ok(session)
            }
            SessionState::Connected => Err(SessionError::AlreadyConnected(nickname)),
            SessionState::Expired => Err(SessionError::SessionExpired(nickname)),
        }
    }

    /// Delivers `message` to `nickname`.
    ///
    /// # Errors
    /// [`SessionError::NotConnected`] if the player has no live outbox,
    /// including when the transport already dropped the receiving end.
    pub fn send(&self, nickname: &Nickname, message: ServerMessage) -> Result<(), SessionError> {
        let outbox = self.outbox(nickname)?;
        outbox
            .send(message)
            .map_err(|_| SessionError::NotConnected(nickname.clone()))
    }

    /// A clone of `nickname`'s outbox, for handing to a match.
    ///
    /// # Errors
    /// [`SessionError::NotConnected`] if the player has no live outbox.
    pub fn outbox(&self, nickname: &Nickname) -> Result<Outbox, SessionError> {
        self.sessions
            .get(nickname)
            .filter(|s| s.is_connected())
            .and_then(|s| s.outbox.clone())
            .ok_or_else(|| SessionError::NotConnected(nickname.clone()))
    }

    /// Expires every disconnected session past the grace period and
    /// returns their nicknames.
    pub fn expire_stale(&mut self) -> Vec<Nickname> {
        let grace = self.grace();
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = &session.state {
                if since.elapsed() >= grace {
                    session.state = SessionState::Expired;
                    expired.push(session.nickname.clone());
                    tracing::info!(
                        nickname = %session.nickname,
                        "session expired (grace period elapsed)"
                    );
                }
            }
        }

        expired
    }

    /// Removes expired sessions. Kept separate from [`expire_stale`] so
    /// callers can tell the affected matches first.
    ///
    /// [`expire_stale`]: SessionManager::expire_stale
    pub fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                self.tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    /// Looks up a session.
    pub fn get(&self, nickname: &Nickname) -> Option<&Session> {
        self.sessions.get(nickname)
    }

    /// Returns `true` if `nickname` has a live connection.
    pub fn is_connected(&self, nickname: &Nickname) -> bool {
        self.sessions.get(nickname).is_some_and(Session::is_connected)
    }

    /// Number of sessions in any state.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn grace(&self) -> Duration {
        Duration::from_secs(self.config.reconnect_grace_secs)
    }
}

/// A random 32-character hex string (128 bits).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
