//! Session types: the server's record of one player's connection.

use eriantys_core::Nickname;
use eriantys_protocol::ServerMessage;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// The sending half of a player's connection. The transport owns the
/// receiving half and writes whatever arrives to the socket.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a disconnected player has to reconnect
    /// before the session expires.
    ///
    /// Default: 60 seconds, the same as a match's disconnect timer.
    pub reconnect_grace_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of a session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(timeout)──→ Expired
///       ↑                            │
///       └────────(reconnect)─────────┘
/// ```
///
/// Uses Tokio's `Instant` so paused-clock tests can drive expiry.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Player is connected and has an outbox.
    Connected,

    /// Player disconnected at `since` and may come back until
    /// `since + grace`.
    Disconnected { since: Instant },

    /// Grace period elapsed; waiting for cleanup.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session on the server.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which player this session belongs to.
    pub nickname: Nickname,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Secret the player presents to resume after a disconnect. A
    /// 32-character hex string.
    pub reconnect_token: String,

    /// The live connection. `None` unless `state` is `Connected`.
    pub outbox: Option<Outbox>,
}

impl Session {
    /// Returns `true` while the session has a live outbox.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected)
            && self.outbox.as_ref().is_some_and(|o| !o.is_closed())
    }
}
