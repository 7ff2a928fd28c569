//! Server-wide player directory for Eriantys.
//!
//! This crate tracks who is connected to the server:
//!
//! 1. **Session tracking** — one [`Session`] per nickname, holding the
//!    player's live outbound channel ([`SessionManager`]).
//! 2. **Delivery** — sending a [`ServerMessage`] to a nickname, failing
//!    with [`SessionError::NotConnected`] when nobody is listening.
//! 3. **Reconnection** — token-based resume within a grace period.
//!
//! # How it fits in the stack
//!
//! ```text
//! Match Layer (above)  ← gets each player's outbox from the directory
//!     ↕
//! Session Layer (this crate)  ← nickname → connection
//!     ↕
//! Protocol Layer (below)  ← provides ServerMessage
//! ```
//!
//! [`ServerMessage`]: eriantys_protocol::ServerMessage

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Outbox, Session, SessionConfig, SessionState};
