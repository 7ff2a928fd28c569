//! Match coordination for Eriantys.
//!
//! Each match runs as an isolated Tokio task (actor model) that owns its
//! [`GameManager`](eriantys_core::GameManager) and walks it through the
//! phase state machine.
//!
//! # Key types
//!
//! - [`Phase`] and [`transition`] — the phase state machine
//! - [`MatchManager`] — creates/destroys matches, routes players
//! - [`GameHandle`] — send commands to a running match
//! - [`MatchState`] — match lifecycle
//! - [`MatchConfig`] — table size, expert mode, disconnect timer

mod config;
mod error;
mod game;
mod manager;
pub mod phase;

pub use config::{MatchConfig, MatchState};
pub use error::MatchError;
pub use game::{GameHandle, MatchInfo, PlayerSender};
pub use manager::MatchManager;
pub use phase::{Phase, Transition, transition};
