//! # Eriantys
//!
//! Server core for the Eriantys board game: a rule engine, a phase state
//! machine per match, and a server-wide player directory.
//!
//! The crate stops at decoded messages. A transport (WebSocket, TCP, a
//! test harness) connects players with [`GameServer::connect`], forwards
//! their frames to [`GameServer::deliver_bytes`] and writes whatever
//! arrives in each [`Connection::inbox`] back to the socket.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eriantys::prelude::*;
//!
//! # async fn demo() -> Result<(), EriantysError> {
//! eriantys::telemetry::init_tracing();
//! let server = GameServer::builder().build();
//!
//! let ada = server.connect("ada").await?;
//! let match_id = server.create_match(MatchConfig::default()).await?;
//! server.join_match(&ada.nickname, match_id).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod server;
pub mod telemetry;

pub use error::EriantysError;
pub use server::{Connection, GameServer, GameServerBuilder};

/// Common imports for transports built on this crate.
pub mod prelude {
    pub use crate::{Connection, EriantysError, GameServer, GameServerBuilder};
    pub use eriantys_core::{
        Category, CharacterId, CharacterParams, Destination, GameError, Nickname, TowerColor,
        Wizard,
    };
    pub use eriantys_match::{MatchConfig, MatchError, MatchInfo, MatchState};
    pub use eriantys_protocol::{
        ClientAction, Codec, Envelope, JsonCodec, MatchId, PhaseName, ProtocolError,
        ServerMessage,
    };
    pub use eriantys_session::{SessionConfig, SessionError};
}
