//! Wire protocol for Eriantys.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`Envelope`], [`ClientAction`], [`ServerMessage`],
//!   [`Recipient`]) — the messages themselves.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how they become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong on the way.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about connections or matches. Framing
//! and socket I/O belong to whatever transport sits in front of the
//! server; matches only ever see decoded [`Envelope`]s.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Match (rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientAction, Envelope, Hand, MatchId, PhaseName, PlayedCard, Recipient, ServerMessage,
    SetupChoice,
};
