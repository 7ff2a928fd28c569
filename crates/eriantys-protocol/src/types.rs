//! Protocol types for the Eriantys wire format.
//!
//! Every type here travels between client and server. Game vocabulary
//! (categories, tower colours, snapshots) comes from `eriantys-core`; this
//! module only adds the envelope and the message enums around it.

use std::fmt;

use serde::{Deserialize, Serialize};

use eriantys_core::{
    Category, CharacterId, CharacterParams, Destination, GameSnapshot, Nickname, TowerColor,
    Wizard,
};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a running match.
///
/// Serialized as the bare number (`#[serde(transparent)]`), printed as
/// `M-<n>` in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Who a server message is addressed to.
///
/// The match coordinator produces `(Recipient, ServerMessage)` pairs; the
/// delivery layer resolves each recipient against the players in the
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the match.
    All,

    /// One player.
    Player(Nickname),

    /// Everyone but one player.
    AllExcept(Nickname),
}

impl Recipient {
    /// Returns `true` if `nickname` should receive the message.
    pub fn includes(&self, nickname: &Nickname) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Player(p) => p == nickname,
            Recipient::AllExcept(p) => p != nickname,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientAction — what players send
// ---------------------------------------------------------------------------

/// One player action.
///
/// Internally tagged: `{ "type": "SelectCloud", "index": 1 }`. Category,
/// colour, wizard and character literals are parsed through their
/// `TryFrom<String>` impls, so an unknown literal fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// Tower colour and wizard chosen during setup.
    SelectSetup { tower: TowerColor, wizard: Wizard },

    /// Assistant card played during planning, by value (1..=10).
    PlayAssistant { card: u8 },

    /// A token moved out of the entrance.
    MoveToken {
        category: Category,
        destination: Destination,
    },

    /// Mother Nature sent to the island group with this id.
    MoveMotherNature { island: String },

    /// Cloud tile claimed at the end of a turn.
    SelectCloud { index: usize },

    /// Character card activated.
    PlayCharacter {
        card: CharacterId,
        #[serde(default)]
        params: CharacterParams,
    },
}

impl ClientAction {
    /// Short name for logs and refusals.
    pub fn name(&self) -> &'static str {
        match self {
            ClientAction::SelectSetup { .. } => "SelectSetup",
            ClientAction::PlayAssistant { .. } => "PlayAssistant",
            ClientAction::MoveToken { .. } => "MoveToken",
            ClientAction::MoveMotherNature { .. } => "MoveMotherNature",
            ClientAction::SelectCloud { .. } => "SelectCloud",
            ClientAction::PlayCharacter { .. } => "PlayCharacter",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage — what the server sends back
// ---------------------------------------------------------------------------

/// Phase names as clients see them. Help text is keyed by these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    Setup,
    Planning,
    MoveTokens,
    MoveMotherNature,
    SelectCloud,
    GameOver,
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseName::Setup => "Setup",
            PhaseName::Planning => "Planning",
            PhaseName::MoveTokens => "MoveTokens",
            PhaseName::MoveMotherNature => "MoveMotherNature",
            PhaseName::SelectCloud => "SelectCloud",
            PhaseName::GameOver => "GameOver",
        };
        f.write_str(name)
    }
}

/// A setup choice already made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupChoice {
    pub player: Nickname,
    pub tower: TowerColor,
    pub wizard: Wizard,
}

/// An assistant card on the table this round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedCard {
    pub player: Nickname,
    pub card: u8,
}

/// The cards a player may still play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub player: Nickname,
    pub cards: Vec<u8>,
}

/// Messages from the server to one or more players.
///
/// Same internal tagging as [`ClientAction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The sender's last action was applied.
    Accepted,

    /// The sender's last action was rejected; nothing changed.
    Refused { reason: String },

    /// Setup choices so far and what is still free.
    UserSelectionUpdate {
        chosen: Vec<SetupChoice>,
        towers: Vec<TowerColor>,
        wizards: Vec<Wizard>,
    },

    /// Cards played this round and each player's remaining hand.
    AssistantCardUpdate {
        played: Vec<PlayedCard>,
        hands: Vec<Hand>,
    },

    /// The full table, sent when the match starts and on reconnect.
    InitialBoardStatus { board: Box<GameSnapshot> },

    /// The full table after a change.
    BoardUpdate { board: Box<GameSnapshot> },

    /// The phase changed, or the turn passed to another player.
    PhaseUpdate {
        phase: PhaseName,
        current_player: Option<Nickname>,
    },

    /// A player lost their connection.
    PlayerDisconnected { player: Nickname },

    /// A player is back.
    PlayerReconnected { player: Nickname },

    /// The match is over. `None` means a tie.
    GameOver { winner: Option<Nickname> },
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// A client action together with who sent it.
///
/// ```text
/// ┌──────────────────────────────┐
/// │ seq: 12                      │  ← per-client ordering
/// │ sender: "ada"                │  ← who is acting
/// │ ┌──────────────────────────┐ │
/// │ │ payload: SelectCloud {1} │ │  ← the action
/// │ └──────────────────────────┘ │
/// └──────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Client-side sequence number. Defaults to 0 when absent.
    #[serde(default)]
    pub seq: u64,

    /// The acting player.
    pub sender: Nickname,

    /// The action itself.
    pub payload: ClientAction,
}

impl Envelope {
    /// Wraps an action from `sender`.
    pub fn new(sender: impl Into<Nickname>, payload: ClientAction) -> Self {
        Self {
            seq: 0,
            sender: sender.into(),
            payload,
        }
    }

    /// Protocol-level checks that serde cannot express.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] for an empty sender or an
    /// assistant card value outside `1..=10`.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.sender.as_str().trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "sender must not be empty".into(),
            ));
        }
        if let ClientAction::PlayAssistant { card } = self.payload {
            if !(1..=10).contains(&card) {
                return Err(ProtocolError::InvalidMessage(format!(
                    "assistant card {card} is out of range"
                )));
            }
        }
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
