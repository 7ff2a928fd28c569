//! # eriantys-core
//!
//! The Eriantys rule engine: tokens and their containers, the island
//! board, professor ownership, influence scoring, character cards, and the
//! [`GameManager`] aggregate that ties them together.
//!
//! Everything here is synchronous and free of I/O. Turn ownership and
//! phase sequencing live one level up, in `eriantys-match`.

#[macro_use]
mod literal;

pub mod bag;
pub mod board;
pub mod category;
pub mod character;
pub mod container;
mod effects;
pub mod error;
pub mod influence;
pub mod island;
pub mod manager;
pub mod player;
pub mod professor;
pub mod rules;
pub mod snapshot;

pub use bag::Bag;
pub use board::Board;
pub use category::Category;
pub use character::{CharacterCard, CharacterId, CharacterParams};
pub use container::{Capacity, TokenContainer};
pub use error::{GameError, GameResult};
pub use influence::InfluenceCalculator;
pub use island::IslandGroup;
pub use manager::{Destination, GameManager};
pub use player::{AssistantCard, Nickname, Player, TowerColor, Wizard};
pub use professor::{ProfessorOwnership, TieBreak};
pub use rules::{GameOptions, Rules};
pub use snapshot::GameSnapshot;
