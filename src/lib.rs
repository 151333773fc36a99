//! riftbot - League of Legends stats and skill-balanced custom lobbies for Discord
//!
//! This crate answers Discord slash commands over the HTTP interactions
//! endpoint, looks players up through the Riot API, and splits custom lobbies
//! into two teams of near-equal skill.

pub mod balance;
pub mod config;
pub mod discord;
pub mod error;
pub mod lobby;
pub mod metrics;
pub mod profile;
pub mod riot;
pub mod service;
pub mod skill;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{BotError, Result};
pub use types::*;

// Re-export key components
pub use balance::{BalanceStrategy, TeamAssignment, TeamBalancer};
pub use lobby::LobbyManager;
pub use skill::SkillModel;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
