//! Common types used throughout the bot

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discord snowflake of a user, kept as the string Discord sends
pub type DiscordUserId = String;

/// Unique identifier for custom lobbies
pub type LobbyId = Uuid;

/// A Riot account identifier (`gameName#tagLine`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    pub fn new(game_name: impl AsRef<str>, tag_line: impl AsRef<str>) -> Self {
        Self {
            game_name: game_name.as_ref().trim().to_string(),
            tag_line: tag_line.as_ref().trim().trim_start_matches('#').to_string(),
        }
    }

    /// Parse the `name#tag` form used in live-game participant data
    pub fn parse(value: &str) -> Option<Self> {
        let (name, tag) = value.rsplit_once('#')?;
        if name.trim().is_empty() || tag.trim().is_empty() {
            return None;
        }
        Some(Self::new(name, tag))
    }

    /// True when both parts are present
    pub fn is_complete(&self) -> bool {
        !self.game_name.is_empty() && !self.tag_line.is_empty()
    }
}

impl std::fmt::Display for RiotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}
