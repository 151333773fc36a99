//! Slash command catalogue and lobby button ids

use crate::error::{BotError, Result};
use crate::types::LobbyId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default and maximum `count` for `/topmastery`
pub const DEFAULT_MASTERY_COUNT: u32 = 5;
pub const MAX_MASTERY_COUNT: u32 = 25;

const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;

/// Every slash command the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Ping,
    RankedInfo,
    SummonerInfo,
    TopMastery,
    LiveGame,
    SetProfile,
    GetProfile,
    RankLeaderboard,
    CreateLobby,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Ping,
        Command::RankedInfo,
        Command::SummonerInfo,
        Command::TopMastery,
        Command::LiveGame,
        Command::SetProfile,
        Command::GetProfile,
        Command::RankLeaderboard,
        Command::CreateLobby,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::RankedInfo => "rankedinfo",
            Command::SummonerInfo => "summonerinfo",
            Command::TopMastery => "topmastery",
            Command::LiveGame => "livegame",
            Command::SetProfile => "setprofile",
            Command::GetProfile => "getprofile",
            Command::RankLeaderboard => "rankleaderboard",
            Command::CreateLobby => "createlobby",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Command::Ping => "Replies with Pong!",
            Command::RankedInfo => "Fetches your League of Legends ranks",
            Command::SummonerInfo => "Fetches basic League of Legends account information.",
            Command::TopMastery => "Shows a player's highest champion masteries.",
            Command::LiveGame => "Shows the live game a player is currently in.",
            Command::SetProfile => "Saves your League of Legends profile information.",
            Command::GetProfile => "Displays your saved League of Legends profile information.",
            Command::RankLeaderboard => "Displays the rank leaderboard based on Solo/Duo ranks.",
            Command::CreateLobby => "Creates a custom lobby with skill-balanced teams.",
        }
    }

    fn options(self) -> Vec<CommandOptionDefinition> {
        match self {
            Command::Ping | Command::GetProfile | Command::RankLeaderboard => Vec::new(),
            Command::RankedInfo | Command::SummonerInfo | Command::SetProfile => riot_id_options(true),
            Command::TopMastery => {
                let mut options = riot_id_options(true);
                options.push(CommandOptionDefinition::integer(
                    "count",
                    "The top # of champions to display (Optional)",
                    false,
                ));
                options
            }
            Command::LiveGame => riot_id_options(false),
            Command::CreateLobby => vec![CommandOptionDefinition::integer(
                "maxplayers",
                "Maximum number of players (default 10)",
                false,
            )],
        }
    }

    /// Registration body for this command
    pub fn definition(self) -> CommandDefinition {
        CommandDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            options: self.options(),
        }
    }

    /// Commands whose work outlives Discord's three-second response window
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            Command::RankedInfo
                | Command::SummonerInfo
                | Command::TopMastery
                | Command::LiveGame
                | Command::SetProfile
                | Command::RankLeaderboard
        )
    }
}

impl FromStr for Command {
    type Err = BotError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == value)
            .ok_or_else(|| BotError::InvalidInteraction {
                reason: format!("unknown command '{}'", value),
            })
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn riot_id_options(required: bool) -> Vec<CommandOptionDefinition> {
    vec![
        CommandOptionDefinition::string("username", "The Riot username of the player.", required),
        CommandOptionDefinition::string(
            "tagline",
            "The tag of the player without a hashtag (NA1, EUW1, EUNE1, etc.)",
            required,
        ),
        CommandOptionDefinition::string(
            "region",
            "The region of the Riot account (na1, euw1, eune1, etc.)",
            required,
        ),
    ]
}

/// Body of one entry in the bulk-overwrite command registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOptionDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl CommandOptionDefinition {
    fn string(name: &str, description: &str, required: bool) -> Self {
        Self {
            kind: OPTION_STRING,
            name: name.to_string(),
            description: description.to_string(),
            required,
        }
    }

    fn integer(name: &str, description: &str, required: bool) -> Self {
        Self {
            kind: OPTION_INTEGER,
            name: name.to_string(),
            description: description.to_string(),
            required,
        }
    }
}

/// All command definitions, in registration order
pub fn command_definitions() -> Vec<CommandDefinition> {
    Command::ALL.into_iter().map(Command::definition).collect()
}

/// Lobby button actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    Join,
    Leave,
    Balance,
}

impl LobbyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LobbyAction::Join => "join",
            LobbyAction::Leave => "leave",
            LobbyAction::Balance => "balance",
        }
    }

    /// `custom_id` of this action's button on the given lobby
    pub fn custom_id(self, lobby_id: LobbyId) -> String {
        format!("{}:{}", self.as_str(), lobby_id)
    }
}

/// Split a button `custom_id` into its action and lobby
pub fn parse_custom_id(custom_id: &str) -> Result<(LobbyAction, LobbyId)> {
    let invalid = || BotError::InvalidInteraction {
        reason: format!("unrecognized button id '{}'", custom_id),
    };

    let (action, lobby_id) = custom_id.split_once(':').ok_or_else(invalid)?;
    let action = match action {
        "join" => LobbyAction::Join,
        "leave" => LobbyAction::Leave,
        "balance" => LobbyAction::Balance,
        _ => return Err(invalid().into()),
    };
    let lobby_id = LobbyId::parse_str(lobby_id).map_err(|_| invalid())?;

    Ok((action, lobby_id))
}

/// Clamp the `/topmastery` count into [1, 25], defaulting to 5
pub fn mastery_count(requested: Option<i64>) -> u32 {
    requested
        .map(|count| count.clamp(1, MAX_MASTERY_COUNT as i64) as u32)
        .unwrap_or(DEFAULT_MASTERY_COUNT)
}
