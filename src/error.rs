//! Error types for the bot
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific bot scenarios
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Precondition violated: {reason}")]
    PreconditionViolation { reason: String },

    #[error("No feasible partition found for a roster of {roster_size} players")]
    NoFeasiblePartition { roster_size: usize },

    #[error("Lobby not found: {lobby_id}")]
    LobbyNotFound { lobby_id: String },

    #[error("Lobby is full: {lobby_id}")]
    LobbyFull { lobby_id: String },

    #[error("Teams are already being balanced for lobby {lobby_id}")]
    BalanceInProgress { lobby_id: String },

    #[error("Only the lobby creator can {action}")]
    NotLobbyCreator { action: String },

    #[error("No linked profile for user {discord_id}")]
    ProfileNotFound { discord_id: String },

    #[error("Invalid region code: {region}")]
    InvalidRegion { region: String },

    #[error("Riot API request failed. Status: {status}, Message: {message}")]
    RiotApi { status: u16, message: String },

    #[error("Discord API request failed. Status: {status}, Message: {message}")]
    DiscordApi { status: u16, message: String },

    #[error("Invalid interaction: {reason}")]
    InvalidInteraction { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Profile storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl BotError {
    /// True when the Riot API reported that the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, BotError::RiotApi { status: 404, .. })
    }
}

/// Check whether an anyhow error wraps a Riot 404
pub fn is_riot_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<BotError>()
        .map(BotError::is_not_found)
        .unwrap_or(false)
}
