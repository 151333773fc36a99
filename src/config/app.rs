//! Main application configuration
//!
//! This module defines the primary configuration structures for the bot,
//! including TOML file loading, environment variable loading and validation.

use crate::balance::{BalanceStrategy, MAX_ROSTER_SIZE};
use crate::riot::PlatformRegion;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub discord: DiscordSettings,
    pub riot: RiotSettings,
    pub lobby: LobbySettings,
    pub profiles: ProfileSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Bind address for the HTTP server
    pub host: String,
    /// Port serving interactions, health and metrics
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Maximum in-flight HTTP requests
    pub max_concurrent_requests: usize,
}

/// Discord application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Application (client) id
    pub application_id: String,
    /// Hex-encoded Ed25519 public key of the application
    pub public_key: String,
    /// Bot token used for REST calls
    pub bot_token: String,
    /// Base URL of the Discord REST API
    pub api_base_url: String,
    /// Reject interactions without a valid signature
    pub verify_signatures: bool,
    /// Register commands in this guild only (instant updates while developing)
    pub guild_id: Option<String>,
}

/// Riot API client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiotSettings {
    /// Developer or production API key
    pub api_key: String,
    /// Region used when a command omits one
    pub default_region: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Maximum retry attempts for 429 and 5xx responses
    pub max_retry_attempts: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Requests allowed per rate-limit window
    pub rate_limit_requests: usize,
    /// Rate-limit window in milliseconds
    pub rate_limit_window_ms: u64,
    /// Data Dragon base URL for static champion data
    pub ddragon_base_url: String,
    /// Send every request to this base URL instead of the routing hosts
    pub api_host_override: Option<String>,
}

/// Custom lobby settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbySettings {
    /// Lobby size when `/createlobby` is called without `maxplayers`
    pub default_max_players: usize,
    /// Upper bound for `maxplayers`
    pub max_players_limit: usize,
    /// Pause between players while gathering rank data, in milliseconds
    pub roster_pacing_ms: u64,
    /// Lobby cleanup interval in seconds
    pub cleanup_interval_seconds: u64,
    /// Lobbies without activity for this long are removed
    pub inactivity_timeout_minutes: u64,
    /// Pruning strategy for team balancing
    pub balance_strategy: BalanceStrategy,
}

/// Where linked Riot profiles are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStorageKind {
    Memory,
    Json,
}

impl FromStr for ProfileStorageKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "memory" => Ok(ProfileStorageKind::Memory),
            "json" => Ok(ProfileStorageKind::Json),
            other => Err(anyhow!("Invalid profile storage kind: {}", other)),
        }
    }
}

/// Profile storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub storage: ProfileStorageKind,
    /// JSON file path when `storage = "json"`
    pub path: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "riftbot".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
            max_concurrent_requests: 256,
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            public_key: String::new(),
            bot_token: String::new(),
            api_base_url: "https://discord.com/api/v10".to_string(),
            verify_signatures: true,
            guild_id: None,
        }
    }
}

impl Default for RiotSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_region: "na1".to_string(),
            request_timeout_seconds: 10,
            max_retry_attempts: 3,
            retry_delay_ms: 1000,
            // Development keys allow 20 requests per second
            rate_limit_requests: 20,
            rate_limit_window_ms: 1000,
            ddragon_base_url: "https://ddragon.leagueoflegends.com".to_string(),
            api_host_override: None,
        }
    }
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            default_max_players: 10,
            max_players_limit: 20,
            roster_pacing_ms: 600,
            cleanup_interval_seconds: 60,
            inactivity_timeout_minutes: 120,
            balance_strategy: BalanceStrategy::Lookahead,
        }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            storage: ProfileStorageKind::Json,
            path: PathBuf::from("userProfiles.json"),
        }
    }
}

/// Read an environment variable and parse it, naming the variable on failure
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections and fields take their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.host = host;
        }
        if let Some(port) = env_parse("HTTP_PORT")? {
            self.service.http_port = port;
        }
        if let Some(timeout) = env_parse("SHUTDOWN_TIMEOUT_SECONDS")? {
            self.service.shutdown_timeout_seconds = timeout;
        }
        if let Some(max_requests) = env_parse("MAX_CONCURRENT_REQUESTS")? {
            self.service.max_concurrent_requests = max_requests;
        }

        // Discord settings
        if let Ok(application_id) = env::var("DISCORD_APPLICATION_ID") {
            self.discord.application_id = application_id;
        }
        if let Ok(public_key) = env::var("DISCORD_PUBLIC_KEY") {
            self.discord.public_key = public_key;
        }
        if let Ok(token) = env::var("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = token;
        }
        if let Ok(url) = env::var("DISCORD_API_BASE_URL") {
            self.discord.api_base_url = url;
        }
        if let Some(verify) = env_parse("DISCORD_VERIFY_SIGNATURES")? {
            self.discord.verify_signatures = verify;
        }
        if let Ok(guild_id) = env::var("DISCORD_GUILD_ID") {
            self.discord.guild_id = Some(guild_id);
        }

        // Riot settings
        if let Ok(api_key) = env::var("RIOT_API_KEY") {
            self.riot.api_key = api_key;
        }
        if let Ok(region) = env::var("RIOT_DEFAULT_REGION") {
            self.riot.default_region = region;
        }
        if let Some(timeout) = env_parse("RIOT_REQUEST_TIMEOUT_SECONDS")? {
            self.riot.request_timeout_seconds = timeout;
        }
        if let Some(retries) = env_parse("RIOT_MAX_RETRY_ATTEMPTS")? {
            self.riot.max_retry_attempts = retries;
        }
        if let Some(delay) = env_parse("RIOT_RETRY_DELAY_MS")? {
            self.riot.retry_delay_ms = delay;
        }
        if let Some(requests) = env_parse("RIOT_RATE_LIMIT_REQUESTS")? {
            self.riot.rate_limit_requests = requests;
        }
        if let Some(window) = env_parse("RIOT_RATE_LIMIT_WINDOW_MS")? {
            self.riot.rate_limit_window_ms = window;
        }
        if let Ok(host) = env::var("RIOT_API_HOST_OVERRIDE") {
            self.riot.api_host_override = Some(host);
        }

        // Lobby settings
        if let Some(max_players) = env_parse("LOBBY_DEFAULT_MAX_PLAYERS")? {
            self.lobby.default_max_players = max_players;
        }
        if let Some(limit) = env_parse("LOBBY_MAX_PLAYERS_LIMIT")? {
            self.lobby.max_players_limit = limit;
        }
        if let Some(pacing) = env_parse("LOBBY_ROSTER_PACING_MS")? {
            self.lobby.roster_pacing_ms = pacing;
        }
        if let Some(cleanup) = env_parse("LOBBY_CLEANUP_INTERVAL_SECONDS")? {
            self.lobby.cleanup_interval_seconds = cleanup;
        }
        if let Some(timeout) = env_parse("LOBBY_INACTIVITY_TIMEOUT_MINUTES")? {
            self.lobby.inactivity_timeout_minutes = timeout;
        }
        if let Ok(strategy) = env::var("BALANCE_STRATEGY") {
            self.lobby.balance_strategy = strategy
                .parse()
                .map_err(|_| anyhow!("Invalid BALANCE_STRATEGY value: {}", strategy))?;
        }

        // Profile settings
        if let Some(storage) = env_parse("PROFILE_STORAGE")? {
            self.profiles.storage = storage;
        }
        if let Ok(path) = env::var("PROFILE_PATH") {
            self.profiles.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get cleanup interval as Duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.lobby.cleanup_interval_seconds)
    }

    /// Get roster pacing as Duration
    pub fn roster_pacing(&self) -> Duration {
        Duration::from_millis(self.lobby.roster_pacing_ms)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.http_port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.service.max_concurrent_requests == 0 {
        return Err(anyhow!("Max concurrent requests must be greater than 0"));
    }
    if config.riot.request_timeout_seconds == 0 {
        return Err(anyhow!("Riot request timeout must be greater than 0"));
    }

    // Validate Discord settings
    if config.discord.api_base_url.is_empty() {
        return Err(anyhow!("Discord API base URL cannot be empty"));
    }
    if config.discord.verify_signatures {
        if config.discord.public_key.is_empty() {
            return Err(anyhow!(
                "Discord public key is required when signature verification is enabled"
            ));
        }
        let key = hex::decode(&config.discord.public_key)
            .map_err(|_| anyhow!("Discord public key must be hex encoded"))?;
        if key.len() != 32 {
            return Err(anyhow!("Discord public key must be 32 bytes"));
        }
    }

    // Validate Riot settings
    PlatformRegion::normalize(&config.riot.default_region)
        .map_err(|_| anyhow!("Invalid default region: {}", config.riot.default_region))?;
    if config.riot.rate_limit_requests == 0 {
        return Err(anyhow!("Riot rate limit must allow at least one request"));
    }
    if config.riot.rate_limit_window_ms == 0 {
        return Err(anyhow!("Riot rate limit window must be greater than 0"));
    }

    // Validate lobby settings
    if config.lobby.max_players_limit < 2 || config.lobby.max_players_limit > MAX_ROSTER_SIZE {
        return Err(anyhow!(
            "Lobby max players limit must be between 2 and {}",
            MAX_ROSTER_SIZE
        ));
    }
    if config.lobby.default_max_players < 2
        || config.lobby.default_max_players > config.lobby.max_players_limit
    {
        return Err(anyhow!(
            "Lobby default max players must be between 2 and {}",
            config.lobby.max_players_limit
        ));
    }
    if config.lobby.cleanup_interval_seconds == 0 {
        return Err(anyhow!("Cleanup interval must be greater than 0"));
    }
    if config.lobby.inactivity_timeout_minutes == 0 {
        return Err(anyhow!("Lobby inactivity timeout must be greater than 0"));
    }

    // Validate profile settings
    if config.profiles.storage == ProfileStorageKind::Json
        && config.profiles.path.as_os_str().is_empty()
    {
        return Err(anyhow!("Profile path cannot be empty for JSON storage"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.discord.verify_signatures = false;
        config
    }

    #[test]
    fn test_defaults_are_valid_without_signature_checks() {
        let config = unsigned_config();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.lobby.default_max_players, 10);
        assert_eq!(config.lobby.roster_pacing_ms, 600);
        assert_eq!(config.lobby.balance_strategy, BalanceStrategy::Lookahead);
        assert_eq!(config.profiles.path, PathBuf::from("userProfiles.json"));
    }

    #[test]
    fn test_signature_checks_require_public_key() {
        let mut config = AppConfig::default();
        assert!(validate_config(&config).is_err());

        config.discord.public_key = "zz".repeat(32);
        assert!(validate_config(&config).is_err());

        config.discord.public_key = "ab".repeat(16);
        assert!(validate_config(&config).is_err());

        config.discord.public_key = "ab".repeat(32);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_from_toml_partial_document() {
        let config = AppConfig::from_toml(
            r#"
            [service]
            http_port = 9000

            [discord]
            verify_signatures = false

            [lobby]
            balance_strategy = "exact"
            max_players_limit = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.service.http_port, 9000);
        assert_eq!(config.service.name, "riftbot");
        assert_eq!(config.lobby.balance_strategy, BalanceStrategy::Exact);
        assert_eq!(config.lobby.max_players_limit, 16);
        assert_eq!(config.lobby.default_max_players, 10);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riftbot.toml");
        std::fs::write(
            &path,
            "[discord]\nverify_signatures = false\n[profiles]\nstorage = \"memory\"\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.profiles.storage, ProfileStorageKind::Memory);

        assert!(AppConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_lobby_limits_validated() {
        let mut config = unsigned_config();
        config.lobby.max_players_limit = MAX_ROSTER_SIZE + 1;
        assert!(validate_config(&config).is_err());

        let mut config = unsigned_config();
        config.lobby.default_max_players = 1;
        assert!(validate_config(&config).is_err());

        let mut config = unsigned_config();
        config.lobby.default_max_players = 30;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = unsigned_config();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = unsigned_config();
        config.riot.default_region = "atlantis".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = unsigned_config();
        config.riot.rate_limit_requests = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.roster_pacing(), Duration::from_millis(600));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(60));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }
}
