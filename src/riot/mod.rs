//! Riot Games API access
//!
//! This module wraps the account, summoner, league, champion-mastery and
//! spectator endpoints plus Data Dragon, with region routing, outbound rate
//! limiting and retries.

pub mod client;
pub mod models;
pub mod rate_limit;
pub mod region;

// Re-export commonly used types
pub use client::{ChampionNames, HttpRiotClient, RiotApi};
pub use models::{
    queue_description, Account, ChampionMastery, CurrentGame, CurrentGameParticipant,
    LeagueEntry, RankedQueues, Summoner,
};
pub use rate_limit::RateLimiter;
pub use region::{opgg_url, PlatformRegion, RegionalRoute};
