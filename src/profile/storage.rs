//! Linked-profile storage interface and implementations
//!
//! A profile links a Discord user to a Riot account. Profiles are read by the
//! lobby join check, the roster builder and `/livegame`, and ordered by their
//! cached solo/duo rank for `/rankleaderboard`.

use crate::error::{BotError, Result};
use crate::riot::PlatformRegion;
use crate::skill::RankState;
use crate::types::{DiscordUserId, RiotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// A Discord user's linked Riot account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueProfile {
    pub discord_id: DiscordUserId,
    pub riot_id: RiotId,
    pub region: PlatformRegion,
    /// Last solo/duo standing seen for this account
    #[serde(default)]
    pub solo_rank: Option<RankState>,
    pub updated_at: DateTime<Utc>,
}

impl LeagueProfile {
    pub fn new(discord_id: impl Into<DiscordUserId>, riot_id: RiotId, region: PlatformRegion) -> Self {
        Self {
            discord_id: discord_id.into(),
            riot_id,
            region,
            solo_rank: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_rank(mut self, rank: RankState) -> Self {
        self.solo_rank = Some(rank);
        self
    }
}

/// Trait for profile storage operations
pub trait ProfileStorage: Send + Sync {
    /// Get a user's profile
    fn get_profile(&self, discord_id: &str) -> Result<Option<LeagueProfile>>;

    /// Store or replace a user's profile
    fn store_profile(&self, profile: LeagueProfile) -> Result<()>;

    /// Remove a user's profile
    fn remove_profile(&self, discord_id: &str) -> Result<bool>;

    /// Every stored profile, ordered by Discord id
    fn list_profiles(&self) -> Result<Vec<LeagueProfile>>;

    /// Cache a freshly looked-up solo/duo rank. Returns false when the user has
    /// no profile.
    fn update_rank(&self, discord_id: &str, rank: RankState) -> Result<bool>;

    /// Profiles ordered by solo/duo rank, highest first; unranked and unknown last
    fn leaderboard(&self) -> Result<Vec<LeagueProfile>> {
        let mut profiles = self.list_profiles()?;
        profiles.sort_by(|a, b| leaderboard_key(b).cmp(&leaderboard_key(a)));
        Ok(profiles)
    }
}

fn leaderboard_key(profile: &LeagueProfile) -> (u8, u8, u8, u32) {
    profile
        .solo_rank
        .as_ref()
        .map(RankState::leaderboard_key)
        .unwrap_or((0, 0, 0, 0))
}

fn lock_error(kind: &str) -> BotError {
    BotError::InternalError {
        message: format!("Failed to acquire profiles {} lock", kind),
    }
}

/// In-memory profile storage implementation
#[derive(Debug, Default)]
pub struct InMemoryProfileStorage {
    profiles: RwLock<BTreeMap<DiscordUserId, LeagueProfile>>,
}

impl InMemoryProfileStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStorage for InMemoryProfileStorage {
    fn get_profile(&self, discord_id: &str) -> Result<Option<LeagueProfile>> {
        let profiles = self.profiles.read().map_err(|_| lock_error("read"))?;
        Ok(profiles.get(discord_id).cloned())
    }

    fn store_profile(&self, profile: LeagueProfile) -> Result<()> {
        let mut profiles = self.profiles.write().map_err(|_| lock_error("write"))?;
        profiles.insert(profile.discord_id.clone(), profile);
        Ok(())
    }

    fn remove_profile(&self, discord_id: &str) -> Result<bool> {
        let mut profiles = self.profiles.write().map_err(|_| lock_error("write"))?;
        Ok(profiles.remove(discord_id).is_some())
    }

    fn list_profiles(&self) -> Result<Vec<LeagueProfile>> {
        let profiles = self.profiles.read().map_err(|_| lock_error("read"))?;
        Ok(profiles.values().cloned().collect())
    }

    fn update_rank(&self, discord_id: &str, rank: RankState) -> Result<bool> {
        let mut profiles = self.profiles.write().map_err(|_| lock_error("write"))?;
        Ok(match profiles.get_mut(discord_id) {
            Some(profile) => {
                profile.solo_rank = Some(rank);
                profile.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }
}

/// Profiles kept in a pretty-printed JSON object keyed by Discord id.
///
/// The file is read once at start-up and rewritten after every change.
#[derive(Debug)]
pub struct JsonFileProfileStorage {
    path: PathBuf,
    profiles: RwLock<BTreeMap<DiscordUserId, LeagueProfile>>,
}

impl JsonFileProfileStorage {
    /// Open the file at `path`, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let profiles = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| BotError::StorageError {
                message: format!("Failed to read {}: {}", path.display(), e),
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| BotError::StorageError {
                    message: format!("Failed to parse {}: {}", path.display(), e),
                })?
            }
        } else {
            warn!(
                "Profile file {} not found, starting with no profiles",
                path.display()
            );
            BTreeMap::new()
        };

        info!(
            "Loaded {} linked profiles from {}",
            profiles.len(),
            path.display()
        );

        Ok(Self {
            path,
            profiles: RwLock::new(profiles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole map next to the target, then swap it in
    fn persist(&self, profiles: &BTreeMap<DiscordUserId, LeagueProfile>) -> Result<()> {
        let json = serde_json::to_string_pretty(profiles).map_err(|e| BotError::StorageError {
            message: format!("Failed to serialize profiles: {}", e),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)
            .and_then(|_| std::fs::rename(&temp_path, &self.path))
            .map_err(|e| BotError::StorageError {
                message: format!("Failed to write {}: {}", self.path.display(), e),
            })?;

        debug!("Persisted {} profiles to {}", profiles.len(), self.path.display());
        Ok(())
    }
}

impl ProfileStorage for JsonFileProfileStorage {
    fn get_profile(&self, discord_id: &str) -> Result<Option<LeagueProfile>> {
        let profiles = self.profiles.read().map_err(|_| lock_error("read"))?;
        Ok(profiles.get(discord_id).cloned())
    }

    fn store_profile(&self, profile: LeagueProfile) -> Result<()> {
        let mut profiles = self.profiles.write().map_err(|_| lock_error("write"))?;
        profiles.insert(profile.discord_id.clone(), profile);
        self.persist(&profiles)
    }

    fn remove_profile(&self, discord_id: &str) -> Result<bool> {
        let mut profiles = self.profiles.write().map_err(|_| lock_error("write"))?;
        if profiles.remove(discord_id).is_none() {
            return Ok(false);
        }
        self.persist(&profiles)?;
        Ok(true)
    }

    fn list_profiles(&self) -> Result<Vec<LeagueProfile>> {
        let profiles = self.profiles.read().map_err(|_| lock_error("read"))?;
        Ok(profiles.values().cloned().collect())
    }

    fn update_rank(&self, discord_id: &str, rank: RankState) -> Result<bool> {
        let mut profiles = self.profiles.write().map_err(|_| lock_error("write"))?;
        let Some(profile) = profiles.get_mut(discord_id) else {
            return Ok(false);
        };
        profile.solo_rank = Some(rank);
        profile.updated_at = Utc::now();
        self.persist(&profiles)?;
        Ok(true)
    }
}
