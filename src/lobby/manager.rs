//! Lobby manager implementation for handling multiple custom lobbies
//!
//! This module provides the LobbyManager that owns every open lobby, applies
//! join/leave/balance requests coming from button presses, and cleans up
//! lobbies nobody has touched for a while.

use crate::config::LobbySettings;
use crate::error::{BotError, Result};
use crate::lobby::instance::{CustomLobby, JoinOutcome, LeaveOutcome};
use crate::metrics::MetricsCollector;
use crate::types::{DiscordUserId, LobbyId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

/// Statistics about lobby manager operations
#[derive(Debug, Clone, Default)]
pub struct LobbyManagerStats {
    /// Total number of lobbies created
    pub lobbies_created: u64,
    /// Total number of lobbies cleaned up
    pub lobbies_cleaned: u64,
    /// Total number of accepted joins
    pub players_joined: u64,
    /// Total number of successful balancing runs
    pub teams_balanced: u64,
    /// Current number of active lobbies
    pub active_lobbies: usize,
    /// Current number of players sitting in lobbies
    pub players_waiting: usize,
}

/// Roster snapshot handed out for one balancing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceTicket {
    pub lobby_id: LobbyId,
    pub creator: DiscordUserId,
    pub players: Vec<DiscordUserId>,
}

/// The main lobby manager
#[derive(Clone)]
pub struct LobbyManager {
    /// Map of active lobbies by ID
    lobbies: Arc<RwLock<HashMap<LobbyId, CustomLobby>>>,
    settings: LobbySettings,
    /// Manager statistics
    stats: Arc<RwLock<LobbyManagerStats>>,
    /// Metrics collector for recording lobby activity
    metrics_collector: Arc<MetricsCollector>,
}

fn lobbies_lock_error() -> BotError {
    BotError::InternalError {
        message: "Failed to acquire lobbies lock".to_string(),
    }
}

fn stats_lock_error() -> BotError {
    BotError::InternalError {
        message: "Failed to acquire stats lock".to_string(),
    }
}

fn not_found(lobby_id: LobbyId) -> BotError {
    BotError::LobbyNotFound {
        lobby_id: lobby_id.to_string(),
    }
}

impl LobbyManager {
    /// Create a new lobby manager
    pub fn new(settings: LobbySettings, metrics_collector: Arc<MetricsCollector>) -> Self {
        Self {
            lobbies: Arc::new(RwLock::new(HashMap::new())),
            settings,
            stats: Arc::new(RwLock::new(LobbyManagerStats::default())),
            metrics_collector,
        }
    }

    pub fn settings(&self) -> &LobbySettings {
        &self.settings
    }

    /// Requested size clamped to [2, max_players_limit]; the default when absent
    pub fn resolve_max_players(&self, requested: Option<i64>) -> usize {
        let limit = self.settings.max_players_limit.max(2);
        match requested {
            Some(value) => value.clamp(2, limit as i64) as usize,
            None => self.settings.default_max_players.clamp(2, limit),
        }
    }

    /// Create a lobby owned by `creator`
    pub async fn create_lobby(
        &self,
        creator: &str,
        requested_max_players: Option<i64>,
    ) -> Result<CustomLobby> {
        let max_players = self.resolve_max_players(requested_max_players);
        let lobby = CustomLobby::new(creator, max_players);
        let lobby_id = lobby.id();

        {
            let mut lobbies = self.lobbies.write().map_err(|_| lobbies_lock_error())?;
            lobbies.insert(lobby_id, lobby.clone());
        }

        {
            let mut stats = self.stats.write().map_err(|_| stats_lock_error())?;
            stats.lobbies_created += 1;
            stats.active_lobbies += 1;
        }

        self.metrics_collector.record_lobby_created();

        info!(
            "Created lobby {} for creator {} (max players: {})",
            lobby_id, creator, max_players
        );
        Ok(lobby)
    }

    /// Add a user to a lobby
    pub async fn join_lobby(&self, lobby_id: LobbyId, user_id: &str) -> Result<JoinOutcome> {
        let result = {
            let mut lobbies = self.lobbies.write().map_err(|_| lobbies_lock_error())?;
            let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
            lobby.add_player(user_id)
        };

        let accepted = matches!(result, Ok(JoinOutcome::Joined { .. }));
        self.metrics_collector.record_player_action("join", accepted);

        if let Ok(JoinOutcome::Joined {
            player_count,
            max_players,
        }) = &result
        {
            {
                let mut stats = self.stats.write().map_err(|_| stats_lock_error())?;
                stats.players_joined += 1;
                stats.players_waiting += 1;
            }
            info!(
                "Player {} joined lobby {} ({}/{})",
                user_id, lobby_id, player_count, max_players
            );
        }

        result
    }

    /// Remove a user from a lobby
    pub async fn leave_lobby(&self, lobby_id: LobbyId, user_id: &str) -> Result<LeaveOutcome> {
        let outcome = {
            let mut lobbies = self.lobbies.write().map_err(|_| lobbies_lock_error())?;
            let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
            lobby.remove_player(user_id)
        };

        let left = matches!(outcome, LeaveOutcome::Left { .. });
        self.metrics_collector.record_player_action("leave", left);

        if left {
            let mut stats = self.stats.write().map_err(|_| stats_lock_error())?;
            stats.players_waiting = stats.players_waiting.saturating_sub(1);
            debug!("Player {} left lobby {}", user_id, lobby_id);
        }

        Ok(outcome)
    }

    /// Get a copy of a specific lobby
    pub async fn get_lobby(&self, lobby_id: LobbyId) -> Result<Option<CustomLobby>> {
        let lobbies = self.lobbies.read().map_err(|_| lobbies_lock_error())?;
        Ok(lobbies.get(&lobby_id).cloned())
    }

    /// Get all active lobbies
    pub async fn get_all_lobbies(&self) -> Result<Vec<CustomLobby>> {
        let lobbies = self.lobbies.read().map_err(|_| lobbies_lock_error())?;
        Ok(lobbies.values().cloned().collect())
    }

    /// Move a lobby into the balancing state and snapshot its roster.
    ///
    /// The lock is released before the snapshot is returned, so lookups and
    /// the search never run under it.
    pub async fn begin_balance(&self, lobby_id: LobbyId, requester: &str) -> Result<BalanceTicket> {
        let mut lobbies = self.lobbies.write().map_err(|_| lobbies_lock_error())?;
        let lobby = lobbies.get_mut(&lobby_id).ok_or_else(|| not_found(lobby_id))?;
        let players = lobby.begin_balancing(requester)?;

        info!(
            "Balancing lobby {} with {} players for {}",
            lobby_id,
            players.len(),
            requester
        );

        Ok(BalanceTicket {
            lobby_id,
            creator: lobby.creator().to_string(),
            players,
        })
    }

    /// Return a lobby to the open state after a balancing run
    pub async fn finish_balance(&self, lobby_id: LobbyId, succeeded: bool) -> Result<()> {
        {
            let mut lobbies = self.lobbies.write().map_err(|_| lobbies_lock_error())?;
            match lobbies.get_mut(&lobby_id) {
                Some(lobby) => lobby.finish_balancing(succeeded),
                None => {
                    warn!("Lobby {} disappeared while its teams were balanced", lobby_id);
                    return Ok(());
                }
            }
        }

        if succeeded {
            let mut stats = self.stats.write().map_err(|_| stats_lock_error())?;
            stats.teams_balanced += 1;
        }

        Ok(())
    }

    /// Periodic cleanup of lobbies nobody has touched within the inactivity timeout
    pub async fn cleanup_stale_lobbies(&self) -> Result<usize> {
        let timeout = chrono::Duration::minutes(self.settings.inactivity_timeout_minutes as i64);
        let mut cleaned_count = 0;
        let mut lobbies_to_remove = Vec::new();

        {
            let lobbies = self.lobbies.read().map_err(|_| lobbies_lock_error())?;

            for (lobby_id, lobby) in lobbies.iter() {
                if lobby.should_cleanup(timeout) {
                    lobbies_to_remove.push(*lobby_id);
                }
            }
        }

        if !lobbies_to_remove.is_empty() {
            let mut lobbies = self.lobbies.write().map_err(|_| lobbies_lock_error())?;

            for lobby_id in lobbies_to_remove {
                // Re-check: the lobby may have been touched since the scan
                let stale = lobbies
                    .get(&lobby_id)
                    .map(|lobby| lobby.should_cleanup(timeout))
                    .unwrap_or(false);
                if stale && lobbies.remove(&lobby_id).is_some() {
                    cleaned_count += 1;
                    debug!("Cleaned up stale lobby {}", lobby_id);
                }
            }

            {
                let mut stats = self.stats.write().map_err(|_| stats_lock_error())?;
                stats.lobbies_cleaned += cleaned_count;
                stats.active_lobbies = lobbies.len();
                stats.players_waiting = lobbies.values().map(CustomLobby::player_count).sum();
                self.metrics_collector.update_from_lobby_stats(&stats);
            }

            self.metrics_collector.record_lobbies_cleaned(cleaned_count);
        }

        if cleaned_count > 0 {
            info!("Cleaned up {} stale lobbies", cleaned_count);
        }

        Ok(cleaned_count as usize)
    }

    /// Start the cleanup task that runs periodically
    pub fn start_cleanup_task(self: Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(&self);
        let period = Duration::from_secs(self.settings.cleanup_interval_seconds.max(1));

        let handle = tokio::spawn(async move {
            let mut cleanup_interval = interval(period);

            loop {
                cleanup_interval.tick().await;

                if let Err(e) = manager.cleanup_stale_lobbies().await {
                    error!("Error during lobby cleanup: {}", e);
                }
            }
        });

        info!("Started lobby cleanup task (every {:?})", period);
        handle
    }

    /// Get current manager statistics
    pub async fn get_stats(&self) -> Result<LobbyManagerStats> {
        let stats = self.stats.read().map_err(|_| stats_lock_error())?;
        Ok(stats.clone())
    }

    #[cfg(test)]
    fn age_lobby(&self, lobby_id: LobbyId, minutes: i64) {
        let mut lobbies = self.lobbies.write().unwrap();
        let lobby = lobbies.get_mut(&lobby_id).unwrap();
        lobby.set_last_activity(crate::utils::current_timestamp() - chrono::Duration::minutes(minutes));
    }
}
