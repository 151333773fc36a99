//! Custom lobby state and lifecycle
//!
//! A lobby is created by `/createlobby`, filled through the Join and Leave
//! buttons and balanced on request of its creator.

use crate::error::{BotError, Result};
use crate::types::{DiscordUserId, LobbyId};
use crate::utils::{current_timestamp, generate_lobby_id};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Possible states of a lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyState {
    /// Players may join, leave and request a balance
    Open,
    /// A roster snapshot is being looked up and partitioned
    Balancing,
}

/// Result of a join request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { player_count: usize, max_players: usize },
    AlreadyJoined,
}

/// Result of a leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left { player_count: usize, max_players: usize },
    NotInLobby,
}

/// A single custom lobby
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomLobby {
    id: LobbyId,
    creator: DiscordUserId,
    max_players: usize,
    /// Join order is kept; it decides the balancer's input order
    players: Vec<DiscordUserId>,
    state: LobbyState,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    times_balanced: u32,
    last_balanced_at: Option<DateTime<Utc>>,
}

impl CustomLobby {
    /// Create a new lobby with a fresh ID
    pub fn new(creator: impl Into<DiscordUserId>, max_players: usize) -> Self {
        Self::with_id(generate_lobby_id(), creator, max_players)
    }

    /// Create a lobby with a specific ID
    pub fn with_id(id: LobbyId, creator: impl Into<DiscordUserId>, max_players: usize) -> Self {
        let now = current_timestamp();
        Self {
            id,
            creator: creator.into(),
            max_players,
            players: Vec::new(),
            state: LobbyState::Open,
            created_at: now,
            last_activity: now,
            times_balanced: 0,
            last_balanced_at: None,
        }
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator == user_id
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn players(&self) -> &[DiscordUserId] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.players.iter().any(|p| p == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn times_balanced(&self) -> u32 {
        self.times_balanced
    }

    pub fn last_balanced_at(&self) -> Option<DateTime<Utc>> {
        self.last_balanced_at
    }

    fn touch(&mut self) {
        self.last_activity = current_timestamp();
    }

    /// Add a player at the end of the roster
    pub fn add_player(&mut self, user_id: &str) -> Result<JoinOutcome> {
        if self.contains(user_id) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        if self.is_full() {
            return Err(BotError::LobbyFull {
                lobby_id: self.id.to_string(),
            }
            .into());
        }

        self.players.push(user_id.to_string());
        self.touch();

        Ok(JoinOutcome::Joined {
            player_count: self.players.len(),
            max_players: self.max_players,
        })
    }

    /// Remove a player, keeping the order of the others
    pub fn remove_player(&mut self, user_id: &str) -> LeaveOutcome {
        let before = self.players.len();
        self.players.retain(|p| p != user_id);

        if self.players.len() == before {
            return LeaveOutcome::NotInLobby;
        }

        self.touch();
        LeaveOutcome::Left {
            player_count: self.players.len(),
            max_players: self.max_players,
        }
    }

    /// Enter the balancing state and return the roster to look up
    pub fn begin_balancing(&mut self, requester: &str) -> Result<Vec<DiscordUserId>> {
        if !self.is_creator(requester) {
            return Err(BotError::NotLobbyCreator {
                action: "balance teams".to_string(),
            }
            .into());
        }

        if self.state == LobbyState::Balancing {
            return Err(BotError::BalanceInProgress {
                lobby_id: self.id.to_string(),
            }
            .into());
        }

        if self.players.len() < 2 {
            return Err(BotError::PreconditionViolation {
                reason: format!(
                    "lobby {} has {} players, at least 2 are needed",
                    self.id,
                    self.players.len()
                ),
            }
            .into());
        }

        self.state = LobbyState::Balancing;
        self.touch();
        Ok(self.players.clone())
    }

    /// Leave the balancing state
    pub fn finish_balancing(&mut self, succeeded: bool) {
        self.state = LobbyState::Open;
        if succeeded {
            self.times_balanced += 1;
            self.last_balanced_at = Some(current_timestamp());
        }
        self.touch();
    }

    /// True once the lobby has seen no activity for `inactivity_timeout`
    pub fn should_cleanup(&self, inactivity_timeout: Duration) -> bool {
        current_timestamp() - self.last_activity > inactivity_timeout
    }

    #[cfg(test)]
    pub fn set_last_activity(&mut self, at: DateTime<Utc>) {
        self.last_activity = at;
    }
}
