//! Custom lobbies for in-house games
//!
//! This module handles lobby creation, joining and leaving, roster lookups and
//! the balancing run that splits a lobby into two even teams.

pub mod instance;
pub mod manager;
pub mod roster;

// Re-export commonly used types
pub use instance::{CustomLobby, JoinOutcome, LeaveOutcome, LobbyState};
pub use manager::{BalanceTicket, LobbyManager, LobbyManagerStats};
pub use roster::{
    balance_roster, BalancedTeams, LobbyBalancer, RosterBuilder, RosterEntry, RosterReport,
    SkippedPlayer,
};
