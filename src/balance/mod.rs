//! Skill-balanced team partitioning
//!
//! This module splits a scored roster into two teams of floor(N/2) and ceil(N/2)
//! players, minimizing the absolute difference between the teams' skill sums.

pub mod balancer;

// Re-export commonly used types
pub use balancer::{
    BalanceStrategy, ScoredPlayer, Split, TeamAssignment, TeamBalancer, TeamSizes,
    MAX_ROSTER_SIZE,
};
