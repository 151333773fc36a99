//! Rank-to-skill model
//!
//! This module turns a player's ranked tier and division (or unranked game count)
//! into the single scalar the team balancer compares.

pub mod model;

// Re-export commonly used types
pub use model::{
    Division, RankState, ReportedRank, SkillAssessment, SkillModel, SkillWarning, Tier,
};
