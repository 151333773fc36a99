//! Linked Riot profiles
//!
//! This module stores the Discord user to Riot account links created by
//! `/setprofile`, either in memory or in a JSON file.

pub mod storage;

// Re-export commonly used types
pub use storage::{InMemoryProfileStorage, JsonFileProfileStorage, LeagueProfile, ProfileStorage};
