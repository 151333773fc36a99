//! Utility functions shared across the bot

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique lobby ID
pub fn generate_lobby_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Absolute difference between two skill totals
pub fn skill_difference(team1_skill: f64, team2_skill: f64) -> f64 {
    (team1_skill - team2_skill).abs()
}

/// Win rate as a percentage with two decimals, or `None` when no games were played
pub fn win_rate(wins: u32, losses: u32) -> Option<String> {
    let total = wins + losses;
    if total == 0 {
        return None;
    }
    Some(format!("{:.2}", wins as f64 / total as f64 * 100.0))
}

/// Render a game length in seconds as `Xm Ys`
pub fn format_game_length(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Capitalize the first character of a string
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
