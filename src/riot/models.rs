//! Riot API response bodies
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use crate::skill::ReportedRank;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SOLO_QUEUE: &str = "RANKED_SOLO_5x5";
pub const FLEX_QUEUE: &str = "RANKED_FLEX_SR";

/// account-v1 account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub puuid: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
}

/// summoner-v4 summoner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    /// Encrypted summoner id
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    pub puuid: String,
    pub profile_icon_id: i64,
    /// Epoch milliseconds
    pub revision_date: i64,
    pub summoner_level: i64,
}

/// league-v4 entry for one ranked queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub queue_type: String,
    pub tier: String,
    /// Division, named `rank` by the API
    pub rank: String,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
}

impl LeagueEntry {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn reported_rank(&self) -> ReportedRank {
        ReportedRank::ranked(
            self.tier.clone(),
            self.rank.clone(),
            self.league_points,
            self.games_played(),
        )
    }
}

/// League entries split by the two ranked queues the bot shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedQueues {
    pub solo: Option<LeagueEntry>,
    pub flex: Option<LeagueEntry>,
}

impl RankedQueues {
    pub fn from_entries(entries: Vec<LeagueEntry>) -> Self {
        let mut queues = Self::default();
        for entry in entries {
            match entry.queue_type.as_str() {
                SOLO_QUEUE => queues.solo = Some(entry),
                FLEX_QUEUE => queues.flex = Some(entry),
                _ => {}
            }
        }
        queues
    }

    /// Solo/duo standing as the skill model sees it. Players without a solo/duo
    /// entry count their flex games towards the unranked scale.
    pub fn solo_rank(&self) -> ReportedRank {
        match &self.solo {
            Some(entry) => entry.reported_rank(),
            None => ReportedRank::unranked(
                self.flex.as_ref().map(LeagueEntry::games_played).unwrap_or(0),
            ),
        }
    }

    /// Short solo/duo label such as `GOLD II` or `Unranked`
    pub fn solo_label(&self) -> String {
        match &self.solo {
            Some(entry) => format!("{} {}", entry.tier, entry.rank),
            None => "Unranked".to_string(),
        }
    }
}

/// champion-mastery-v4 entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionMastery {
    pub champion_id: i64,
    pub champion_level: i64,
    pub champion_points: i64,
}

/// spectator-v5 active game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGame {
    pub game_id: i64,
    #[serde(default)]
    pub game_mode: String,
    /// Seconds since the game started
    #[serde(default)]
    pub game_length: i64,
    #[serde(default)]
    pub game_queue_config_id: Option<i64>,
    pub participants: Vec<CurrentGameParticipant>,
}

impl CurrentGame {
    /// Team id of `puuid`, when they are a participant
    pub fn team_of(&self, puuid: &str) -> Option<i64> {
        self.participants
            .iter()
            .find(|p| p.puuid.as_deref() == Some(puuid))
            .map(|p| p.team_id)
    }

    /// Participants split into `puuid`'s team and the opposing team
    pub fn split_teams(
        &self,
        puuid: &str,
    ) -> (Vec<&CurrentGameParticipant>, Vec<&CurrentGameParticipant>) {
        let own_team = self.team_of(puuid).unwrap_or(100);
        self.participants
            .iter()
            .partition(|participant| participant.team_id == own_team)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGameParticipant {
    /// Absent for streamer-mode players
    #[serde(default)]
    pub puuid: Option<String>,
    pub team_id: i64,
    pub champion_id: i64,
    /// `gameName#tagLine`
    #[serde(default)]
    pub riot_id: Option<String>,
    #[serde(default)]
    pub summoner_id: Option<String>,
}

/// Data Dragon `champion.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ChampionCatalog {
    pub data: HashMap<String, ChampionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChampionEntry {
    /// Numeric champion id, as a string
    pub key: String,
    pub name: String,
}

impl ChampionCatalog {
    /// Champion id to display name
    pub fn names_by_id(&self) -> HashMap<i64, String> {
        self.data
            .values()
            .filter_map(|entry| Some((entry.key.parse().ok()?, entry.name.clone())))
            .collect()
    }
}

/// Human-readable name of a queue id
pub fn queue_description(queue_id: Option<i64>) -> &'static str {
    match queue_id {
        Some(0) | None => "Custom Game",
        Some(400) => "5v5 Draft Pick",
        Some(420) => "5v5 Ranked Solo/Duo",
        Some(430) => "5v5 Blind Pick",
        Some(440) => "5v5 Ranked Flex",
        Some(450) => "ARAM",
        Some(490) => "Quickplay",
        Some(700) => "Clash",
        Some(830 | 840 | 850 | 870 | 880 | 890) => "Co-op vs. AI",
        Some(900) => "ARURF",
        Some(1020) => "One for All",
        Some(1300) => "Nexus Blitz",
        Some(1700 | 1710) => "Arena",
        Some(1900) => "URF",
        Some(_) => "Unknown Queue",
    }
}
