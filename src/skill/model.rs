//! Ranked standing types and the skill scoring function
//!
//! Every tier owns a 100-point band (IRON starts at 100, CHALLENGER at 900) and the
//! four divisions split that band into quarter steps. Apex tiers may omit the
//! division; when one is reported it adds the same offset as in any other tier.
//! Unranked players start at the IRON floor and gain one point per game played,
//! capped so volume alone never reaches the PLATINUM floor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Skill given to every unranked player before games played are counted
pub const UNRANKED_BASELINE: f64 = 100.0;

/// Maximum number of games that count towards an unranked player's skill
pub const UNRANKED_GAMES_CAP: u32 = 375;

/// Competitive tiers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub const ALL: [Tier; 9] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// Base of the tier's 100-point band
    pub fn base_value(self) -> f64 {
        match self {
            Tier::Iron => 100.0,
            Tier::Bronze => 200.0,
            Tier::Silver => 300.0,
            Tier::Gold => 400.0,
            Tier::Platinum => 500.0,
            Tier::Diamond => 600.0,
            Tier::Master => 700.0,
            Tier::Grandmaster => 800.0,
            Tier::Challenger => 900.0,
        }
    }

    /// Below MASTER a standing is incomplete without its division
    pub fn has_divisions(self) -> bool {
        self < Tier::Master
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = SkillWarning;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == normalized)
            .ok_or_else(|| SkillWarning::UnknownTier {
                value: value.to_string(),
            })
    }
}

/// Divisions inside a tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    IV,
    III,
    II,
    I,
}

impl Division {
    /// Offset inside the tier band
    pub fn offset(self) -> f64 {
        match self {
            Division::IV => 0.0,
            Division::III => 25.0,
            Division::II => 50.0,
            Division::I => 75.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Division::IV => "IV",
            Division::III => "III",
            Division::II => "II",
            Division::I => "I",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = SkillWarning;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IV" | "4" => Ok(Division::IV),
            "III" | "3" => Ok(Division::III),
            "II" | "2" => Ok(Division::II),
            "I" | "1" => Ok(Division::I),
            _ => Err(SkillWarning::UnknownDivision {
                value: value.to_string(),
            }),
        }
    }
}

/// A player's typed solo/duo standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RankState {
    Ranked {
        tier: Tier,
        /// `None` only for apex tiers
        division: Option<Division>,
        league_points: u32,
    },
    Unranked {
        games_played: u32,
    },
}

impl RankState {
    pub fn ranked(tier: Tier, division: Option<Division>, league_points: u32) -> Self {
        RankState::Ranked {
            tier,
            division,
            league_points,
        }
    }

    pub fn unranked(games_played: u32) -> Self {
        RankState::Unranked { games_played }
    }

    /// Ordering key for leaderboards: ranked above unranked, then tier,
    /// division and league points.
    pub fn leaderboard_key(&self) -> (u8, u8, u8, u32) {
        match self {
            RankState::Ranked {
                tier,
                division,
                league_points,
            } => (
                1,
                *tier as u8,
                division.map(|d| d as u8 + 1).unwrap_or(0),
                *league_points,
            ),
            RankState::Unranked { .. } => (0, 0, 0, 0),
        }
    }
}

impl fmt::Display for RankState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankState::Ranked {
                tier,
                division: Some(division),
                ..
            } => write!(f, "{} {}", tier, division),
            RankState::Ranked { tier, .. } => write!(f, "{}", tier),
            RankState::Unranked { .. } => f.write_str("Unranked"),
        }
    }
}

/// Rank data as reported by the Riot API, before it is trusted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportedRank {
    /// `None` when the player has no solo/duo entry
    pub tier: Option<String>,
    pub division: Option<String>,
    pub league_points: u32,
    pub games_played: u32,
}

impl ReportedRank {
    pub fn ranked(
        tier: impl Into<String>,
        division: impl Into<String>,
        league_points: u32,
        games_played: u32,
    ) -> Self {
        Self {
            tier: Some(tier.into()),
            division: Some(division.into()),
            league_points,
            games_played,
        }
    }

    pub fn unranked(games_played: u32) -> Self {
        Self {
            games_played,
            ..Self::default()
        }
    }

    /// The typed standing, when every reported value is recognized
    pub fn rank_state(&self) -> Option<RankState> {
        let Some(tier) = &self.tier else {
            return Some(RankState::unranked(self.games_played));
        };
        let tier: Tier = tier.parse().ok()?;
        let division = match self.division.as_deref() {
            Some(raw) => Some(raw.parse::<Division>().ok()?),
            None if tier.has_divisions() => return None,
            None => None,
        };
        Some(RankState::ranked(tier, division, self.league_points))
    }
}

impl From<&RankState> for ReportedRank {
    fn from(state: &RankState) -> Self {
        match state {
            RankState::Ranked {
                tier,
                division,
                league_points,
            } => Self {
                tier: Some(tier.to_string()),
                division: division.map(|d| d.to_string()),
                league_points: *league_points,
                games_played: 0,
            },
            RankState::Unranked { games_played } => Self::unranked(*games_played),
        }
    }
}

impl fmt::Display for ReportedRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(state) = self.rank_state() {
            return write!(f, "{}", state);
        }
        match (&self.tier, &self.division) {
            (Some(tier), Some(division)) => write!(f, "{} {}", tier, division),
            (Some(tier), None) => write!(f, "{}", tier),
            (None, _) => f.write_str("Unranked"),
        }
    }
}

/// Data-quality defects found while scoring
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum SkillWarning {
    #[error("unknown tier '{value}' scored as zero")]
    UnknownTier { value: String },

    #[error("unknown division '{value}' scored as zero")]
    UnknownDivision { value: String },

    #[error("missing division for tier {tier}, scored as zero")]
    MissingDivision { tier: Tier },
}

/// Skill value plus any defects found in the input
#[derive(Debug, Clone, PartialEq)]
pub struct SkillAssessment {
    pub value: f64,
    pub warnings: Vec<SkillWarning>,
}

/// Maps ranked standings onto one comparable scale
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillModel;

impl SkillModel {
    pub fn new() -> Self {
        Self
    }

    /// Score a typed standing
    pub fn score(&self, rank: &RankState) -> f64 {
        match rank {
            RankState::Ranked { tier, division, .. } => {
                tier.base_value() + division.map(Division::offset).unwrap_or(0.0)
            }
            RankState::Unranked { games_played } => unranked_value(*games_played),
        }
    }

    /// Score raw API values term by term; unrecognized terms contribute zero
    pub fn assess(&self, reported: &ReportedRank) -> SkillAssessment {
        let Some(raw_tier) = &reported.tier else {
            return SkillAssessment {
                value: unranked_value(reported.games_played),
                warnings: Vec::new(),
            };
        };

        let mut warnings = Vec::new();
        let tier = match raw_tier.parse::<Tier>() {
            Ok(tier) => Some(tier),
            Err(warning) => {
                warnings.push(warning);
                None
            }
        };

        let tier_term = tier.map(Tier::base_value).unwrap_or(0.0);
        let division_term = match (tier, reported.division.as_deref()) {
            (Some(tier), None) => {
                if tier.has_divisions() {
                    warnings.push(SkillWarning::MissingDivision { tier });
                }
                0.0
            }
            (None, None) => 0.0,
            (_, Some(raw_division)) => match raw_division.parse::<Division>() {
                Ok(division) => division.offset(),
                Err(warning) => {
                    warnings.push(warning);
                    0.0
                }
            },
        };

        for warning in &warnings {
            warn!("Rank data-quality defect: {}", warning);
        }

        SkillAssessment {
            value: tier_term + division_term,
            warnings,
        }
    }
}

fn unranked_value(games_played: u32) -> f64 {
    UNRANKED_BASELINE + games_played.min(UNRANKED_GAMES_CAP) as f64
}
