//! Branch-and-bound search for the most even two-team split
//!
//! Players are assigned in roster order, team 1 first. Each call of the search
//! receives its own `SearchState` snapshot, so backtracking is just returning.

use crate::error::{BotError, Result};
use crate::utils::skill_difference;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Largest roster the exhaustive search accepts
pub const MAX_ROSTER_SIZE: usize = 32;

/// How the search decides whether a branch is worth exploring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStrategy {
    /// Explore a branch only if the difference right after the move beats the
    /// best split so far. Fast, but can miss the optimum on adversarial orders.
    #[default]
    Lookahead,
    /// Explore a branch only if the best difference still reachable with the
    /// remaining players beats the best split so far. Always optimal.
    Exact,
}

impl std::fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceStrategy::Lookahead => write!(f, "lookahead"),
            BalanceStrategy::Exact => write!(f, "exact"),
        }
    }
}

impl FromStr for BalanceStrategy {
    type Err = BotError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lookahead" => Ok(BalanceStrategy::Lookahead),
            "exact" => Ok(BalanceStrategy::Exact),
            other => Err(BotError::ConfigurationError {
                message: format!("Unknown balance strategy: {}", other),
            }),
        }
    }
}

/// A roster member paired with its skill value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPlayer<P> {
    pub player: P,
    pub skill_value: f64,
}

impl<P> ScoredPlayer<P> {
    pub fn new(player: P, skill_value: f64) -> Self {
        Self {
            player,
            skill_value,
        }
    }
}

/// Target team sizes for a roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamSizes {
    pub team1: usize,
    pub team2: usize,
}

impl TeamSizes {
    /// Team 1 is capped at floor(N/2); team 2 takes the remainder
    pub fn for_roster(roster_size: usize) -> Self {
        Self {
            team1: roster_size / 2,
            team2: roster_size - roster_size / 2,
        }
    }
}

/// A split expressed as roster indices
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub team1: Vec<usize>,
    pub team2: Vec<usize>,
    pub difference: f64,
}

/// Two teams covering the roster exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAssignment<P> {
    pub team1: Vec<ScoredPlayer<P>>,
    pub team2: Vec<ScoredPlayer<P>>,
}

impl<P> TeamAssignment<P> {
    pub fn team1_skill(&self) -> f64 {
        self.team1.iter().map(|p| p.skill_value).sum()
    }

    pub fn team2_skill(&self) -> f64 {
        self.team2.iter().map(|p| p.skill_value).sum()
    }

    pub fn difference(&self) -> f64 {
        skill_difference(self.team1_skill(), self.team2_skill())
    }

    pub fn len(&self) -> usize {
        self.team1.len() + self.team2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Team1,
    Team2,
}

/// One node of the depth-first search
#[derive(Debug, Clone)]
struct SearchState {
    index: usize,
    team1: Vec<usize>,
    team2: Vec<usize>,
    team1_skill: f64,
    team2_skill: f64,
}

impl SearchState {
    fn root() -> Self {
        Self {
            index: 0,
            team1: Vec::new(),
            team2: Vec::new(),
            team1_skill: 0.0,
            team2_skill: 0.0,
        }
    }

    /// The state after placing the current player on `side`
    fn assign(&self, side: Side, skill: f64) -> Self {
        let mut next = self.clone();
        match side {
            Side::Team1 => {
                next.team1.push(self.index);
                next.team1_skill += skill;
            }
            Side::Team2 => {
                next.team2.push(self.index);
                next.team2_skill += skill;
            }
        }
        next.index += 1;
        next
    }

    fn difference(&self) -> f64 {
        skill_difference(self.team1_skill, self.team2_skill)
    }
}

struct Search<'a> {
    skills: &'a [f64],
    sizes: TeamSizes,
    strategy: BalanceStrategy,
    /// Ascending skills of players `index..`, with prefix sums, per index
    remaining: Vec<RemainingPlayers>,
    best: Option<Split>,
    nodes_visited: u64,
}

struct RemainingPlayers {
    prefix_sums: Vec<f64>,
}

impl RemainingPlayers {
    fn new(skills: &[f64]) -> Self {
        let mut sorted = skills.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mut prefix_sums = Vec::with_capacity(sorted.len() + 1);
        prefix_sums.push(0.0);
        for skill in sorted {
            prefix_sums.push(prefix_sums[prefix_sums.len() - 1] + skill);
        }
        Self { prefix_sums }
    }

    fn total(&self) -> f64 {
        self.prefix_sums[self.prefix_sums.len() - 1]
    }

    fn smallest(&self, count: usize) -> f64 {
        self.prefix_sums[count]
    }

    fn largest(&self, count: usize) -> f64 {
        self.total() - self.prefix_sums[self.prefix_sums.len() - 1 - count]
    }
}

impl<'a> Search<'a> {
    fn new(skills: &'a [f64], strategy: BalanceStrategy) -> Self {
        let remaining = match strategy {
            BalanceStrategy::Exact => (0..=skills.len())
                .map(|index| RemainingPlayers::new(&skills[index..]))
                .collect(),
            BalanceStrategy::Lookahead => Vec::new(),
        };

        Self {
            skills,
            sizes: TeamSizes::for_roster(skills.len()),
            strategy,
            remaining,
            best: None,
            nodes_visited: 0,
        }
    }

    fn best_difference(&self) -> f64 {
        self.best
            .as_ref()
            .map(|best| best.difference)
            .unwrap_or(f64::INFINITY)
    }

    fn explore(&mut self, state: SearchState) {
        self.nodes_visited += 1;

        if state.index == self.skills.len() {
            let difference = state.difference();
            if difference < self.best_difference() {
                self.best = Some(Split {
                    team1: state.team1,
                    team2: state.team2,
                    difference,
                });
            }
            return;
        }

        let skill = self.skills[state.index];

        if state.team1.len() < self.sizes.team1 {
            let next = state.assign(Side::Team1, skill);
            if self.is_promising(&next) {
                self.explore(next);
            }
        }

        if state.team2.len() < self.sizes.team2 {
            let next = state.assign(Side::Team2, skill);
            if self.is_promising(&next) {
                self.explore(next);
            }
        }
    }

    fn is_promising(&self, next: &SearchState) -> bool {
        let bound = match self.strategy {
            BalanceStrategy::Lookahead => next.difference(),
            BalanceStrategy::Exact => self.reachable_difference(next),
        };
        bound < self.best_difference()
    }

    /// Smallest |team1 - team2| any completion of `state` can reach
    fn reachable_difference(&self, state: &SearchState) -> f64 {
        let remaining = &self.remaining[state.index];
        let team1_slots = self.sizes.team1 - state.team1.len();
        let base = state.team1_skill - state.team2_skill - remaining.total();

        // Final difference is base + 2 * (skill added to team 1)
        let low = base + 2.0 * remaining.smallest(team1_slots);
        let high = base + 2.0 * remaining.largest(team1_slots);

        if low > 0.0 {
            low
        } else if high < 0.0 {
            -high
        } else {
            0.0
        }
    }
}

/// Splits scored rosters into two skill-balanced teams
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamBalancer {
    strategy: BalanceStrategy,
}

impl TeamBalancer {
    pub fn new(strategy: BalanceStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> BalanceStrategy {
        self.strategy
    }

    /// Find the split of `skills` with the smallest skill-sum difference
    pub fn split(&self, skills: &[f64]) -> Result<Split> {
        validate_roster(skills)?;

        let mut search = Search::new(skills, self.strategy);
        search.explore(SearchState::root());

        debug!(
            "Balanced {} players with {} strategy - nodes visited: {}, best difference: {:.1}",
            skills.len(),
            self.strategy,
            search.nodes_visited,
            search.best_difference()
        );

        search.best.ok_or_else(|| {
            BotError::NoFeasiblePartition {
                roster_size: skills.len(),
            }
            .into()
        })
    }

    /// Partition a scored roster into two teams
    pub fn balance<P: Clone>(&self, roster: &[ScoredPlayer<P>]) -> Result<TeamAssignment<P>> {
        let skills: Vec<f64> = roster.iter().map(|p| p.skill_value).collect();
        let split = self.split(&skills)?;

        Ok(TeamAssignment {
            team1: split.team1.iter().map(|&i| roster[i].clone()).collect(),
            team2: split.team2.iter().map(|&i| roster[i].clone()).collect(),
        })
    }
}

fn validate_roster(skills: &[f64]) -> Result<()> {
    if skills.len() < 2 {
        return Err(BotError::PreconditionViolation {
            reason: format!(
                "at least 2 players are required to balance teams, got {}",
                skills.len()
            ),
        }
        .into());
    }

    if skills.len() > MAX_ROSTER_SIZE {
        return Err(BotError::PreconditionViolation {
            reason: format!(
                "rosters are limited to {} players, got {}",
                MAX_ROSTER_SIZE,
                skills.len()
            ),
        }
        .into());
    }

    if let Some((index, skill)) = skills
        .iter()
        .enumerate()
        .find(|(_, skill)| !skill.is_finite() || **skill < 0.0)
    {
        return Err(BotError::PreconditionViolation {
            reason: format!("player {} has invalid skill value {}", index, skill),
        }
        .into());
    }

    Ok(())
}
