//! Roster gathering and team balancing for a lobby
//!
//! For every player in a balance ticket the linked profile is resolved to a
//! Riot account, then a summoner, then its ranked entries. Lookups are paced so
//! a full lobby stays under the Riot rate limit. Players whose lookups fail are
//! skipped and reported rather than failing the whole run.

use crate::balance::{BalanceStrategy, ScoredPlayer, TeamAssignment, TeamBalancer};
use crate::error::{BotError, Result};
use crate::lobby::manager::BalanceTicket;
use crate::metrics::MetricsCollector;
use crate::profile::ProfileStorage;
use crate::riot::RiotApi;
use crate::skill::{ReportedRank, SkillModel, SkillWarning};
use crate::types::DiscordUserId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// One looked-up lobby member
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub discord_id: DiscordUserId,
    pub reported: ReportedRank,
}

impl RosterEntry {
    /// `GOLD II, 45 LP` for ranked players, `Unranked, 12 Games` otherwise
    pub fn rank_label(&self) -> String {
        match (&self.reported.tier, &self.reported.division) {
            (Some(tier), Some(division)) => {
                format!("{} {}, {} LP", tier, division, self.reported.league_points)
            }
            (Some(tier), None) => format!("{}, {} LP", tier, self.reported.league_points),
            (None, _) => format!("Unranked, {} Games", self.reported.games_played),
        }
    }
}

/// A player left out of a balancing run
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPlayer {
    pub discord_id: DiscordUserId,
    pub reason: String,
}

/// Everything gathered for one balancing run
#[derive(Debug, Clone, Default)]
pub struct RosterReport {
    pub entries: Vec<RosterEntry>,
    pub skipped: Vec<SkippedPlayer>,
}

/// Two balanced teams plus the notes worth showing next to them
#[derive(Debug, Clone)]
pub struct BalancedTeams {
    pub assignment: TeamAssignment<RosterEntry>,
    pub warnings: Vec<(DiscordUserId, SkillWarning)>,
    pub skipped: Vec<SkippedPlayer>,
    pub strategy: BalanceStrategy,
}

/// Looks up the rank data for a list of Discord users
pub struct RosterBuilder {
    riot: Arc<dyn RiotApi>,
    profiles: Arc<dyn ProfileStorage>,
    pacing: Duration,
}

impl RosterBuilder {
    pub fn new(riot: Arc<dyn RiotApi>, profiles: Arc<dyn ProfileStorage>, pacing: Duration) -> Self {
        Self {
            riot,
            profiles,
            pacing,
        }
    }

    /// Look up every player in order, pausing between players
    pub async fn gather(&self, players: &[DiscordUserId]) -> RosterReport {
        let mut report = RosterReport::default();

        for (index, discord_id) in players.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }

            match self.lookup(discord_id).await {
                Ok(entry) => {
                    debug!("Rank for {}: {}", discord_id, entry.rank_label());
                    report.entries.push(entry);
                }
                Err(e) => {
                    warn!("Skipping player {} while balancing: {}", discord_id, e);
                    report.skipped.push(SkippedPlayer {
                        discord_id: discord_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn lookup(&self, discord_id: &str) -> Result<RosterEntry> {
        let profile =
            self.profiles
                .get_profile(discord_id)?
                .ok_or_else(|| BotError::ProfileNotFound {
                    discord_id: discord_id.to_string(),
                })?;

        let account = self
            .riot
            .account_by_riot_id(profile.region, &profile.riot_id)
            .await?;
        let summoner = self
            .riot
            .summoner_by_puuid(profile.region, &account.puuid)
            .await?;
        let queues = self.riot.ranked_queues(profile.region, &summoner).await?;
        let reported = queues.solo_rank();

        // Keep the leaderboard fresh with what we just saw
        if let Some(state) = reported.rank_state() {
            if let Err(e) = self.profiles.update_rank(discord_id, state) {
                warn!("Failed to cache rank for {}: {}", discord_id, e);
            }
        }

        Ok(RosterEntry {
            discord_id: discord_id.to_string(),
            reported,
        })
    }
}

/// Score a gathered roster and split it into two teams
pub fn balance_roster(
    report: RosterReport,
    model: &SkillModel,
    balancer: &TeamBalancer,
) -> Result<BalancedTeams> {
    if report.entries.len() < 2 {
        return Err(BotError::PreconditionViolation {
            reason: format!(
                "only {} of the lobby's players could be looked up",
                report.entries.len()
            ),
        }
        .into());
    }

    let mut warnings = Vec::new();
    let scored: Vec<ScoredPlayer<RosterEntry>> = report
        .entries
        .into_iter()
        .map(|entry| {
            let assessment = model.assess(&entry.reported);
            warnings.extend(
                assessment
                    .warnings
                    .into_iter()
                    .map(|warning| (entry.discord_id.clone(), warning)),
            );
            ScoredPlayer::new(entry, assessment.value)
        })
        .collect();

    let assignment = balancer.balance(&scored)?;

    Ok(BalancedTeams {
        assignment,
        warnings,
        skipped: report.skipped,
        strategy: balancer.strategy(),
    })
}

/// Runs the whole balance flow for a lobby ticket
pub struct LobbyBalancer {
    roster: RosterBuilder,
    model: SkillModel,
    balancer: TeamBalancer,
    metrics_collector: Arc<MetricsCollector>,
}

impl LobbyBalancer {
    pub fn new(
        roster: RosterBuilder,
        strategy: BalanceStrategy,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            roster,
            model: SkillModel::new(),
            balancer: TeamBalancer::new(strategy),
            metrics_collector,
        }
    }

    pub fn strategy(&self) -> BalanceStrategy {
        self.balancer.strategy()
    }

    /// Gather, score and partition the ticket's roster
    pub async fn run(&self, ticket: &BalanceTicket) -> Result<BalancedTeams> {
        let report = self.roster.gather(&ticket.players).await;
        self.metrics_collector
            .record_skipped_players(report.skipped.len());

        let roster_size = report.entries.len();
        let timer = self.metrics_collector.start_timer();

        match balance_roster(report, &self.model, &self.balancer) {
            Ok(teams) => {
                let duration = timer.stop();
                self.metrics_collector.record_balance(
                    teams.strategy,
                    roster_size,
                    teams.assignment.difference(),
                    duration,
                );
                info!(
                    "Balanced lobby {}: {} vs {} players, difference {:.1} ({} skipped)",
                    ticket.lobby_id,
                    teams.assignment.team1.len(),
                    teams.assignment.team2.len(),
                    teams.assignment.difference(),
                    teams.skipped.len()
                );
                Ok(teams)
            }
            Err(e) => {
                self.metrics_collector
                    .record_balance_failure(self.balancer.strategy());
                Err(e)
            }
        }
    }
}
