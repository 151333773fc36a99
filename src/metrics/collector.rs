//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the bot: interaction handling,
//! Riot API traffic, lobby lifecycle and team balancing runs.

use crate::balance::BalanceStrategy;
use crate::lobby::manager::LobbyManagerStats;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the bot
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Slash command and button metrics
    command_metrics: CommandMetrics,

    /// Riot API client metrics
    riot_metrics: RiotMetrics,

    /// Lobby-related metrics
    lobby_metrics: LobbyMetrics,

    /// Team balancing metrics
    balance_metrics: BalanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Interactions received on the HTTP endpoint, by interaction type
    pub interactions_total: IntCounterVec,

    /// Interactions rejected by signature verification
    pub signature_failures_total: IntCounter,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Command handling metrics
#[derive(Clone)]
pub struct CommandMetrics {
    /// Commands handled, by command name and outcome
    pub commands_total: IntCounterVec,

    /// Command handling time, including Riot lookups
    pub command_duration: HistogramVec,

    /// Discord REST calls, by operation and outcome
    pub discord_requests_total: IntCounterVec,
}

/// Riot API metrics
#[derive(Clone)]
pub struct RiotMetrics {
    /// Requests sent, by endpoint and status class
    pub requests_total: IntCounterVec,

    /// Requests retried after 429 or 5xx responses
    pub retries_total: IntCounterVec,

    /// Times a request waited on the local rate limiter
    pub rate_limited_total: IntCounter,

    /// Request latency
    pub request_duration: HistogramVec,
}

/// Lobby-related metrics
#[derive(Clone)]
pub struct LobbyMetrics {
    /// Number of open lobbies
    pub active_lobbies: IntGauge,

    /// Total lobbies created
    pub lobbies_created_total: IntCounter,

    /// Total lobbies cleaned up
    pub lobbies_cleaned_total: IntCounter,

    /// Join and leave actions, by action and outcome
    pub player_actions_total: IntCounterVec,

    /// Players currently waiting in lobbies
    pub players_waiting: IntGauge,
}

/// Team balancing metrics
#[derive(Clone)]
pub struct BalanceMetrics {
    /// Balancing runs, by strategy and outcome
    pub runs_total: IntCounterVec,

    /// Search time
    pub duration: HistogramVec,

    /// Skill difference of the returned split
    pub skill_difference: Histogram,

    /// Roster size handed to the balancer
    pub roster_size: Histogram,

    /// Players dropped from a roster because their lookup failed
    pub skipped_players_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let command_metrics = CommandMetrics::new(&registry)?;
        let riot_metrics = RiotMetrics::new(&registry)?;
        let lobby_metrics = LobbyMetrics::new(&registry)?;
        let balance_metrics = BalanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            command_metrics,
            riot_metrics,
            lobby_metrics,
            balance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn command(&self) -> &CommandMetrics {
        &self.command_metrics
    }

    pub fn riot(&self) -> &RiotMetrics {
        &self.riot_metrics
    }

    pub fn lobby(&self) -> &LobbyMetrics {
        &self.lobby_metrics
    }

    pub fn balance(&self) -> &BalanceMetrics {
        &self.balance_metrics
    }

    /// Update gauges from lobby manager stats
    pub fn update_from_lobby_stats(&self, stats: &LobbyManagerStats) {
        self.lobby_metrics
            .active_lobbies
            .set(stats.active_lobbies as i64);
        self.lobby_metrics
            .players_waiting
            .set(stats.players_waiting as i64);
    }

    /// Record an interaction arriving on the HTTP endpoint
    pub fn record_interaction(&self, kind: &str) {
        self.service_metrics
            .interactions_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_signature_failure(&self) {
        self.service_metrics.signature_failures_total.inc();
    }

    /// Record a handled command or button press
    pub fn record_command(&self, command: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.command_metrics
            .commands_total
            .with_label_values(&[command, status])
            .inc();

        self.command_metrics
            .command_duration
            .with_label_values(&[command])
            .observe(duration.as_secs_f64());
    }

    /// Record a Discord REST call
    pub fn record_discord_request(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.command_metrics
            .discord_requests_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record a completed Riot API request
    pub fn record_riot_request(&self, endpoint: &str, status: u16, duration: Duration) {
        let status_class = format!("{}xx", status / 100);

        self.riot_metrics
            .requests_total
            .with_label_values(&[endpoint, status_class.as_str()])
            .inc();

        self.riot_metrics
            .request_duration
            .with_label_values(&[endpoint])
            .observe(duration.as_secs_f64());
    }

    pub fn record_riot_retry(&self, endpoint: &str) {
        self.riot_metrics
            .retries_total
            .with_label_values(&[endpoint])
            .inc();
    }

    pub fn record_rate_limited(&self) {
        self.riot_metrics.rate_limited_total.inc();
    }

    /// Record a lobby being created
    pub fn record_lobby_created(&self) {
        self.lobby_metrics.lobbies_created_total.inc();
        self.lobby_metrics.active_lobbies.inc();
    }

    /// Record lobbies removed by the cleanup task
    pub fn record_lobbies_cleaned(&self, count: u64) {
        self.lobby_metrics.lobbies_cleaned_total.inc_by(count);
    }

    /// Record a join or leave button press
    pub fn record_player_action(&self, action: &str, accepted: bool) {
        let outcome = if accepted { "accepted" } else { "rejected" };
        self.lobby_metrics
            .player_actions_total
            .with_label_values(&[action, outcome])
            .inc();
    }

    /// Record a successful balancing run
    pub fn record_balance(
        &self,
        strategy: BalanceStrategy,
        roster_size: usize,
        difference: f64,
        duration: Duration,
    ) {
        let strategy = strategy.to_string();

        self.balance_metrics
            .runs_total
            .with_label_values(&[strategy.as_str(), "success"])
            .inc();

        self.balance_metrics
            .duration
            .with_label_values(&[strategy.as_str()])
            .observe(duration.as_secs_f64());

        self.balance_metrics.skill_difference.observe(difference);
        self.balance_metrics.roster_size.observe(roster_size as f64);
    }

    /// Record a balancing run that did not produce teams
    pub fn record_balance_failure(&self, strategy: BalanceStrategy) {
        self.balance_metrics
            .runs_total
            .with_label_values(&[strategy.to_string().as_str(), "error"])
            .inc();
    }

    pub fn record_skipped_players(&self, count: usize) {
        self.balance_metrics
            .skipped_players_total
            .inc_by(count as u64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds = IntGauge::new("riftbot_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let interactions_total = IntCounterVec::new(
            Opts::new(
                "riftbot_interactions_total",
                "Interactions received from Discord",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(interactions_total.clone()))?;

        let signature_failures_total = IntCounter::new(
            "riftbot_signature_failures_total",
            "Interactions rejected by signature verification",
        )?;
        registry.register(Box::new(signature_failures_total.clone()))?;

        let health_status = IntGauge::new(
            "riftbot_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("riftbot_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            interactions_total,
            signature_failures_total,
            health_status,
            component_health,
        })
    }
}

impl CommandMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let commands_total = IntCounterVec::new(
            Opts::new("riftbot_commands_total", "Commands handled"),
            &["command", "status"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new(
                "riftbot_command_duration_seconds",
                "Command handling duration",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let discord_requests_total = IntCounterVec::new(
            Opts::new("riftbot_discord_requests_total", "Discord REST calls"),
            &["operation", "status"],
        )?;
        registry.register(Box::new(discord_requests_total.clone()))?;

        Ok(Self {
            commands_total,
            command_duration,
            discord_requests_total,
        })
    }
}

impl RiotMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("riftbot_riot_requests_total", "Riot API requests"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let retries_total = IntCounterVec::new(
            Opts::new("riftbot_riot_retries_total", "Riot API request retries"),
            &["endpoint"],
        )?;
        registry.register(Box::new(retries_total.clone()))?;

        let rate_limited_total = IntCounter::new(
            "riftbot_riot_rate_limited_total",
            "Requests delayed by the local rate limiter",
        )?;
        registry.register(Box::new(rate_limited_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "riftbot_riot_request_duration_seconds",
                "Riot API request duration",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            requests_total,
            retries_total,
            rate_limited_total,
            request_duration,
        })
    }
}

impl LobbyMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_lobbies = IntGauge::new("riftbot_active_lobbies", "Number of open lobbies")?;
        registry.register(Box::new(active_lobbies.clone()))?;

        let lobbies_created_total =
            IntCounter::new("riftbot_lobbies_created_total", "Total lobbies created")?;
        registry.register(Box::new(lobbies_created_total.clone()))?;

        let lobbies_cleaned_total =
            IntCounter::new("riftbot_lobbies_cleaned_total", "Total lobbies cleaned up")?;
        registry.register(Box::new(lobbies_cleaned_total.clone()))?;

        let player_actions_total = IntCounterVec::new(
            Opts::new(
                "riftbot_lobby_player_actions_total",
                "Lobby join and leave actions",
            ),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(player_actions_total.clone()))?;

        let players_waiting = IntGauge::new(
            "riftbot_lobby_players_waiting",
            "Players currently waiting in lobbies",
        )?;
        registry.register(Box::new(players_waiting.clone()))?;

        Ok(Self {
            active_lobbies,
            lobbies_created_total,
            lobbies_cleaned_total,
            player_actions_total,
            players_waiting,
        })
    }
}

impl BalanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let runs_total = IntCounterVec::new(
            Opts::new("riftbot_balance_runs_total", "Team balancing runs"),
            &["strategy", "outcome"],
        )?;
        registry.register(Box::new(runs_total.clone()))?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "riftbot_balance_duration_seconds",
                "Team balancing search time",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0]),
            &["strategy"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        let skill_difference = Histogram::with_opts(
            HistogramOpts::new(
                "riftbot_balance_skill_difference",
                "Skill difference between balanced teams",
            )
            .buckets(vec![0.0, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0]),
        )?;
        registry.register(Box::new(skill_difference.clone()))?;

        let roster_size = Histogram::with_opts(
            HistogramOpts::new("riftbot_balance_roster_size", "Players per balancing run")
                .buckets(vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 16.0, 20.0]),
        )?;
        registry.register(Box::new(roster_size.clone()))?;

        let skipped_players_total = IntCounter::new(
            "riftbot_balance_skipped_players_total",
            "Players skipped because their rank lookup failed",
        )?;
        registry.register(Box::new(skipped_players_total.clone()))?;

        Ok(Self {
            runs_total,
            duration,
            skill_difference,
            roster_size,
            skipped_players_total,
        })
    }
}
