//! riftbot server binary
//!
//! Reads the configuration, answers Discord interactions over HTTP until
//! SIGINT or SIGTERM arrives, then drains the server within the configured
//! shutdown timeout.

use anyhow::{Context, Result};
use clap::Parser;
use riftbot::config::{AppConfig, ProfileStorageKind};
use riftbot::service::{AppState, HealthCheck, ServiceContext};
use std::path::PathBuf;
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// riftbot - League of Legends stats and balanced custom lobbies for Discord
#[derive(Parser)]
#[command(
    name = "riftbot",
    version,
    about = "A Discord bot for League of Legends stats and skill-balanced custom lobbies",
    long_about = "riftbot answers Discord slash commands over the HTTP interactions endpoint, \
                 looks up ranks, masteries and live games through the Riot API, and splits \
                 custom lobbies into two teams with the smallest possible skill difference."
)]
struct Args {
    /// TOML configuration; environment variables are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Probe a running instance's /health endpoint and exit with its status
    #[arg(long)]
    health_check: bool,

    /// Tracing filter, e.g. `info` or `riftbot=debug`
    #[arg(short, long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Port of the interactions endpoint
    #[arg(long, value_name = "PORT")]
    http_port: Option<u16>,

    /// Region used when a command omits one
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Keep linked profiles in this JSON file
    #[arg(long, value_name = "FILE")]
    profiles: Option<PathBuf>,

    /// Shorthand for `--log-level debug`
    #[arg(short, long)]
    debug: bool,

    /// Validate the configuration, print the summary and exit
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// Resolve the configuration source, then layer the flags on top
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AppConfig::from_env()?,
        };

        if let Some(filter) = &self.log_level {
            config.service.log_level = filter.clone();
        }
        if self.debug {
            config.service.log_level = "debug".to_string();
        }
        if let Some(port) = self.http_port {
            config.service.http_port = port;
        }
        if let Some(region) = &self.region {
            config.riot.default_region = region.clone();
        }
        if let Some(path) = &self.profiles {
            config.profiles.storage = ProfileStorageKind::Json;
            config.profiles.path = path.clone();
        }

        riftbot::config::validate_config(&config)?;
        Ok(config)
    }
}

fn init_logging(filter: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Exit code 0 when the local instance reports itself healthy
async fn probe_health(config: &AppConfig) -> i32 {
    let url = format!("http://127.0.0.1:{}/health", config.service.http_port);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build health check client: {}", e);
            return 1;
        }
    };

    match client.get(&url).send().await {
        Ok(response) => {
            let healthy = response.status().is_success();
            println!(
                "{} is {} ({})",
                url,
                if healthy { "healthy" } else { "unhealthy" },
                response.status()
            );
            if healthy {
                0
            } else {
                1
            }
        }
        Err(e) => {
            error!("Health check against {} failed: {}", url, e);
            1
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Periodic one-line status in the log
async fn log_health(context: ServiceContext) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    while context.is_running().await {
        interval.tick().await;

        match HealthCheck::check(&context).await {
            Ok(health) => info!(
                "{} | lobbies: {} | waiting players: {} | linked profiles: {} | {}",
                health.status,
                health.stats.active_lobbies,
                health.stats.players_waiting,
                health.stats.linked_profiles,
                health.stats.uptime_info
            ),
            Err(e) => warn!("Health check failed: {}", e),
        }
    }
}

fn log_summary(config: &AppConfig) {
    info!("🚀 riftbot {}", env!("CARGO_PKG_VERSION"));
    info!("   Service: {}", config.service.name);
    info!("   Interactions: http://{}/interactions", config.bind_address());
    info!("   Default region: {}", config.riot.default_region);
    info!(
        "   Lobbies: {} players by default, {} balancing",
        config.lobby.default_max_players, config.lobby.balance_strategy
    );
    match config.profiles.storage {
        ProfileStorageKind::Memory => info!("   Profiles: in memory"),
        ProfileStorageKind::Json => info!("   Profiles: {}", config.profiles.path.display()),
    }
    if !config.discord.verify_signatures {
        warn!("   Signature verification is OFF");
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

async fn run(config: AppConfig) -> Result<()> {
    let mut app = AppState::new(config.clone())
        .await
        .context("Failed to initialize riftbot")?;
    app.start().await.context("Failed to start riftbot")?;

    let status_task = tokio::spawn(log_health(app.context().clone()));
    info!("✅ riftbot is running, press Ctrl+C to stop");

    shutdown_signal().await;
    info!("🛑 Shutting down...");
    status_task.abort();

    match tokio::time::timeout(config.shutdown_timeout(), app.shutdown()).await {
        Ok(Ok(())) => info!("✅ Shutdown complete"),
        Ok(Err(e)) => warn!("Shutdown finished with errors: {}", e),
        Err(_) => warn!(
            "⚠️  Shutdown did not finish within {:?}, exiting anyway",
            config.shutdown_timeout()
        ),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if args.health_check {
        std::process::exit(probe_health(&config).await);
    }

    log_summary(&config);
    if args.dry_run {
        info!("Configuration is valid, not starting (dry run)");
        return Ok(());
    }

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
