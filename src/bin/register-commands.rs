//! Register the bot's slash commands with Discord
//!
//! Usage:
//!   cargo run --bin register-commands -- --config riftbot.toml
//!   cargo run --bin register-commands -- --guild 123456789012345678
//!   cargo run --bin register-commands -- --print

use anyhow::{bail, Result};
use clap::Parser;
use riftbot::config::AppConfig;
use riftbot::discord::{command_definitions, DiscordApi, HttpDiscordClient};
use riftbot::metrics::MetricsCollector;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "register-commands")]
#[command(about = "Overwrite riftbot's slash commands through the Discord REST API")]
struct Cli {
    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Register to a single guild instead of globally
    #[arg(long, value_name = "GUILD_ID")]
    guild: Option<String>,

    /// Print the command definitions as JSON instead of registering them
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let definitions = command_definitions();

    if cli.print {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };
    if let Some(guild) = cli.guild {
        config.discord.guild_id = Some(guild);
    }

    if config.discord.application_id.is_empty() || config.discord.bot_token.is_empty() {
        bail!("DISCORD_APPLICATION_ID and DISCORD_BOT_TOKEN must be set to register commands");
    }

    let target = match &config.discord.guild_id {
        Some(guild) => format!("guild {}", guild),
        None => "all guilds".to_string(),
    };
    println!(
        "Started refreshing {} application (/) commands for {}.",
        definitions.len(),
        target
    );

    let client = HttpDiscordClient::new(config.discord, Arc::new(MetricsCollector::new()?))?;
    let installed = client.install_commands(definitions).await?;

    println!("Successfully reloaded {} application (/) commands.", installed);
    Ok(())
}
