//! Discord REST calls made outside the interaction response
//!
//! Deferred replies are completed through the interaction webhook, lobby
//! messages are edited through the channel endpoint with the bot token, and
//! commands are installed with a bulk overwrite.

use crate::config::DiscordSettings;
use crate::discord::commands::CommandDefinition;
use crate::discord::interaction::MessagePayload;
use crate::error::{BotError, Result};
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Attempts per request when Discord answers 429
const MAX_ATTEMPTS: u32 = 3;

/// Discord REST operations the handlers need
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// Replace the deferred "thinking" placeholder of an interaction
    async fn edit_original_response(
        &self,
        interaction_token: &str,
        payload: MessagePayload,
    ) -> Result<()>;

    /// Send another message for an interaction
    async fn create_followup(&self, interaction_token: &str, payload: MessagePayload)
        -> Result<()>;

    /// Edit a message the bot posted in a channel
    async fn edit_channel_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: MessagePayload,
    ) -> Result<()>;

    /// Overwrite the registered slash commands, returning how many were installed
    async fn install_commands(&self, commands: Vec<CommandDefinition>) -> Result<usize>;
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// `DiscordApi` over HTTPS
pub struct HttpDiscordClient {
    http: reqwest::Client,
    settings: DiscordSettings,
    metrics: Arc<MetricsCollector>,
}

impl HttpDiscordClient {
    pub fn new(settings: DiscordSettings, metrics: Arc<MetricsCollector>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("riftbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            settings,
            metrics,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base_url.trim_end_matches('/'), path)
    }

    async fn send<B: Serialize + Sync>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: &B,
        authorized: bool,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut request = self.http.request(method.clone(), &url).json(body);
            if authorized {
                request = request.header(
                    reqwest::header::AUTHORIZATION,
                    format!("Bot {}", self.settings.bot_token),
                );
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                self.metrics.record_discord_request(operation, true);
                debug!("Discord {} {} -> {}", method, path, status);
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_ATTEMPTS {
                let retry_after = response
                    .json::<RateLimitBody>()
                    .await
                    .map(|body| Duration::from_secs_f64(body.retry_after.max(0.0)))
                    .unwrap_or(Duration::from_secs(1));
                warn!(
                    "Discord {} attempt {} rate limited. Retrying in {:?}",
                    operation, attempt, retry_after
                );
                sleep(retry_after).await;
                continue;
            }

            self.metrics.record_discord_request(operation, false);
            let message = response.text().await.unwrap_or_default();
            return Err(BotError::DiscordApi {
                status: status.as_u16(),
                message,
            }
            .into());
        }
    }

    fn commands_path(&self) -> String {
        match &self.settings.guild_id {
            Some(guild_id) => format!(
                "applications/{}/guilds/{}/commands",
                self.settings.application_id, guild_id
            ),
            None => format!("applications/{}/commands", self.settings.application_id),
        }
    }
}

#[async_trait]
impl DiscordApi for HttpDiscordClient {
    async fn edit_original_response(
        &self,
        interaction_token: &str,
        payload: MessagePayload,
    ) -> Result<()> {
        let path = format!(
            "webhooks/{}/{}/messages/@original",
            self.settings.application_id, interaction_token
        );
        self.send("edit_original", Method::PATCH, &path, &payload, false)
            .await?;
        Ok(())
    }

    async fn create_followup(
        &self,
        interaction_token: &str,
        payload: MessagePayload,
    ) -> Result<()> {
        let path = format!(
            "webhooks/{}/{}",
            self.settings.application_id, interaction_token
        );
        self.send("followup", Method::POST, &path, &payload, false)
            .await?;
        Ok(())
    }

    async fn edit_channel_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: MessagePayload,
    ) -> Result<()> {
        let path = format!("channels/{}/messages/{}", channel_id, message_id);
        self.send("edit_message", Method::PATCH, &path, &payload, true)
            .await?;
        Ok(())
    }

    async fn install_commands(&self, commands: Vec<CommandDefinition>) -> Result<usize> {
        let path = self.commands_path();
        let response = self
            .send("install_commands", Method::PUT, &path, &commands, true)
            .await?;
        let installed: Vec<serde_json::Value> = response.json().await?;
        Ok(installed.len())
    }
}
