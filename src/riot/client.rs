//! Riot Games API client
//!
//! `RiotApi` is the seam the command handlers and roster builder depend on;
//! `HttpRiotClient` talks to the real API (or any host set through
//! `riot.api_host_override`).

use crate::config::RiotSettings;
use crate::error::{BotError, Result};
use crate::metrics::MetricsCollector;
use crate::riot::models::{
    Account, ChampionCatalog, ChampionMastery, CurrentGame, LeagueEntry, RankedQueues, Summoner,
};
use crate::riot::rate_limit::RateLimiter;
use crate::riot::region::{encode_path_segment, PlatformRegion};
use crate::types::RiotId;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Upper bound for the exponential retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Champion id to display name
pub type ChampionNames = Arc<HashMap<i64, String>>;

/// Read access to the Riot endpoints the bot uses
#[async_trait]
pub trait RiotApi: Send + Sync {
    /// Resolve a Riot ID to its account (regional routing)
    async fn account_by_riot_id(&self, region: PlatformRegion, riot_id: &RiotId)
        -> Result<Account>;

    async fn summoner_by_puuid(&self, region: PlatformRegion, puuid: &str) -> Result<Summoner>;

    /// Ranked entries keyed by encrypted summoner id
    async fn league_entries_by_summoner(
        &self,
        region: PlatformRegion,
        summoner_id: &str,
    ) -> Result<RankedQueues>;

    /// Ranked entries keyed by PUUID
    async fn league_entries_by_puuid(
        &self,
        region: PlatformRegion,
        puuid: &str,
    ) -> Result<RankedQueues>;

    /// Every champion mastery of a player, highest points first
    async fn champion_masteries(
        &self,
        region: PlatformRegion,
        puuid: &str,
    ) -> Result<Vec<ChampionMastery>>;

    /// The `count` highest champion masteries of a player
    async fn top_champion_masteries(
        &self,
        region: PlatformRegion,
        puuid: &str,
        count: u32,
    ) -> Result<Vec<ChampionMastery>>;

    /// The game a player is currently in, `None` when they are not in one
    async fn active_game(&self, region: PlatformRegion, puuid: &str)
        -> Result<Option<CurrentGame>>;

    /// Champion id to name map from Data Dragon
    async fn champion_names(&self) -> Result<ChampionNames>;

    /// Ranked entries for a summoner, using the summoner id when the API still
    /// returns one
    async fn ranked_queues(
        &self,
        region: PlatformRegion,
        summoner: &Summoner,
    ) -> Result<RankedQueues> {
        match &summoner.id {
            Some(summoner_id) => self.league_entries_by_summoner(region, summoner_id).await,
            None => self.league_entries_by_puuid(region, &summoner.puuid).await,
        }
    }
}

/// `RiotApi` over HTTPS with rate limiting and retries
pub struct HttpRiotClient {
    http: reqwest::Client,
    settings: RiotSettings,
    limiter: RateLimiter,
    metrics: Arc<MetricsCollector>,
    champion_names: OnceCell<ChampionNames>,
}

impl HttpRiotClient {
    pub fn new(settings: RiotSettings, metrics: Arc<MetricsCollector>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .user_agent(concat!("riftbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BotError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let limiter = RateLimiter::new(
            settings.rate_limit_requests,
            Duration::from_millis(settings.rate_limit_window_ms),
        );

        info!(
            "Riot client ready - rate limit: {} requests / {}ms, max retries: {}",
            settings.rate_limit_requests, settings.rate_limit_window_ms, settings.max_retry_attempts
        );

        Ok(Self {
            http,
            settings,
            limiter,
            metrics,
            champion_names: OnceCell::new(),
        })
    }

    /// Base URL for platform-routed endpoints (`na1.api.riotgames.com`)
    fn platform_url(&self, region: PlatformRegion) -> String {
        match &self.settings.api_host_override {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.riotgames.com", region.as_str()),
        }
    }

    /// Base URL for regionally-routed endpoints (`americas.api.riotgames.com`)
    fn regional_url(&self, region: PlatformRegion) -> String {
        match &self.settings.api_host_override {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.riotgames.com", region.route().host()),
        }
    }

    fn ddragon_url(&self) -> &str {
        self.settings.ddragon_base_url.trim_end_matches('/')
    }

    /// Send an authenticated GET, retrying 429, 5xx and transport failures
    async fn send(&self, endpoint: &str, url: &str) -> Result<Response> {
        let mut retry_count = 0;
        let mut delay = Duration::from_millis(self.settings.retry_delay_ms);

        loop {
            if self.limiter.acquire().await? {
                self.metrics.record_rate_limited();
            }

            let timer = self.metrics.start_timer();
            let result = self
                .http
                .get(url)
                .header("X-Riot-Token", &self.settings.api_key)
                .send()
                .await;

            let failure = match result {
                Ok(response) => {
                    let status = response.status();
                    self.metrics
                        .record_riot_request(endpoint, status.as_u16(), timer.stop());

                    if status.is_success() {
                        return Ok(response);
                    }

                    if !is_retryable(status) || retry_count >= self.settings.max_retry_attempts {
                        return Err(BotError::RiotApi {
                            status: status.as_u16(),
                            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
                        }
                        .into());
                    }

                    if let Some(wait) = retry_after(&response) {
                        delay = wait;
                    }
                    format!("status {}", status)
                }
                Err(e) => {
                    if retry_count >= self.settings.max_retry_attempts {
                        return Err(BotError::RiotApi {
                            status: 0,
                            message: e.to_string(),
                        }
                        .into());
                    }
                    e.to_string()
                }
            };

            retry_count += 1;
            warn!(
                "Riot request {} attempt {} failed: {}. Retrying in {:?}",
                endpoint, retry_count, failure, delay
            );
            self.metrics.record_riot_retry(endpoint);

            sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &str) -> Result<T> {
        debug!("GET {} ({})", url, endpoint);
        let response = self.send(endpoint, url).await?;
        response.json::<T>().await.map_err(|e| {
            BotError::RiotApi {
                status: 200,
                message: format!("Malformed {} response: {}", endpoint, e),
            }
            .into()
        })
    }

    async fn fetch_champion_names(&self) -> Result<ChampionNames> {
        let versions_url = format!("{}/api/versions.json", self.ddragon_url());
        let versions: Vec<String> = self.get_static(&versions_url).await?;
        let version = versions.first().ok_or_else(|| BotError::RiotApi {
            status: 200,
            message: "Data Dragon returned no versions".to_string(),
        })?;

        let catalog_url = format!(
            "{}/cdn/{}/data/en_US/champion.json",
            self.ddragon_url(),
            version
        );
        let catalog: ChampionCatalog = self.get_static(&catalog_url).await?;
        let names = catalog.names_by_id();

        info!(
            "Loaded {} champion names from Data Dragon {}",
            names.len(),
            version
        );
        Ok(Arc::new(names))
    }

    /// Data Dragon is a CDN: no key, no rate limit
    async fn get_static<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::RiotApi {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::RiotApi {
                status: status.as_u16(),
                message: format!("Data Dragon request failed: {}", url),
            }
            .into());
        }

        Ok(response.json::<T>().await.map_err(|e| BotError::RiotApi {
            status: status.as_u16(),
            message: format!("Malformed Data Dragon response: {}", e),
        })?)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `Retry-After` in whole seconds
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl RiotApi for HttpRiotClient {
    async fn account_by_riot_id(
        &self,
        region: PlatformRegion,
        riot_id: &RiotId,
    ) -> Result<Account> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.regional_url(region),
            encode_path_segment(&riot_id.game_name),
            encode_path_segment(&riot_id.tag_line)
        );
        self.get_json("account_by_riot_id", &url).await
    }

    async fn summoner_by_puuid(&self, region: PlatformRegion, puuid: &str) -> Result<Summoner> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-puuid/{}",
            self.platform_url(region),
            encode_path_segment(puuid)
        );
        self.get_json("summoner_by_puuid", &url).await
    }

    async fn league_entries_by_summoner(
        &self,
        region: PlatformRegion,
        summoner_id: &str,
    ) -> Result<RankedQueues> {
        let url = format!(
            "{}/lol/league/v4/entries/by-summoner/{}",
            self.platform_url(region),
            encode_path_segment(summoner_id)
        );
        let entries: Vec<LeagueEntry> = self.get_json("league_entries", &url).await?;
        Ok(RankedQueues::from_entries(entries))
    }

    async fn league_entries_by_puuid(
        &self,
        region: PlatformRegion,
        puuid: &str,
    ) -> Result<RankedQueues> {
        let url = format!(
            "{}/lol/league/v4/entries/by-puuid/{}",
            self.platform_url(region),
            encode_path_segment(puuid)
        );
        let entries: Vec<LeagueEntry> = self.get_json("league_entries", &url).await?;
        Ok(RankedQueues::from_entries(entries))
    }

    async fn champion_masteries(
        &self,
        region: PlatformRegion,
        puuid: &str,
    ) -> Result<Vec<ChampionMastery>> {
        let url = format!(
            "{}/lol/champion-mastery/v4/champion-masteries/by-puuid/{}",
            self.platform_url(region),
            encode_path_segment(puuid)
        );
        self.get_json("champion_masteries", &url).await
    }

    async fn top_champion_masteries(
        &self,
        region: PlatformRegion,
        puuid: &str,
        count: u32,
    ) -> Result<Vec<ChampionMastery>> {
        let url = format!(
            "{}/lol/champion-mastery/v4/champion-masteries/by-puuid/{}/top?count={}",
            self.platform_url(region),
            encode_path_segment(puuid),
            count
        );
        self.get_json("top_champion_masteries", &url).await
    }

    async fn active_game(
        &self,
        region: PlatformRegion,
        puuid: &str,
    ) -> Result<Option<CurrentGame>> {
        let url = format!(
            "{}/lol/spectator/v5/active-games/by-summoner/{}",
            self.platform_url(region),
            encode_path_segment(puuid)
        );
        match self.get_json("active_game", &url).await {
            Ok(game) => Ok(Some(game)),
            Err(e) if crate::error::is_riot_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn champion_names(&self) -> Result<ChampionNames> {
        self.champion_names
            .get_or_try_init(|| self.fetch_champion_names())
            .await
            .cloned()
    }
}
