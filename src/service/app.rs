//! Main application state and service coordination
//!
//! `AppState` builds every component from the configuration, starts the HTTP
//! server and the background tasks, and tears them down again on shutdown.

use crate::config::{AppConfig, ProfileStorageKind};
use crate::discord::{
    DiscordApi, HandlerContext, HttpDiscordClient, InteractionHandler, SignatureVerifier,
};
use crate::lobby::{LobbyBalancer, LobbyManager, LobbyManagerStats, RosterBuilder};
use crate::metrics::MetricsCollector;
use crate::profile::{InMemoryProfileStorage, JsonFileProfileStorage, ProfileStorage};
use crate::riot::{HttpRiotClient, PlatformRegion, RiotApi};
use crate::service::http::HttpServer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Everything request handlers and health checks need, shared by clone
#[derive(Clone)]
pub struct ServiceContext {
    pub config: Arc<AppConfig>,
    pub metrics: Arc<MetricsCollector>,
    pub lobby_manager: Arc<LobbyManager>,
    pub profiles: Arc<dyn ProfileStorage>,
    pub handler: Arc<InteractionHandler>,
    /// `None` when signature verification is disabled
    pub verifier: Option<Arc<SignatureVerifier>>,
    pub is_running: Arc<RwLock<bool>>,
    pub started_at: DateTime<Utc>,
}

impl ServiceContext {
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }
}

/// Main application state containing all service components
pub struct AppState {
    context: ServiceContext,

    http_server: Arc<HttpServer>,
    http_task: Option<JoinHandle<()>>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Initialize the application with the HTTP Riot and Discord clients
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {}", config.service.name);

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let riot: Arc<dyn RiotApi> = Arc::new(
            HttpRiotClient::new(config.riot.clone(), metrics.clone()).map_err(|e| {
                ServiceError::Initialization {
                    message: format!("Failed to create Riot client: {}", e),
                }
            })?,
        );

        let discord: Arc<dyn DiscordApi> = Arc::new(
            HttpDiscordClient::new(config.discord.clone(), metrics.clone()).map_err(|e| {
                ServiceError::Initialization {
                    message: format!("Failed to create Discord client: {}", e),
                }
            })?,
        );

        let profiles = Self::initialize_profiles(&config)?;

        Self::with_components(config, metrics, riot, discord, profiles)
    }

    /// Assemble the service around existing clients and storage
    pub fn with_components(
        config: AppConfig,
        metrics: Arc<MetricsCollector>,
        riot: Arc<dyn RiotApi>,
        discord: Arc<dyn DiscordApi>,
        profiles: Arc<dyn ProfileStorage>,
    ) -> Result<Self, ServiceError> {
        let default_region = PlatformRegion::normalize(&config.riot.default_region).map_err(
            |e| ServiceError::Initialization {
                message: format!("Invalid default region: {}", e),
            },
        )?;

        let verifier = if config.discord.verify_signatures {
            let verifier = SignatureVerifier::from_hex(&config.discord.public_key).map_err(|e| {
                ServiceError::Initialization {
                    message: format!("Failed to load Discord public key: {}", e),
                }
            })?;
            Some(Arc::new(verifier))
        } else {
            warn!("Interaction signature verification is disabled");
            None
        };

        let lobby_manager = Arc::new(LobbyManager::new(config.lobby.clone(), metrics.clone()));
        let roster = RosterBuilder::new(riot.clone(), profiles.clone(), config.roster_pacing());
        let balancer = Arc::new(LobbyBalancer::new(
            roster,
            config.lobby.balance_strategy,
            metrics.clone(),
        ));

        let handler = Arc::new(InteractionHandler::new(HandlerContext {
            riot,
            profiles: profiles.clone(),
            lobbies: lobby_manager.clone(),
            balancer,
            discord,
            metrics: metrics.clone(),
            default_region,
        }));

        let context = ServiceContext {
            config: Arc::new(config),
            metrics,
            lobby_manager,
            profiles,
            handler,
            verifier,
            is_running: Arc::new(RwLock::new(false)),
            started_at: Utc::now(),
        };
        let http_server = Arc::new(HttpServer::new(context.clone()));

        Ok(Self {
            context,
            http_server,
            http_task: None,
            background_tasks: Vec::new(),
        })
    }

    fn initialize_profiles(config: &AppConfig) -> Result<Arc<dyn ProfileStorage>, ServiceError> {
        match config.profiles.storage {
            ProfileStorageKind::Memory => {
                info!("Using in-memory profile storage");
                Ok(Arc::new(InMemoryProfileStorage::new()))
            }
            ProfileStorageKind::Json => {
                info!(
                    "Using JSON profile storage at {}",
                    config.profiles.path.display()
                );
                let storage = JsonFileProfileStorage::open(&config.profiles.path).map_err(|e| {
                    ServiceError::Initialization {
                        message: format!("Failed to open profile storage: {}", e),
                    }
                })?;
                Ok(Arc::new(storage))
            }
        }
    }

    /// Start the HTTP server and background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {}", self.context.config.service.name);

        *self.context.is_running.write().await = true;

        self.start_http_server().await?;
        self.start_background_tasks();

        info!("✅ {} started successfully", self.context.config.service.name);
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown");

        *self.context.is_running.write().await = false;

        self.http_server.stop();
        if let Some(http_task) = self.http_task.take() {
            if let Err(e) = http_task.await {
                warn!("HTTP server task ended abnormally: {}", e);
            }
        }
        self.stop_background_tasks().await;

        let final_stats = self.lobby_stats().await?;
        info!("Final lobby statistics: {:?}", final_stats);
        info!("✅ Shutdown completed");

        Ok(())
    }

    pub fn context(&self) -> &ServiceContext {
        &self.context
    }

    pub fn config(&self) -> &AppConfig {
        &self.context.config
    }

    pub async fn is_running(&self) -> bool {
        self.context.is_running().await
    }

    pub fn lobby_manager(&self) -> Arc<LobbyManager> {
        self.context.lobby_manager.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.context.metrics.clone()
    }

    async fn lobby_stats(&self) -> Result<LobbyManagerStats, ServiceError> {
        self.context
            .lobby_manager
            .get_stats()
            .await
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get lobby stats: {}", e),
            })
    }

    async fn start_http_server(&mut self) -> Result<(), ServiceError> {
        let listener = self
            .http_server
            .bind()
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("Failed to bind HTTP server: {}", e),
            })?;

        let server = self.http_server.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!("HTTP server failed: {}", e);
            } else {
                info!("HTTP server task completed");
            }
        });
        self.http_task = Some(handle);

        Ok(())
    }

    fn start_background_tasks(&mut self) {
        info!("Starting background maintenance tasks...");

        // Lobby gauges
        let metrics_task = {
            let lobby_manager = self.context.lobby_manager.clone();
            let metrics = self.context.metrics.clone();
            let is_running = self.context.is_running.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(30));
                while *is_running.read().await {
                    interval.tick().await;
                    match lobby_manager.get_stats().await {
                        Ok(stats) => {
                            debug!(
                                "Updating metrics - lobbies: {}, players: {}",
                                stats.active_lobbies, stats.players_waiting
                            );
                            metrics.update_from_lobby_stats(&stats);
                        }
                        Err(e) => warn!("Failed to get lobby stats for metrics update: {}", e),
                    }
                }
            })
        };
        self.background_tasks.push(metrics_task);

        let cleanup_task = self.context.lobby_manager.clone().start_cleanup_task();
        self.background_tasks.push(cleanup_task);
    }

    async fn stop_background_tasks(&mut self) {
        info!("Stopping {} background tasks", self.background_tasks.len());
        for handle in self.background_tasks.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
    }
}
