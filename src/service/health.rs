//! Health checks
//!
//! Readiness and liveness probes plus the detailed report behind `/stats`.

use crate::service::app::ServiceContext;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub active_lobbies: usize,
    pub players_waiting: usize,
    pub lobbies_created: u64,
    pub teams_balanced: u64,
    pub linked_profiles: usize,
    pub uptime_info: String,
}

fn worst(current: HealthStatus, check: &HealthStatus) -> HealthStatus {
    match (&current, check) {
        (_, HealthStatus::Unhealthy) | (HealthStatus::Unhealthy, _) => HealthStatus::Unhealthy,
        (_, HealthStatus::Degraded) | (HealthStatus::Degraded, _) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    }
}

impl HealthCheck {
    /// Check every component and gather statistics
    pub async fn check(context: &ServiceContext) -> Result<Self> {
        let checks = vec![
            Self::check_service_running(context).await,
            Self::check_lobby_manager(context).await,
            Self::check_profile_storage(context),
        ];

        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |status, check| {
                worst(status, &check.status)
            });

        Ok(HealthCheck {
            status,
            service: context.config.service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats: Self::gather_service_stats(context).await,
        })
    }

    /// Liveness: the service has started and not begun shutting down
    pub async fn liveness_check(context: &ServiceContext) -> HealthStatus {
        if context.is_running().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Readiness: running, with lobby state and profile storage reachable
    pub async fn readiness_check(context: &ServiceContext) -> HealthStatus {
        if !context.is_running().await {
            return HealthStatus::Unhealthy;
        }

        let lobby = Self::check_lobby_manager(context).await;
        let profiles = Self::check_profile_storage(context);
        worst(lobby.status, &profiles.status)
    }

    async fn check_service_running(context: &ServiceContext) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if context.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn check_lobby_manager(context: &ServiceContext) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match context.lobby_manager.get_stats().await {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Lobby manager stats check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Stats check failed: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "lobby_manager".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_profile_storage(context: &ServiceContext) -> ComponentCheck {
        let start = std::time::Instant::now();

        // Commands keep working without profiles, lobbies do not
        let (status, message) = match context.profiles.list_profiles() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Profile storage check failed: {}", e);
                (
                    HealthStatus::Degraded,
                    Some(format!("Profile storage unavailable: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "profile_storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn gather_service_stats(context: &ServiceContext) -> ServiceStats {
        let uptime = chrono::Utc::now() - context.started_at;
        let mut stats = ServiceStats {
            linked_profiles: context
                .profiles
                .list_profiles()
                .map(|profiles| profiles.len())
                .unwrap_or(0),
            uptime_info: format!(
                "Up {}h {}m {}s",
                uptime.num_hours(),
                uptime.num_minutes() % 60,
                uptime.num_seconds() % 60
            ),
            ..ServiceStats::default()
        };

        match context.lobby_manager.get_stats().await {
            Ok(lobby_stats) => {
                stats.active_lobbies = lobby_stats.active_lobbies;
                stats.players_waiting = lobby_stats.players_waiting;
                stats.lobbies_created = lobby_stats.lobbies_created;
                stats.teams_balanced = lobby_stats.teams_balanced;
            }
            Err(e) => debug!("Failed to get lobby stats for health check: {}", e),
        }

        stats
    }
}
