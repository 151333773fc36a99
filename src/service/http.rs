//! HTTP server for the interactions endpoint, health probes and metrics

use crate::discord::interaction::Interaction;
use crate::discord::verify::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::service::app::ServiceContext;
use crate::service::health::{HealthCheck, HealthStatus};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tracing::{debug, error, info, warn};

/// Serves `/interactions` next to the monitoring endpoints
pub struct HttpServer {
    context: ServiceContext,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    pub fn new(context: ServiceContext) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            context,
            shutdown_tx,
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = self
            .context
            .config
            .bind_address()
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("HTTP server listening on http://{}", addr);
        Ok(listener)
    }

    /// Serve until `stop` is called
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        create_router(self.context.clone())
    }

    pub fn stop(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}

/// All routes, limited to `max_concurrent_requests` in flight
pub fn create_router(context: ServiceContext) -> Router {
    let limit = context.config.service.max_concurrent_requests;

    Router::new()
        .route("/", get(root_handler))
        .route("/interactions", post(interactions_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/alive", get(alive_handler))
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        .layer(ConcurrencyLimitLayer::new(limit))
        .with_state(context)
}

async fn root_handler(State(context): State<ServiceContext>) -> impl IntoResponse {
    Json(json!({
        "service": context.config.service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/interactions",
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats"
        ]
    }))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Discord interactions webhook
async fn interactions_handler(
    State(context): State<ServiceContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(verifier) = &context.verifier {
        let verified = match (
            header(&headers, SIGNATURE_HEADER),
            header(&headers, TIMESTAMP_HEADER),
        ) {
            (Some(signature), Some(timestamp)) => verifier.verify(signature, timestamp, &body),
            _ => Err(anyhow::anyhow!("missing signature headers")),
        };

        if let Err(e) = verified {
            debug!("Rejected interaction: {}", e);
            context.metrics.record_signature_failure();
            return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
        }
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!("Malformed interaction body: {}", e);
            return (StatusCode::BAD_REQUEST, "malformed interaction").into_response();
        }
    };

    // Background work keeps running after the response is sent
    let dispatch = context.handler.handle(interaction).await;
    Json(dispatch.response).into_response()
}

async fn health_handler(State(context): State<ServiceContext>) -> impl IntoResponse {
    debug!("Health check requested");

    let (code, status) = match HealthCheck::liveness_check(&context).await {
        HealthStatus::Healthy => (StatusCode::OK, "healthy"),
        HealthStatus::Degraded => (StatusCode::OK, "degraded"),
        HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": context.config.service.name,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

async fn ready_handler(State(context): State<ServiceContext>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(&context).await {
        HealthStatus::Healthy => (StatusCode::OK, "Ready"),
        HealthStatus::Degraded => (StatusCode::OK, "Degraded but ready"),
        HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
    }
}

async fn alive_handler(State(context): State<ServiceContext>) -> impl IntoResponse {
    match HealthCheck::liveness_check(&context).await {
        HealthStatus::Healthy => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus text exposition
async fn metrics_handler(State(context): State<ServiceContext>) -> Response {
    let metric_families = context.metrics.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [(axum::http::header::CONTENT_TYPE, encoder.format_type().to_string())],
                output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

async fn stats_handler(State(context): State<ServiceContext>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    match HealthCheck::check(&context).await {
        Ok(health) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": health.service,
                    "version": health.version,
                    "status": health.status,
                    "uptime": health.stats.uptime_info
                },
                "lobbies": {
                    "active": health.stats.active_lobbies,
                    "created": health.stats.lobbies_created,
                    "teams_balanced": health.stats.teams_balanced
                },
                "players": {
                    "waiting": health.stats.players_waiting,
                    "linked_profiles": health.stats.linked_profiles
                },
                "components": health.checks,
                "timestamp": chrono::Utc::now()
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}
