//! Metrics and monitoring for the bot
//!
//! This module provides Prometheus metrics collection for interaction handling,
//! Riot API traffic, lobbies and team balancing.

pub mod collector;

pub use collector::{
    BalanceMetrics, CommandMetrics, LobbyMetrics, MetricsCollector, MetricsTimer, RiotMetrics,
    ServiceMetrics,
};
