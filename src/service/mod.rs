//! Service layer for the bot
//!
//! This module contains the application state, the HTTP server that receives
//! interactions and serves health and metrics, and background task management.

pub mod app;
pub mod health;
pub mod http;

pub use app::{AppState, ServiceContext, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use http::{create_router, HttpServer};
