//! Discord interactions
//!
//! This module covers the HTTP interactions surface: request verification,
//! the slash command catalogue, reply rendering, dispatch and the REST calls
//! that complete deferred replies.

pub mod api;
pub mod commands;
pub mod handler;
pub mod interaction;
pub mod render;
pub mod verify;

// Re-export commonly used types
pub use api::{DiscordApi, HttpDiscordClient};
pub use commands::{command_definitions, Command, CommandDefinition, LobbyAction};
pub use handler::{Dispatch, HandlerContext, InteractionHandler};
pub use interaction::{Interaction, InteractionResponse, InteractionType, MessagePayload};
pub use verify::SignatureVerifier;
