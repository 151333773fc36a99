//! Discord interaction payloads and responses
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payload is ignored on deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message flag that makes a reply visible to the invoking user only
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// Embed colours used by the bot
pub const COLOR_BLUE: u32 = 0x0099ff;
pub const COLOR_YELLOW: u32 = 0xffff00;
pub const COLOR_GREEN: u32 = 0x00ff00;

/// Field values longer than this are rejected by Discord
pub const EMBED_FIELD_LIMIT: usize = 1024;

/// Kind of an incoming interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Autocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => InteractionType::Ping,
            2 => InteractionType::ApplicationCommand,
            3 => InteractionType::MessageComponent,
            4 => InteractionType::Autocomplete,
            5 => InteractionType::ModalSubmit,
            other => InteractionType::Unknown(other),
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionType::Ping => write!(f, "ping"),
            InteractionType::ApplicationCommand => write!(f, "command"),
            InteractionType::MessageComponent => write!(f, "component"),
            InteractionType::Autocomplete => write!(f, "autocomplete"),
            InteractionType::ModalSubmit => write!(f, "modal"),
            InteractionType::Unknown(_) => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Member {
    pub user: User,
}

/// The message a component was attached to
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// `data` of a command or component interaction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InteractionData {
    /// Slash command name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    /// Button id
    #[serde(default)]
    pub custom_id: Option<String>,
}

/// An interaction delivered to the HTTP endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
    /// Present in guilds
    #[serde(default)]
    pub member: Option<Member>,
    /// Present in DMs
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub message: Option<MessageRef>,
}

impl Interaction {
    /// The user who triggered the interaction
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .map(|member| &member.user)
            .or(self.user.as_ref())
    }

    pub fn invoker_id(&self) -> Option<&str> {
        self.invoker().map(|user| user.id.as_str())
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref()?.name.as_deref()
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref()?.custom_id.as_deref()
    }

    fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|option| option.name == name)?
            .value
            .as_ref()
    }

    /// A string option, trimmed; blank values count as absent
    pub fn string_option(&self, name: &str) -> Option<String> {
        self.option(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn integer_option(&self, name: &str) -> Option<i64> {
        self.option(name).and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// ISO-8601 timestamp shown under the embed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn timestamp(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

impl From<ButtonStyle> for u8 {
    fn from(style: ButtonStyle) -> Self {
        match style {
            ButtonStyle::Primary => 1,
            ButtonStyle::Secondary => 2,
            ButtonStyle::Success => 3,
            ButtonStyle::Danger => 4,
        }
    }
}

impl From<u8> for ButtonStyle {
    fn from(value: u8) -> Self {
        match value {
            1 => ButtonStyle::Primary,
            3 => ButtonStyle::Success,
            4 => ButtonStyle::Danger,
            _ => ButtonStyle::Secondary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    /// Always 2
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: ButtonStyle,
    pub label: String,
    pub custom_id: String,
}

impl Button {
    pub fn new(style: ButtonStyle, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: 2,
            style,
            label: label.into(),
            custom_id: custom_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRow {
    /// Always 1
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    pub fn new(components: Vec<Button>) -> Self {
        Self {
            kind: 1,
            components,
        }
    }
}

/// Message body shared by interaction responses, follow-ups and edits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: Some(vec![embed]),
            ..Self::default()
        }
    }

    pub fn with_components(mut self, components: Vec<ActionRow>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or(0) | EPHEMERAL_FLAG);
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags.unwrap_or(0) & EPHEMERAL_FLAG != 0
    }
}

/// Callback type of an interaction response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResponseType {
    Pong,
    ChannelMessage,
    DeferredChannelMessage,
    DeferredUpdateMessage,
    UpdateMessage,
}

impl From<ResponseType> for u8 {
    fn from(kind: ResponseType) -> Self {
        match kind {
            ResponseType::Pong => 1,
            ResponseType::ChannelMessage => 4,
            ResponseType::DeferredChannelMessage => 5,
            ResponseType::DeferredUpdateMessage => 6,
            ResponseType::UpdateMessage => 7,
        }
    }
}

impl TryFrom<u8> for ResponseType {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ResponseType::Pong),
            4 => Ok(ResponseType::ChannelMessage),
            5 => Ok(ResponseType::DeferredChannelMessage),
            6 => Ok(ResponseType::DeferredUpdateMessage),
            7 => Ok(ResponseType::UpdateMessage),
            other => Err(format!("unknown interaction response type {}", other)),
        }
    }
}

/// The synchronous answer to an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessagePayload>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: ResponseType::Pong,
            data: None,
        }
    }

    pub fn message(payload: MessagePayload) -> Self {
        Self {
            kind: ResponseType::ChannelMessage,
            data: Some(payload),
        }
    }

    /// Plain text reply
    pub fn reply(content: impl Into<String>) -> Self {
        Self::message(MessagePayload::text(content))
    }

    /// Text reply only the invoker can see
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::message(MessagePayload::text(content).ephemeral())
    }

    /// "Thinking..." placeholder, completed later through the webhook
    pub fn deferred(ephemeral: bool) -> Self {
        Self {
            kind: ResponseType::DeferredChannelMessage,
            data: ephemeral.then(|| MessagePayload::default().ephemeral()),
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.data.as_ref()?.content.as_deref()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.data
            .as_ref()
            .map(MessagePayload::is_ephemeral)
            .unwrap_or(false)
    }
}

/// Trim a field value to what Discord accepts
pub fn truncate_field(value: &str) -> String {
    if value.chars().count() <= EMBED_FIELD_LIMIT {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(EMBED_FIELD_LIMIT - 3).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_command_interaction() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "1",
            "application_id": "app",
            "type": 2,
            "token": "tok",
            "data": {
                "name": "rankedinfo",
                "options": [
                    {"name": "username", "type": 3, "value": "  Faker "},
                    {"name": "count", "type": 4, "value": 7},
                    {"name": "tagline", "type": 3, "value": ""}
                ]
            },
            "member": {"user": {"id": "42", "username": "someone"}, "roles": []},
            "channel_id": "c1",
            "guild_id": "g1",
            "locale": "en-US"
        }))
        .unwrap();

        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.command_name(), Some("rankedinfo"));
        assert_eq!(interaction.invoker_id(), Some("42"));
        assert_eq!(interaction.string_option("username").as_deref(), Some("Faker"));
        assert_eq!(interaction.string_option("tagline"), None);
        assert_eq!(interaction.integer_option("count"), Some(7));
        assert_eq!(interaction.integer_option("missing"), None);
    }

    #[test]
    fn test_dm_invoker_and_unknown_type() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "1",
            "application_id": "app",
            "type": 9,
            "token": "tok",
            "user": {"id": "7"}
        }))
        .unwrap();

        assert_eq!(interaction.kind, InteractionType::Unknown(9));
        assert_eq!(interaction.invoker_id(), Some("7"));
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            serde_json::to_value(InteractionResponse::pong()).unwrap(),
            json!({"type": 1})
        );

        assert_eq!(
            serde_json::to_value(InteractionResponse::ephemeral("hi")).unwrap(),
            json!({"type": 4, "data": {"content": "hi", "flags": 64}})
        );

        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred(false)).unwrap(),
            json!({"type": 5})
        );
    }

    #[test]
    fn test_embed_and_buttons_serialization() {
        let payload = MessagePayload::embed(
            Embed::new("Title")
                .color(COLOR_GREEN)
                .field("Team 1", "<@1>", true),
        )
        .with_components(vec![ActionRow::new(vec![Button::new(
            ButtonStyle::Danger,
            "Leave Lobby",
            "leave:abc",
        )])]);

        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "embeds": [{
                    "title": "Title",
                    "color": 65280,
                    "fields": [{"name": "Team 1", "value": "<@1>", "inline": true}]
                }],
                "components": [{
                    "type": 1,
                    "components": [{"type": 2, "style": 4, "label": "Leave Lobby", "custom_id": "leave:abc"}]
                }]
            })
        );
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("short"), "short");
        let long = "x".repeat(2000);
        let truncated = truncate_field(&long);
        assert_eq!(truncated.chars().count(), EMBED_FIELD_LIMIT);
        assert!(truncated.ends_with("..."));
    }
}
