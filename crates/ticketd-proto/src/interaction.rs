//! Incoming interaction payloads.
//!
//! The raw payload is decoded into private `Raw*` structs that mirror the
//! wire shape, then normalised into [`Interaction`] so consumers never deal
//! with the member-vs-user split or the inline channel object.

use crate::error::{ProtoError, Result};
use crate::id::{ApplicationId, ChannelId, GuildId, InteractionId, MessageId, UserId};
use serde::Deserialize;

const TYPE_PING: u8 = 1;
const TYPE_COMMAND: u8 = 2;
const TYPE_COMPONENT: u8 = 3;

const COMPONENT_BUTTON: u8 = 2;
const COMPONENT_STRING_SELECT: u8 = 3;

/// The user who triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// User id.
    pub id: UserId,
    /// Account name (not the server nickname).
    pub username: String,
}

/// A named slash-command option, stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    /// Option name.
    pub name: String,
    /// Option value rendered as a string.
    pub value: String,
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    /// A slash command.
    Command {
        /// Command name.
        name: String,
        /// Top-level options.
        options: Vec<CommandOption>,
    },
    /// A button click.
    Button {
        /// The clicked button's routing id.
        custom_id: String,
    },
    /// A select-menu choice.
    Select {
        /// The menu's routing id.
        custom_id: String,
        /// Chosen values.
        values: Vec<String>,
    },
}

impl InteractionKind {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Button { .. } => "button",
            Self::Select { .. } => "select",
        }
    }
}

/// A normalised interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Interaction id.
    pub id: InteractionId,
    /// Receiving application.
    pub application_id: ApplicationId,
    /// Continuation token for callbacks and follow-ups.
    pub token: String,
    /// Payload.
    pub kind: InteractionKind,
    /// Invoking user.
    pub user: UserRef,
    /// Guild the interaction happened in.
    pub guild_id: Option<GuildId>,
    /// Channel the interaction happened in.
    pub channel_id: Option<ChannelId>,
    /// Message carrying the clicked component, for component interactions.
    pub message_id: Option<MessageId>,
}

impl Interaction {
    /// Decode a non-PING interaction from its JSON body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let raw: RawInteraction = serde_json::from_slice(body)?;
        Self::from_raw(raw)
    }

    /// Value of a named command option.
    pub fn option(&self, name: &str) -> Option<&str> {
        match &self.kind {
            InteractionKind::Command { options, .. } => options
                .iter()
                .find(|o| o.name == name)
                .map(|o| o.value.as_str()),
            _ => None,
        }
    }

    fn from_raw(raw: RawInteraction) -> Result<Self> {
        let user = raw
            .member
            .map(|m| m.user)
            .or(raw.user)
            .ok_or(ProtoError::MissingField("member.user"))?;
        let data = raw.data.ok_or(ProtoError::MissingField("data"))?;

        let kind = match raw.kind {
            TYPE_COMMAND => InteractionKind::Command {
                name: data.name.ok_or(ProtoError::MissingField("data.name"))?,
                options: data
                    .options
                    .into_iter()
                    .map(|o| CommandOption {
                        name: o.name,
                        value: match o.value {
                            Some(serde_json::Value::String(s)) => s,
                            Some(other) => other.to_string(),
                            None => String::new(),
                        },
                    })
                    .collect(),
            },
            TYPE_COMPONENT => {
                let custom_id = data
                    .custom_id
                    .ok_or(ProtoError::MissingField("data.custom_id"))?;
                match data.component_type {
                    Some(COMPONENT_BUTTON) => InteractionKind::Button { custom_id },
                    Some(COMPONENT_STRING_SELECT) => InteractionKind::Select {
                        custom_id,
                        values: data.values,
                    },
                    Some(other) => {
                        return Err(ProtoError::Unsupported {
                            what: "component",
                            value: other,
                        });
                    }
                    None => return Err(ProtoError::MissingField("data.component_type")),
                }
            }
            other => {
                return Err(ProtoError::Unsupported {
                    what: "interaction",
                    value: other,
                });
            }
        };

        Ok(Self {
            id: raw.id,
            application_id: raw.application_id,
            token: raw.token,
            kind,
            user: UserRef {
                id: user.id,
                username: user.username,
            },
            guild_id: raw.guild_id,
            channel_id: raw.channel_id.or(raw.channel.map(|c| c.id)),
            message_id: raw.message.map(|m| m.id),
        })
    }
}

/// Anything that can arrive at the interactions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Endpoint liveness check; must be answered with a PONG.
    Ping,
    /// A user interaction.
    Interaction(Interaction),
}

impl Inbound {
    /// Decode a request body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let raw: RawInteraction = serde_json::from_slice(body)?;
        if raw.kind == TYPE_PING {
            return Ok(Self::Ping);
        }
        Interaction::from_raw(raw).map(Self::Interaction)
    }
}

#[derive(Deserialize)]
struct RawInteraction {
    id: InteractionId,
    application_id: ApplicationId,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    token: String,
    #[serde(default)]
    guild_id: Option<GuildId>,
    #[serde(default)]
    channel_id: Option<ChannelId>,
    #[serde(default)]
    channel: Option<RawIdRef<ChannelId>>,
    #[serde(default)]
    member: Option<RawMember>,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default)]
    message: Option<RawIdRef<MessageId>>,
}

#[derive(Deserialize)]
struct RawIdRef<T> {
    id: T,
}

#[derive(Deserialize)]
struct RawMember {
    user: RawUser,
}

#[derive(Deserialize)]
struct RawUser {
    id: UserId,
    #[serde(default)]
    username: String,
}

#[derive(Deserialize)]
struct RawData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    component_type: Option<u8>,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    options: Vec<RawOption>,
}

#[derive(Deserialize)]
struct RawOption {
    name: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_button_click() {
        let raw = br#"{
            "id": "1", "application_id": "2", "type": 3, "token": "tok",
            "guild_id": "3", "channel": { "id": "4" },
            "member": { "user": { "id": "5", "username": "ana" } },
            "message": { "id": "6" },
            "data": { "custom_id": "ticket_reopen", "component_type": 2 }
        }"#;
        let i = Interaction::decode(raw).unwrap();
        assert_eq!(i.channel_id, Some(ChannelId(4)));
        assert_eq!(i.message_id, Some(MessageId(6)));
        assert_eq!(i.user.username, "ana");
        assert_eq!(
            i.kind,
            InteractionKind::Button {
                custom_id: "ticket_reopen".into()
            }
        );
    }

    #[test]
    fn decodes_command_options() {
        let raw = br##"{
            "id": "1", "application_id": "2", "type": 2, "token": "tok",
            "guild_id": "3", "channel_id": "4",
            "member": { "user": { "id": "5", "username": "ana" } },
            "data": { "name": "panelset", "options": [
                { "name": "field", "type": 3, "value": "color" },
                { "name": "value", "type": 3, "value": "#ff0000" }
            ] }
        }"##;
        let i = Interaction::decode(raw).unwrap();
        assert_eq!(i.option("field"), Some("color"));
        assert_eq!(i.option("value"), Some("#ff0000"));
        assert_eq!(i.option("missing"), None);
    }

    #[test]
    fn ping_is_recognised_without_user() {
        let raw = br#"{ "id": "1", "application_id": "2", "type": 1, "token": "t" }"#;
        assert_eq!(Inbound::decode(raw).unwrap(), Inbound::Ping);
        assert!(Interaction::decode(raw).is_err());
    }

    #[test]
    fn unknown_component_type_is_rejected() {
        let raw = br#"{
            "id": "1", "application_id": "2", "type": 3, "token": "tok",
            "user": { "id": "5" },
            "data": { "custom_id": "x", "component_type": 8 }
        }"#;
        assert!(matches!(
            Interaction::decode(raw),
            Err(ProtoError::Unsupported { what: "component", value: 8 })
        ));
    }
}
