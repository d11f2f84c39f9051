//! REST client for the chat platform.

use crate::config::BotConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::platform::{AuthorityLookup, ChannelDirectory};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use ticketd_proto::{
    ActionRow, ApplicationId, ChannelId, ChannelInfo, ChannelKind, CreateChannel, GuildId,
    InteractionId, InteractionResponse, MessageId, OutgoingMessage, OverwriteTarget,
    PermissionEdit, Permissions, RoleId, UserId,
};
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct Created {
    id: MessageId,
}

#[derive(Deserialize)]
struct Member {
    #[serde(default)]
    roles: Vec<RoleId>,
}

#[derive(Deserialize)]
struct Role {
    id: RoleId,
    permissions: Permissions,
}

#[derive(Deserialize)]
struct PartialGuild {
    id: GuildId,
}

/// Bot-token authenticated REST client.
pub struct DiscordRest {
    http: reqwest::Client,
    base: String,
    token: String,
    application: ApplicationId,
    admin_role: Option<RoleId>,
}

impl DiscordRest {
    pub fn new(config: &BotConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ticketd/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            application: config.application_id,
            admin_role: config.admin_role_id,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .header("Authorization", format!("Bot {}", self.token))
    }

    async fn checked(response: Response) -> PlatformResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            Err(PlatformError::NotFound(body))
        } else {
            Err(PlatformError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> PlatformResult<T> {
        let response = Self::checked(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn call_empty(&self, request: RequestBuilder) -> PlatformResult<()> {
        Self::checked(request.send().await?).await?;
        Ok(())
    }

    /// Replace the guild commands of every guild the bot is in. Returns the
    /// number of guilds updated.
    pub async fn register_commands(&self, commands: &Value) -> PlatformResult<usize> {
        let guilds: Vec<PartialGuild> = self
            .call(self.request(Method::GET, "/users/@me/guilds"))
            .await?;
        for guild in &guilds {
            let path = format!("/applications/{}/guilds/{}/commands", self.application, guild.id);
            self.call_empty(self.request(Method::PUT, &path).json(commands))
                .await?;
            debug!(guild = %guild.id, "Registered commands");
        }
        info!(guilds = guilds.len(), "Slash commands registered");
        Ok(guilds.len())
    }

    /// Send an initial response after the HTTP reply window has passed.
    pub async fn create_response(
        &self,
        interaction: InteractionId,
        token: &str,
        response: &InteractionResponse,
    ) -> PlatformResult<()> {
        let path = format!("/interactions/{interaction}/{token}/callback");
        self.call_empty(self.request(Method::POST, &path).json(response))
            .await
    }

    /// Edit the message an interaction was acknowledged with. Used once a
    /// deferred acknowledgement has already been sent.
    pub async fn edit_original(&self, token: &str, body: &Value) -> PlatformResult<()> {
        let path = format!("/webhooks/{}/{token}/messages/@original", self.application);
        self.call_empty(self.request(Method::PATCH, &path).json(body))
            .await
    }

    /// Post a follow-up message through the interaction webhook.
    pub async fn create_followup(&self, token: &str, message: &OutgoingMessage) -> PlatformResult<()> {
        let path = format!("/webhooks/{}/{token}", self.application);
        self.call_empty(self.request(Method::POST, &path).json(message))
            .await
    }
}

#[async_trait]
impl ChannelDirectory for DiscordRest {
    async fn fetch(&self, channel: ChannelId) -> PlatformResult<ChannelInfo> {
        self.call(self.request(Method::GET, &format!("/channels/{channel}")))
            .await
    }

    async fn find_by_topic(
        &self,
        guild: GuildId,
        topic: &str,
    ) -> PlatformResult<Option<ChannelInfo>> {
        let channels: Vec<ChannelInfo> = self
            .call(self.request(Method::GET, &format!("/guilds/{guild}/channels")))
            .await?;
        Ok(channels
            .into_iter()
            .find(|c| c.kind == ChannelKind::Text && c.topic.as_deref() == Some(topic)))
    }

    async fn create(&self, guild: GuildId, request: CreateChannel) -> PlatformResult<ChannelInfo> {
        self.call(
            self.request(Method::POST, &format!("/guilds/{guild}/channels"))
                .json(&request),
        )
        .await
    }

    async fn rename(&self, channel: ChannelId, name: &str) -> PlatformResult<()> {
        self.call_empty(
            self.request(Method::PATCH, &format!("/channels/{channel}"))
                .json(&json!({ "name": name })),
        )
        .await
    }

    async fn delete(&self, channel: ChannelId) -> PlatformResult<()> {
        self.call_empty(self.request(Method::DELETE, &format!("/channels/{channel}")))
            .await
    }

    async fn edit_member_overwrite(
        &self,
        channel: ChannelId,
        member: UserId,
        edit: PermissionEdit,
    ) -> PlatformResult<()> {
        // The endpoint replaces the overwrite, so merge into the current one.
        let info = self.fetch(channel).await?;
        let (mut allow, mut deny) = info
            .member_overwrite(member)
            .map(|ow| (ow.allow, ow.deny))
            .unwrap_or_default();
        edit.apply(&mut allow, &mut deny);
        let target = OverwriteTarget::Member(member);
        self.call_empty(
            self.request(Method::PUT, &format!("/channels/{channel}/permissions/{member}"))
                .json(&json!({ "type": target.wire_type(), "allow": allow, "deny": deny })),
        )
        .await
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId> {
        let created: Created = self
            .call(
                self.request(Method::POST, &format!("/channels/{channel}/messages"))
                    .json(&message),
            )
            .await?;
        Ok(created.id)
    }

    async fn edit_components(
        &self,
        channel: ChannelId,
        message: MessageId,
        rows: Vec<ActionRow>,
    ) -> PlatformResult<()> {
        self.call_empty(
            self.request(Method::PATCH, &format!("/channels/{channel}/messages/{message}"))
                .json(&json!({ "components": rows })),
        )
        .await
    }
}

#[async_trait]
impl AuthorityLookup for DiscordRest {
    async fn is_admin(&self, guild: GuildId, user: UserId) -> PlatformResult<bool> {
        let member: Member = self
            .call(self.request(Method::GET, &format!("/guilds/{guild}/members/{user}")))
            .await?;
        if self
            .admin_role
            .is_some_and(|role| member.roles.contains(&role))
        {
            return Ok(true);
        }
        let roles: Vec<Role> = self
            .call(self.request(Method::GET, &format!("/guilds/{guild}/roles")))
            .await?;
        let everyone = guild.everyone_role();
        Ok(roles.iter().any(|role| {
            (role.id == everyone || member.roles.contains(&role.id))
                && role.permissions.contains(Permissions::ADMINISTRATOR)
        }))
    }
}
