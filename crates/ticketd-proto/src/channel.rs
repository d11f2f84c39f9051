//! Channel objects and permission overwrites.

use crate::id::{ChannelId, GuildId, RoleId, UserId};
use crate::permissions::Permissions;
use serde::{Deserialize, Serialize};

/// Channel type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    /// A guild text channel (type 0).
    Text,
    /// A category grouping other channels (type 4).
    Category,
    /// Anything else, kept by raw discriminator.
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Text,
            4 => Self::Category,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> u8 {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Category => 4,
            ChannelKind::Other(raw) => raw,
        }
    }
}

/// Who a permission overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteTarget {
    /// A role (overwrite type 0).
    Role(RoleId),
    /// A single member (overwrite type 1).
    Member(UserId),
}

impl OverwriteTarget {
    /// Raw snowflake of the target.
    pub fn raw_id(self) -> u64 {
        match self {
            Self::Role(id) => id.get(),
            Self::Member(id) => id.get(),
        }
    }

    /// Wire discriminator of the target.
    pub fn wire_type(self) -> u8 {
        match self {
            Self::Role(_) => 0,
            Self::Member(_) => 1,
        }
    }
}

/// A per-role or per-member allow/deny pair on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOverwrite", into = "RawOverwrite")]
pub struct PermissionOverwrite {
    /// Role or member the overwrite applies to.
    pub target: OverwriteTarget,
    /// Explicitly granted bits.
    pub allow: Permissions,
    /// Explicitly revoked bits.
    pub deny: Permissions,
}

impl PermissionOverwrite {
    /// Grant `allow` to a role.
    pub fn role(role: RoleId, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target: OverwriteTarget::Role(role),
            allow,
            deny,
        }
    }

    /// Grant `allow` to a member.
    pub fn member(user: UserId, allow: Permissions, deny: Permissions) -> Self {
        Self {
            target: OverwriteTarget::Member(user),
            allow,
            deny,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawOverwrite {
    id: UserId,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    allow: Permissions,
    #[serde(default)]
    deny: Permissions,
}

impl TryFrom<RawOverwrite> for PermissionOverwrite {
    type Error = String;

    fn try_from(raw: RawOverwrite) -> Result<Self, Self::Error> {
        let target = match raw.kind {
            0 => OverwriteTarget::Role(RoleId(raw.id.get())),
            1 => OverwriteTarget::Member(raw.id),
            other => return Err(format!("unknown overwrite type {other}")),
        };
        Ok(Self {
            target,
            allow: raw.allow,
            deny: raw.deny,
        })
    }
}

impl From<PermissionOverwrite> for RawOverwrite {
    fn from(ow: PermissionOverwrite) -> Self {
        Self {
            id: UserId(ow.target.raw_id()),
            kind: ow.target.wire_type(),
            allow: ow.allow,
            deny: ow.deny,
        }
    }
}

/// A partial edit of a member's overwrite.
///
/// `Some(true)` grants, `Some(false)` revokes, `None` leaves the bit as it
/// is. Applying an edit merges into the existing overwrite instead of
/// replacing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionEdit {
    /// View the channel.
    pub view_channel: Option<bool>,
    /// Post messages.
    pub send_messages: Option<bool>,
    /// Read history.
    pub read_message_history: Option<bool>,
}

impl PermissionEdit {
    /// Merge this edit into an allow/deny pair.
    pub fn apply(&self, allow: &mut Permissions, deny: &mut Permissions) {
        let bits = [
            (self.view_channel, Permissions::VIEW_CHANNEL),
            (self.send_messages, Permissions::SEND_MESSAGES),
            (self.read_message_history, Permissions::READ_MESSAGE_HISTORY),
        ];
        for (setting, bit) in bits {
            match setting {
                Some(true) => {
                    allow.insert(bit);
                    deny.remove(bit);
                }
                Some(false) => {
                    deny.insert(bit);
                    allow.remove(bit);
                }
                None => {}
            }
        }
    }
}

/// A channel as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel id.
    pub id: ChannelId,
    /// Owning guild, absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// Channel type.
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form topic. Ticket channels keep the owner's user id here.
    #[serde(default)]
    pub topic: Option<String>,
    /// Parent category.
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
    /// Permission overwrites.
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

impl ChannelInfo {
    /// The ticket owner encoded in the topic, if the topic holds a user id.
    pub fn owner(&self) -> Option<UserId> {
        self.topic.as_deref().and_then(|t| t.parse().ok())
    }

    /// The overwrite for a single member, if any.
    pub fn member_overwrite(&self, user: UserId) -> Option<&PermissionOverwrite> {
        self.permission_overwrites
            .iter()
            .find(|ow| ow.target == OverwriteTarget::Member(user))
    }

    /// Whether the member's overwrite explicitly allows or denies sending.
    /// `None` when the overwrite is absent or silent on that bit.
    pub fn member_can_send(&self, user: UserId) -> Option<bool> {
        let ow = self.member_overwrite(user)?;
        if ow.deny.contains(Permissions::SEND_MESSAGES) {
            Some(false)
        } else if ow.allow.contains(Permissions::SEND_MESSAGES) {
            Some(true)
        } else {
            None
        }
    }
}

/// Request body for creating a guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateChannel {
    /// Channel name.
    pub name: String,
    /// Channel type.
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Parent category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,
    /// Initial overwrites.
    pub permission_overwrites: Vec<PermissionOverwrite>,
}
