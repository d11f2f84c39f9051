//! Snowflake identifiers.
//!
//! The platform encodes 64-bit ids as decimal strings on the wire. Each id
//! kind gets its own newtype so a channel id can never be passed where a user
//! id is expected. Deserialization accepts both the string form and a bare
//! integer (as written in TOML configuration files).

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake as a decimal string or integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom("snowflake must not be negative"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        v.trim().parse().map_err(E::custom)
    }
}

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw snowflake.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(SnowflakeVisitor).map(Self)
            }
        }
    };
}

snowflake!(
    /// A guild (community) id.
    GuildId
);
snowflake!(
    /// A channel id. Categories are channels too.
    ChannelId
);
snowflake!(
    /// A user id.
    UserId
);
snowflake!(
    /// A role id. The `@everyone` role shares its id with the guild.
    RoleId
);
snowflake!(
    /// A message id.
    MessageId
);
snowflake!(
    /// An interaction id.
    InteractionId
);
snowflake!(
    /// An application id. For bot applications this is also the bot's user id.
    ApplicationId
);

impl ChannelId {
    /// Render as a clickable channel mention.
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl UserId {
    /// Render as a user mention.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl RoleId {
    /// Render as a role mention.
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl GuildId {
    /// The guild's implicit `@everyone` role.
    pub fn everyone_role(self) -> RoleId {
        RoleId(self.0)
    }
}

impl ApplicationId {
    /// The bot user backing this application.
    pub fn bot_user(self) -> UserId {
        UserId(self.0)
    }
}
