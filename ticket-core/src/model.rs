//! Platform-neutral views of the Discord objects the ticket flow touches.

use std::fmt;

use chrono::{DateTime, Utc};
use twilight_model::{
    channel::{
        ChannelType,
        message::{component::Component, embed::Embed},
        permission_overwrite::PermissionOverwrite,
    },
    guild::Permissions,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, MessageMarker, RoleMarker, UserMarker},
    },
    user::User,
    util::ImageHash,
};

/// A user's `username#discriminator` pair.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Handle {
    pub name: String,
    pub discriminator: u16,
}

impl Handle {
    pub fn new(name: impl Into<String>, discriminator: u16) -> Self {
        Self {
            name: name.into(),
            discriminator,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.name.clone(), user.discriminator)
    }

    /// Discriminator as Discord renders it: `0` for migrated accounts,
    /// otherwise zero-padded to four digits.
    pub fn discriminator_label(&self) -> String {
        if self.discriminator == 0 {
            "0".to_owned()
        } else {
            format!("{:04}", self.discriminator)
        }
    }

    /// Username reduced to the characters a text channel name keeps.
    pub fn channel_slug(&self) -> String {
        self.name
            .trim()
            .chars()
            .filter_map(|ch| match ch {
                ch if ch.is_whitespace() => Some('-'),
                ch if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') => Some(ch),
                _ => None,
            })
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.discriminator_label())
    }
}

/// Guild member as seen by the ticket flow.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberInfo {
    pub user_id: Id<UserMarker>,
    pub handle: Handle,
    pub display_name: String,
    pub avatar_url: String,
    pub roles: Vec<Id<RoleMarker>>,
}

impl MemberInfo {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

/// The member behind an interaction, with their channel-level permissions.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub member: MemberInfo,
    pub permissions: Permissions,
}

impl Actor {
    pub fn user_id(&self) -> Id<UserMarker> {
        self.member.user_id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoleInfo {
    pub id: Id<RoleMarker>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChannelInfo {
    pub id: Id<ChannelMarker>,
    pub guild_id: Option<Id<GuildMarker>>,
    pub name: String,
    pub kind: ChannelType,
    pub parent_id: Option<Id<ChannelMarker>>,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChannelInfo {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }

    pub fn is_category(&self) -> bool {
        self.kind == ChannelType::GuildCategory
    }
}

/// Request to provision a new ticket channel.
#[derive(Clone, Debug, PartialEq)]
pub struct NewChannel {
    pub guild_id: Id<GuildMarker>,
    pub name: String,
    pub parent_id: Option<Id<ChannelMarker>>,
    pub topic: String,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Author of a message in a channel history.
#[derive(Clone, Debug, PartialEq)]
pub struct Author {
    pub display_name: String,
    pub handle: Handle,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbedSummary {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// One message of a channel history, reduced to what transcripts render.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryMessage {
    pub id: Id<MessageMarker>,
    pub timestamp: DateTime<Utc>,
    pub author: Author,
    pub content: String,
    pub embeds: Vec<EmbedSummary>,
    pub attachments: Vec<String>,
}

/// In-memory file uploaded alongside a message.
#[derive(Clone, Debug, PartialEq)]
pub struct FileAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Message to post to a channel or direct-message a user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<Component>,
    pub attachment: Option<FileAttachment>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }

    pub fn with_attachment(mut self, filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachment = Some(FileAttachment {
            filename: filename.into(),
            bytes,
        });
        self
    }
}

/// CDN URL of a user's avatar, falling back to the default avatar set.
pub fn avatar_url(user_id: Id<UserMarker>, avatar: Option<ImageHash>) -> String {
    match avatar {
        Some(avatar) => format!(
            "https://cdn.discordapp.com/avatars/{}/{}.png?size=128",
            user_id.get(),
            avatar
        ),
        None => {
            let default_avatar_index = (user_id.get() >> 22) % 6;
            format!(
                "https://cdn.discordapp.com/embed/avatars/{}.png",
                default_avatar_index
            )
        }
    }
}

/// Name shown for a member: nickname, then global name, then username.
pub fn display_name(user: &User, nick: Option<&str>) -> String {
    nick.map(ToOwned::to_owned)
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_formats_legacy_and_migrated_discriminators() {
        assert_eq!(Handle::new("alice", 42).to_string(), "alice#0042");
        assert_eq!(Handle::new("bob", 0).to_string(), "bob#0");
        assert_eq!(Handle::new("carol", 1234).to_string(), "carol#1234");
    }

    #[test]
    fn channel_slug_lowercases_and_drops_unsafe_characters() {
        assert_eq!(Handle::new("Alice Smith", 1).channel_slug(), "alice-smith");
        assert_eq!(Handle::new("bob.the_builder", 0).channel_slug(), "bob.the_builder");
        assert_eq!(Handle::new("e!v@e", 0).channel_slug(), "eve");
    }

    #[test]
    fn default_avatar_is_derived_from_user_id() {
        let url = avatar_url(Id::new(1 << 22), None);
        assert_eq!(url, "https://cdn.discordapp.com/embed/avatars/1.png");
    }
}
