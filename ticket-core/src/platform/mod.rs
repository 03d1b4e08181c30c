//! Capability traits over the chat platform.
//!
//! The ticket flow only ever talks to Discord through these traits, so the
//! same code runs against the twilight HTTP client in production and against
//! [`memory::MemoryPlatform`] in tests.

use async_trait::async_trait;
use twilight_model::{
    guild::Permissions,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, UserMarker},
    },
};

use crate::model::{
    ChannelInfo, Handle, HistoryMessage, MemberInfo, NewChannel, OutgoingMessage, RoleInfo,
};

pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use http::HttpPlatform;

/// Classified platform failure.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The bot lacks permission, or the target refuses (e.g. closed DMs).
    #[error("missing permissions for platform action")]
    Forbidden,
    #[error("platform resource not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlatformError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

#[async_trait]
pub trait ChannelService: Send + Sync {
    async fn guild_name(&self, guild_id: Id<GuildMarker>) -> PlatformResult<String>;

    async fn guild_channels(&self, guild_id: Id<GuildMarker>) -> PlatformResult<Vec<ChannelInfo>>;

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<ChannelInfo>;

    async fn create_channel(&self, request: NewChannel) -> PlatformResult<ChannelInfo>;

    async fn delete_channel(
        &self,
        channel_id: Id<ChannelMarker>,
        reason: &str,
    ) -> PlatformResult<()>;
}

#[async_trait]
pub trait PermissionService: Send + Sync {
    /// User id of the bot itself.
    async fn bot_user_id(&self) -> PlatformResult<Id<UserMarker>>;

    async fn guild_roles(&self, guild_id: Id<GuildMarker>) -> PlatformResult<Vec<RoleInfo>>;

    async fn member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> PlatformResult<MemberInfo>;

    /// First guild member whose lowercased username and discriminator match.
    async fn find_member_by_handle(
        &self,
        guild_id: Id<GuildMarker>,
        handle: &Handle,
    ) -> PlatformResult<Option<MemberInfo>>;

    /// Effective permissions of the bot inside a channel.
    async fn bot_channel_permissions(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> PlatformResult<Permissions>;
}

#[async_trait]
pub trait MessageService: Send + Sync {
    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        message: OutgoingMessage,
    ) -> PlatformResult<()>;

    async fn send_direct(
        &self,
        user_id: Id<UserMarker>,
        message: OutgoingMessage,
    ) -> PlatformResult<()>;

    /// Full channel history, oldest message first.
    async fn history(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<Vec<HistoryMessage>>;
}

/// Everything the ticket flow needs from the platform.
pub trait Platform: ChannelService + PermissionService + MessageService {}

impl<T> Platform for T where T: ChannelService + PermissionService + MessageService {}
