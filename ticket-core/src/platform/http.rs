//! twilight HTTP implementation of the platform traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;
use twilight_http::{
    Client, error::ErrorType, request::AuditLogReason as _, response::DeserializeBodyError,
};
use twilight_model::{
    channel::{Channel, ChannelType, Message},
    guild::{Member, Permissions},
    http::attachment::Attachment,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker},
    },
};
use twilight_util::{permission_calculator::PermissionCalculator, snowflake::Snowflake};

use super::{
    ChannelService, MessageService, PermissionService, PlatformError, PlatformResult,
};
use crate::model::{
    Author, ChannelInfo, EmbedSummary, Handle, HistoryMessage, MemberInfo, NewChannel,
    OutgoingMessage, RoleInfo, avatar_url, display_name,
};

const HISTORY_PAGE_SIZE: u16 = 100;
const MEMBER_PAGE_SIZE: u16 = 1000;

impl From<twilight_http::Error> for PlatformError {
    fn from(source: twilight_http::Error) -> Self {
        match source.kind() {
            ErrorType::Response { status, .. } if status.get() == 403 => Self::Forbidden,
            ErrorType::Response { status, .. } if status.get() == 404 => Self::NotFound,
            _ => Self::Other(source.into()),
        }
    }
}

impl From<DeserializeBodyError> for PlatformError {
    fn from(source: DeserializeBodyError) -> Self {
        Self::Other(source.into())
    }
}

/// Platform backed by a shared twilight HTTP client.
pub struct HttpPlatform {
    http: Arc<Client>,
    bot_user_id: OnceCell<Id<UserMarker>>,
}

impl HttpPlatform {
    pub fn new(http: Arc<Client>) -> Self {
        Self {
            http,
            bot_user_id: OnceCell::new(),
        }
    }
}

#[async_trait]
impl ChannelService for HttpPlatform {
    async fn guild_name(&self, guild_id: Id<GuildMarker>) -> PlatformResult<String> {
        let guild = self.http.guild(guild_id).await?.model().await?;
        Ok(guild.name)
    }

    async fn guild_channels(&self, guild_id: Id<GuildMarker>) -> PlatformResult<Vec<ChannelInfo>> {
        let channels = self.http.guild_channels(guild_id).await?.model().await?;
        Ok(channels.into_iter().map(channel_info).collect())
    }

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<ChannelInfo> {
        let channel = self.http.channel(channel_id).await?.model().await?;
        Ok(channel_info(channel))
    }

    async fn create_channel(&self, new_channel: NewChannel) -> PlatformResult<ChannelInfo> {
        let mut request = self
            .http
            .create_guild_channel(new_channel.guild_id, &new_channel.name)
            .kind(ChannelType::GuildText)
            .permission_overwrites(&new_channel.overwrites)
            .topic(&new_channel.topic);

        if let Some(parent_id) = new_channel.parent_id {
            request = request.parent_id(parent_id);
        }

        let channel = request.await?.model().await?;
        Ok(channel_info(channel))
    }

    async fn delete_channel(
        &self,
        channel_id: Id<ChannelMarker>,
        reason: &str,
    ) -> PlatformResult<()> {
        self.http.delete_channel(channel_id).reason(reason).await?;
        Ok(())
    }
}

#[async_trait]
impl PermissionService for HttpPlatform {
    async fn bot_user_id(&self) -> PlatformResult<Id<UserMarker>> {
        let id = self
            .bot_user_id
            .get_or_try_init(|| async {
                let user = self.http.current_user().await?.model().await?;
                Ok::<_, PlatformError>(user.id)
            })
            .await?;

        Ok(*id)
    }

    async fn guild_roles(&self, guild_id: Id<GuildMarker>) -> PlatformResult<Vec<RoleInfo>> {
        let roles = self.http.roles(guild_id).await?.model().await?;
        Ok(roles
            .into_iter()
            .map(|role| RoleInfo {
                id: role.id,
                name: role.name,
            })
            .collect())
    }

    async fn member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> PlatformResult<MemberInfo> {
        let member = self
            .http
            .guild_member(guild_id, user_id)
            .await?
            .model()
            .await?;
        Ok(member_info(member))
    }

    async fn find_member_by_handle(
        &self,
        guild_id: Id<GuildMarker>,
        handle: &Handle,
    ) -> PlatformResult<Option<MemberInfo>> {
        let wanted = handle.channel_slug();
        let mut after: Option<Id<UserMarker>> = None;

        loop {
            let response = match after {
                Some(after_id) => {
                    self.http
                        .guild_members(guild_id)
                        .after(after_id)
                        .limit(MEMBER_PAGE_SIZE)
                        .await?
                }
                None => {
                    self.http
                        .guild_members(guild_id)
                        .limit(MEMBER_PAGE_SIZE)
                        .await?
                }
            };

            let members = response.model().await?;
            let page_len = members.len();
            after = members.last().map(|member| member.user.id);

            if let Some(found) = members.into_iter().find(|member| {
                member.user.discriminator == handle.discriminator
                    && Handle::from_user(&member.user).channel_slug() == wanted
            }) {
                return Ok(Some(member_info(found)));
            }

            if page_len < usize::from(MEMBER_PAGE_SIZE) {
                return Ok(None);
            }
        }
    }

    async fn bot_channel_permissions(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> PlatformResult<Permissions> {
        let bot_id = self.bot_user_id().await?;
        let guild = self.http.guild(guild_id).await?.model().await?;
        let member = self.http.guild_member(guild_id, bot_id).await?.model().await?;
        let channel = self.http.channel(channel_id).await?.model().await?;

        let everyone = guild
            .roles
            .iter()
            .find(|role| role.id == guild_id.cast())
            .map_or(Permissions::empty(), |role| role.permissions);

        let member_roles: Vec<(Id<RoleMarker>, Permissions)> = guild
            .roles
            .iter()
            .filter(|role| member.roles.contains(&role.id))
            .map(|role| (role.id, role.permissions))
            .collect();

        let overwrites = channel.permission_overwrites.unwrap_or_default();
        let permissions = PermissionCalculator::new(guild_id, bot_id, everyone, &member_roles)
            .owner_id(guild.owner_id)
            .in_channel(channel.kind, &overwrites);

        debug!(
            guild_id = guild_id.get(),
            channel_id = channel_id.get(),
            ?permissions,
            "resolved bot channel permissions"
        );

        Ok(permissions)
    }
}

#[async_trait]
impl MessageService for HttpPlatform {
    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        let attachments: Vec<Attachment> = message
            .attachment
            .map(|file| Attachment::from_bytes(file.filename, file.bytes, 0))
            .into_iter()
            .collect();

        let mut request = self
            .http
            .create_message(channel_id)
            .embeds(&message.embeds)
            .components(&message.components);

        if let Some(content) = message.content.as_deref() {
            request = request.content(content);
        }

        if !attachments.is_empty() {
            request = request.attachments(&attachments);
        }

        request.await?;
        Ok(())
    }

    async fn send_direct(
        &self,
        user_id: Id<UserMarker>,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        let channel = self
            .http
            .create_private_channel(user_id)
            .await?
            .model()
            .await?;

        self.send(channel.id, message).await
    }

    async fn history(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<Vec<HistoryMessage>> {
        let mut history = Vec::new();
        let mut before = None;

        loop {
            let response = match before {
                Some(before_id) => {
                    self.http
                        .channel_messages(channel_id)
                        .before(before_id)
                        .limit(HISTORY_PAGE_SIZE)
                        .await?
                }
                None => {
                    self.http
                        .channel_messages(channel_id)
                        .limit(HISTORY_PAGE_SIZE)
                        .await?
                }
            };

            let page = response.model().await?;
            let page_len = page.len();
            before = page.last().map(|message| message.id);
            history.extend(page.into_iter().map(history_message));

            if page_len < usize::from(HISTORY_PAGE_SIZE) {
                break;
            }
        }

        history.sort_by_key(|message| message.id);
        Ok(history)
    }
}

fn channel_info(channel: Channel) -> ChannelInfo {
    ChannelInfo {
        created_at: DateTime::from_timestamp_millis(channel.id.timestamp()).unwrap_or_default(),
        id: channel.id,
        guild_id: channel.guild_id,
        name: channel.name.unwrap_or_default(),
        kind: channel.kind,
        parent_id: channel.parent_id,
        topic: channel.topic,
    }
}

fn member_info(member: Member) -> MemberInfo {
    let user_id = member.user.id;

    MemberInfo {
        user_id,
        handle: Handle::from_user(&member.user),
        display_name: display_name(&member.user, member.nick.as_deref()),
        avatar_url: avatar_url(user_id, member.user.avatar),
        roles: member.roles,
    }
}

fn history_message(message: Message) -> HistoryMessage {
    let nick = message
        .member
        .as_ref()
        .and_then(|member| member.nick.as_deref());

    HistoryMessage {
        id: message.id,
        timestamp: timestamp_utc(message.timestamp.as_micros()),
        author: Author {
            display_name: display_name(&message.author, nick),
            handle: Handle::from_user(&message.author),
        },
        content: message.content,
        embeds: message
            .embeds
            .into_iter()
            .map(|embed| EmbedSummary {
                title: embed.title,
                description: embed.description,
            })
            .collect(),
        attachments: message
            .attachments
            .into_iter()
            .map(|attachment| attachment.filename)
            .collect(),
    }
}

fn timestamp_utc(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
