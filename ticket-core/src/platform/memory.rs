//! In-memory single-guild platform for tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{Mutex, MutexGuard};
use twilight_model::{
    channel::ChannelType,
    guild::Permissions,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker},
    },
};

use super::{ChannelService, MessageService, PermissionService, PlatformError, PlatformResult};
use crate::model::{
    Author, ChannelInfo, Handle, HistoryMessage, MemberInfo, NewChannel, OutgoingMessage, RoleInfo,
};

/// Observable state of a [`MemoryPlatform`].
#[derive(Debug)]
pub struct MemoryState {
    pub guild_id: Id<GuildMarker>,
    pub guild_name: String,
    pub bot_id: Id<UserMarker>,
    pub bot_permissions: Permissions,
    pub channels: Vec<ChannelInfo>,
    pub members: Vec<MemberInfo>,
    pub roles: Vec<RoleInfo>,
    pub history: HashMap<Id<ChannelMarker>, Vec<HistoryMessage>>,
    /// Every channel creation request, including rejected ones.
    pub created: Vec<NewChannel>,
    pub deleted: Vec<Id<ChannelMarker>>,
    pub sent: Vec<(Id<ChannelMarker>, OutgoingMessage)>,
    pub direct: Vec<(Id<UserMarker>, OutgoingMessage)>,
    pub dm_blocked: HashSet<Id<UserMarker>>,
    pub deny_channel_creation: bool,
    pub fail_history: bool,
    next_id: u64,
}

/// Platform double that keeps one guild's channels, members and messages in memory.
///
/// Messages sent through [`MessageService::send`] are recorded in
/// [`MemoryState::sent`]; channel history only grows through
/// [`MemoryPlatform::post`].
pub struct MemoryPlatform {
    state: Mutex<MemoryState>,
}

impl MemoryPlatform {
    pub fn new(guild_id: Id<GuildMarker>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                guild_id,
                guild_name: "Test Guild".to_owned(),
                bot_id: Id::new(1),
                bot_permissions: Permissions::VIEW_CHANNEL
                    | Permissions::SEND_MESSAGES
                    | Permissions::EMBED_LINKS
                    | Permissions::ATTACH_FILES,
                channels: Vec::new(),
                members: Vec::new(),
                roles: Vec::new(),
                history: HashMap::new(),
                created: Vec::new(),
                deleted: Vec::new(),
                sent: Vec::new(),
                direct: Vec::new(),
                dm_blocked: HashSet::new(),
                deny_channel_creation: false,
                fail_history: false,
                next_id: 1_000,
            }),
        }
    }

    pub async fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().await
    }

    pub async fn add_member(&self, user_id: u64, name: &str, discriminator: u16) -> MemberInfo {
        let member = MemberInfo {
            user_id: Id::new(user_id),
            handle: Handle::new(name, discriminator),
            display_name: name.to_owned(),
            avatar_url: crate::model::avatar_url(Id::new(user_id), None),
            roles: Vec::new(),
        };

        self.state.lock().await.members.push(member.clone());
        member
    }

    pub async fn add_role(&self, role_id: u64, name: &str) -> Id<RoleMarker> {
        let id = Id::new(role_id);
        self.state.lock().await.roles.push(RoleInfo {
            id,
            name: name.to_owned(),
        });
        id
    }

    pub async fn add_channel(&self, name: &str, kind: ChannelType) -> ChannelInfo {
        let mut state = self.state.lock().await;
        let id = Id::new(state.next_id());
        let channel = ChannelInfo {
            id,
            guild_id: Some(state.guild_id),
            name: name.to_owned(),
            kind,
            parent_id: None,
            topic: None,
            created_at: fixed_time(0),
        };

        state.channels.push(channel.clone());
        channel
    }

    /// Append a user-authored message to a channel's history.
    pub async fn post(&self, channel_id: Id<ChannelMarker>, author: &MemberInfo, content: &str) {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let position = state.history.get(&channel_id).map_or(0, Vec::len);
        let message = HistoryMessage {
            id: Id::new(id),
            timestamp: fixed_time(60 * (position as i64 + 1)),
            author: Author {
                display_name: author.display_name.clone(),
                handle: author.handle.clone(),
            },
            content: content.to_owned(),
            embeds: Vec::new(),
            attachments: Vec::new(),
        };

        state.history.entry(channel_id).or_default().push(message);
    }

    pub async fn channel_exists(&self, channel_id: Id<ChannelMarker>) -> bool {
        self.state
            .lock()
            .await
            .channels
            .iter()
            .any(|channel| channel.id == channel_id)
    }
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_guild(&self, guild_id: Id<GuildMarker>) -> PlatformResult<()> {
        if guild_id == self.guild_id {
            Ok(())
        } else {
            Err(PlatformError::NotFound)
        }
    }

    fn find_channel(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<&ChannelInfo> {
        self.channels
            .iter()
            .find(|channel| channel.id == channel_id)
            .ok_or(PlatformError::NotFound)
    }
}

/// Deterministic timestamp `offset_secs` after 2024-01-01T00:00:00Z.
pub fn fixed_time(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .map(|base| base + chrono::Duration::seconds(offset_secs))
        .unwrap_or_default()
}

#[async_trait]
impl ChannelService for MemoryPlatform {
    async fn guild_name(&self, guild_id: Id<GuildMarker>) -> PlatformResult<String> {
        let state = self.state.lock().await;
        state.check_guild(guild_id)?;
        Ok(state.guild_name.clone())
    }

    async fn guild_channels(&self, guild_id: Id<GuildMarker>) -> PlatformResult<Vec<ChannelInfo>> {
        let state = self.state.lock().await;
        state.check_guild(guild_id)?;
        Ok(state.channels.clone())
    }

    async fn channel(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<ChannelInfo> {
        let state = self.state.lock().await;
        state.find_channel(channel_id).cloned()
    }

    async fn create_channel(&self, request: NewChannel) -> PlatformResult<ChannelInfo> {
        let mut state = self.state.lock().await;
        state.check_guild(request.guild_id)?;
        state.created.push(request.clone());

        if state.deny_channel_creation {
            return Err(PlatformError::Forbidden);
        }

        let id = Id::new(state.next_id());
        let channel = ChannelInfo {
            id,
            guild_id: Some(request.guild_id),
            name: request.name,
            kind: ChannelType::GuildText,
            parent_id: request.parent_id,
            topic: Some(request.topic),
            created_at: fixed_time(0),
        };

        state.channels.push(channel.clone());
        Ok(channel)
    }

    async fn delete_channel(
        &self,
        channel_id: Id<ChannelMarker>,
        _reason: &str,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().await;
        let before = state.channels.len();
        state.channels.retain(|channel| channel.id != channel_id);

        if state.channels.len() == before {
            return Err(PlatformError::NotFound);
        }

        state.history.remove(&channel_id);
        state.deleted.push(channel_id);
        Ok(())
    }
}

#[async_trait]
impl PermissionService for MemoryPlatform {
    async fn bot_user_id(&self) -> PlatformResult<Id<UserMarker>> {
        Ok(self.state.lock().await.bot_id)
    }

    async fn guild_roles(&self, guild_id: Id<GuildMarker>) -> PlatformResult<Vec<RoleInfo>> {
        let state = self.state.lock().await;
        state.check_guild(guild_id)?;
        Ok(state.roles.clone())
    }

    async fn member(
        &self,
        guild_id: Id<GuildMarker>,
        user_id: Id<UserMarker>,
    ) -> PlatformResult<MemberInfo> {
        let state = self.state.lock().await;
        state.check_guild(guild_id)?;
        state
            .members
            .iter()
            .find(|member| member.user_id == user_id)
            .cloned()
            .ok_or(PlatformError::NotFound)
    }

    async fn find_member_by_handle(
        &self,
        guild_id: Id<GuildMarker>,
        handle: &Handle,
    ) -> PlatformResult<Option<MemberInfo>> {
        let state = self.state.lock().await;
        state.check_guild(guild_id)?;
        let wanted = handle.channel_slug();

        Ok(state
            .members
            .iter()
            .find(|member| {
                member.handle.discriminator == handle.discriminator
                    && member.handle.channel_slug() == wanted
            })
            .cloned())
    }

    async fn bot_channel_permissions(
        &self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> PlatformResult<Permissions> {
        let state = self.state.lock().await;
        state.check_guild(guild_id)?;
        state.find_channel(channel_id)?;
        Ok(state.bot_permissions)
    }
}

#[async_trait]
impl MessageService for MemoryPlatform {
    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().await;
        state.find_channel(channel_id)?;
        state.sent.push((channel_id, message));
        Ok(())
    }

    async fn send_direct(
        &self,
        user_id: Id<UserMarker>,
        message: OutgoingMessage,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().await;

        if state.dm_blocked.contains(&user_id) {
            return Err(PlatformError::Forbidden);
        }

        state.direct.push((user_id, message));
        Ok(())
    }

    async fn history(&self, channel_id: Id<ChannelMarker>) -> PlatformResult<Vec<HistoryMessage>> {
        let state = self.state.lock().await;

        if state.fail_history {
            return Err(PlatformError::Other(anyhow::anyhow!(
                "history unavailable for channel {channel_id}"
            )));
        }

        state.find_channel(channel_id)?;
        Ok(state.history.get(&channel_id).cloned().unwrap_or_default())
    }
}
