//! Guild administration commands for the ticket system.

pub mod category;
pub mod info;
pub mod panel;
pub mod staff;
pub mod transcript;

use tracing::error;
use twilight_http::Client;
use twilight_model::{
    channel::message::{AllowedMentions, embed::Embed},
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker},
    },
};

use crate::messages::{
    generic_failure_message, guild_only_message, permission_denied_message,
    platform_failure_message,
};
use ticket_core::{PlatformError, PlatformResult, Services};
use ticket_core::model::ChannelInfo;
use ticket_utils::permissions::has_message_permission;

/// Guild of the invoking message, if its author holds `required`.
///
/// Sends the refusal itself and returns `None` otherwise.
pub(crate) async fn require_guild_permission(
    http: &Client,
    msg: &MessageCreate,
    required: Permissions,
) -> anyhow::Result<Option<Id<GuildMarker>>> {
    let Some(guild_id) = msg.guild_id else {
        reply(http, msg.channel_id, guild_only_message()).await?;
        return Ok(None);
    };

    match has_message_permission(http, msg, required).await {
        Ok(true) => {}
        Ok(false) => {
            reply(http, msg.channel_id, permission_denied_message()).await?;
            return Ok(None);
        }
        Err(source) => {
            error!(
                ?source,
                guild_id = guild_id.get(),
                user_id = msg.author.id.get(),
                "failed to resolve command author permissions"
            );
            reply(
                http,
                msg.channel_id,
                &generic_failure_message("checking your permissions"),
            )
            .await?;
            return Ok(None);
        }
    }

    Ok(Some(guild_id))
}

/// Plain-text reply that never pings the roles or users it mentions.
pub(crate) async fn reply(
    http: &Client,
    channel_id: Id<ChannelMarker>,
    content: &str,
) -> anyhow::Result<()> {
    http.create_message(channel_id)
        .content(content)
        .allowed_mentions(Some(&AllowedMentions::default()))
        .await?;

    Ok(())
}

pub(crate) async fn reply_embed(
    http: &Client,
    channel_id: Id<ChannelMarker>,
    embed: Embed,
) -> anyhow::Result<()> {
    http.create_message(channel_id)
        .embeds(&[embed])
        .allowed_mentions(Some(&AllowedMentions::default()))
        .await?;

    Ok(())
}

/// A channel of `guild_id`, or `None` if it does not exist there.
pub(crate) async fn find_guild_channel(
    services: &Services,
    guild_id: Id<GuildMarker>,
    channel_id: Id<ChannelMarker>,
) -> PlatformResult<Option<ChannelInfo>> {
    match services.platform.channel(channel_id).await {
        Ok(channel) if channel.guild_id == Some(guild_id) => Ok(Some(channel)),
        Ok(_) => Ok(None),
        Err(source) if source.is_not_found() || source.is_forbidden() => Ok(None),
        Err(source) => Err(source),
    }
}

/// Log a failed config write and tell the invoker.
pub(crate) async fn report_store_failure(
    http: &Client,
    msg: &MessageCreate,
    source: ticket_store::StoreError,
    action: &str,
) -> anyhow::Result<()> {
    error!(
        ?source,
        guild_id = msg.guild_id.map(Id::get),
        "failed while {action}"
    );
    reply(http, msg.channel_id, &generic_failure_message(action)).await
}

/// Log a failed platform call and tell the invoker.
///
/// Permission denials get a short notice and are not logged as errors.
pub(crate) async fn report_platform_failure(
    http: &Client,
    msg: &MessageCreate,
    source: PlatformError,
    action: &str,
) -> anyhow::Result<()> {
    if !source.is_forbidden() {
        error!(
            ?source,
            guild_id = msg.guild_id.map(Id::get),
            "failed while {action}"
        );
    }
    reply(http, msg.channel_id, &platform_failure_message(&source, action)).await
}
