use tracing::info;
use twilight_model::{
    channel::ChannelType,
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    id::{Id, marker::ChannelMarker},
};

use super::{
    find_guild_channel, reply, report_platform_failure, report_store_failure,
    require_guild_permission,
};
use crate::CommandMeta;
use crate::messages::usage_message;
use ticket_core::Context;
use ticket_store::Change;
use ticket_utils::parse::parse_channel_id;
use ticket_utils::permissions::grants;

pub const SET_META: CommandMeta = CommandMeta {
    name: "set-transcript-channel",
    desc: "Archive closed ticket transcripts in a channel.",
    category: "tickets",
    usage: "!set-transcript-channel <#channel>",
};

pub const REMOVE_META: CommandMeta = CommandMeta {
    name: "remove-transcript-channel",
    desc: "Stop archiving transcripts; openers still get theirs by DM.",
    category: "tickets",
    usage: "!remove-transcript-channel",
};

/// What the bot needs in the archive channel.
pub const ARCHIVE_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::EMBED_LINKS)
    .union(Permissions::ATTACH_FILES);

pub async fn run_set(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let Some(guild_id) =
        require_guild_permission(http, &msg, Permissions::MANAGE_CHANNELS).await?
    else {
        return Ok(());
    };

    let Some(channel_id) = arg1.and_then(parse_channel_id) else {
        reply(http, msg.channel_id, &usage_message(SET_META.usage)).await?;
        return Ok(());
    };

    let found = match find_guild_channel(services, guild_id, channel_id).await {
        Ok(found) => found,
        Err(source) => {
            return report_platform_failure(http, &msg, source, "setting the transcript channel")
                .await;
        }
    };

    let Some(channel) = found else {
        reply(http, msg.channel_id, "❌ That channel is not part of this server.").await?;
        return Ok(());
    };

    if !matches!(
        channel.kind,
        ChannelType::GuildText | ChannelType::GuildAnnouncement
    ) {
        reply(http, msg.channel_id, "❌ Transcripts can only be sent to a text channel.").await?;
        return Ok(());
    }

    let bot_permissions = match services
        .platform
        .bot_channel_permissions(guild_id, channel_id)
        .await
    {
        Ok(bot_permissions) => bot_permissions,
        Err(source) => {
            return report_platform_failure(http, &msg, source, "setting the transcript channel")
                .await;
        }
    };

    if !grants(bot_permissions, ARCHIVE_PERMISSIONS) {
        reply(http, msg.channel_id, &missing_permissions_message(channel_id)).await?;
        return Ok(());
    }

    let change = match services
        .store
        .update(guild_id.get(), |guild_config| {
            guild_config.set_transcript_channel(channel_id.get())
        })
        .await
    {
        Ok(change) => change,
        Err(source) => {
            return report_store_failure(http, &msg, source, "setting the transcript channel")
                .await;
        }
    };

    if change.is_applied() {
        info!(
            guild_id = guild_id.get(),
            channel_id = channel_id.get(),
            "transcript channel set to {} by {}",
            channel.name,
            msg.author.name
        );
    }

    reply(http, msg.channel_id, &transcript_set_message(change, channel_id)).await?;

    Ok(())
}

pub async fn run_remove(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;

    let Some(guild_id) =
        require_guild_permission(http, &msg, Permissions::MANAGE_CHANNELS).await?
    else {
        return Ok(());
    };

    let change = match ctx
        .services
        .store
        .update(guild_id.get(), |guild_config| {
            guild_config.clear_transcript_channel()
        })
        .await
    {
        Ok(change) => change,
        Err(source) => {
            return report_store_failure(http, &msg, source, "removing the transcript channel")
                .await;
        }
    };

    if change.is_applied() {
        info!(
            guild_id = guild_id.get(),
            "transcript channel removed by {}", msg.author.name
        );
    }

    reply(http, msg.channel_id, transcript_removed_message(change)).await?;

    Ok(())
}

pub fn missing_permissions_message(channel_id: Id<ChannelMarker>) -> String {
    format!(
        "❌ I don't have enough permissions in <#{channel_id}>!\n\
         I need to view the channel, send messages, embed links and attach files."
    )
}

pub fn transcript_set_message(change: Change, channel_id: Id<ChannelMarker>) -> String {
    match change {
        Change::Applied => format!(
            "✅ Transcript channel set to: <#{channel_id}>\n\
             Transcripts of closed tickets will be sent to this channel."
        ),
        Change::Unchanged => {
            format!("⚠️ Transcripts are already sent to <#{channel_id}>.")
        }
    }
}

pub fn transcript_removed_message(change: Change) -> &'static str {
    match change {
        Change::Applied => {
            "✅ Transcript channel removed.\n\
             Transcripts will only be sent to the ticket opener by DM."
        }
        Change::Unchanged => "ℹ️ No transcript channel is configured in this server.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_needs_attach_files() {
        let without_attach =
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS;

        assert!(!grants(without_attach, ARCHIVE_PERMISSIONS));
        assert!(grants(
            without_attach | Permissions::ATTACH_FILES,
            ARCHIVE_PERMISSIONS
        ));
    }

    #[test]
    fn removing_unset_channel_is_a_notice() {
        assert_eq!(
            transcript_removed_message(Change::Unchanged),
            "ℹ️ No transcript channel is configured in this server."
        );
        assert!(transcript_removed_message(Change::Applied).starts_with("✅"));
    }

    #[test]
    fn set_message_mentions_channel() {
        assert!(transcript_set_message(Change::Applied, Id::new(8)).contains("<#8>"));
    }
}
