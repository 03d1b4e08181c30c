use tracing::{error, info};
use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    id::{Id, marker::ChannelMarker},
};

use super::{find_guild_channel, reply, report_platform_failure, require_guild_permission};
use crate::CommandMeta;
use crate::messages::{generic_failure_message, usage_message};
use crate::tickets::embeds::{panel_components, panel_embed};
use ticket_core::Context;
use ticket_core::model::OutgoingMessage;
use ticket_utils::parse::parse_channel_id;
use ticket_utils::permissions::grants;

pub const META: CommandMeta = CommandMeta {
    name: "ticket-panel",
    desc: "Post the ticket panel with its Create Ticket button.",
    category: "tickets",
    usage: "!ticket-panel [#channel]",
};

/// What the bot needs in a channel to post the panel there.
pub const PANEL_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::EMBED_LINKS);

/// Post the ticket panel in the given channel, or the current one.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let Some(guild_id) =
        require_guild_permission(http, &msg, Permissions::MANAGE_CHANNELS).await?
    else {
        return Ok(());
    };

    let target = match arg1 {
        Some(raw) => {
            let Some(channel_id) = parse_channel_id(raw) else {
                reply(http, msg.channel_id, &usage_message(META.usage)).await?;
                return Ok(());
            };

            match find_guild_channel(services, guild_id, channel_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    reply(http, msg.channel_id, "❌ That channel is not part of this server.")
                        .await?;
                    return Ok(());
                }
                Err(source) => {
                    return report_platform_failure(
                        http,
                        &msg,
                        source,
                        "creating the ticket panel",
                    )
                    .await;
                }
            }

            channel_id
        }
        None => msg.channel_id,
    };

    let bot_permissions = match services.platform.bot_channel_permissions(guild_id, target).await {
        Ok(bot_permissions) => bot_permissions,
        Err(source) => {
            return report_platform_failure(http, &msg, source, "creating the ticket panel").await;
        }
    };

    if !grants(bot_permissions, PANEL_PERMISSIONS) {
        reply(http, msg.channel_id, &missing_permissions_message(target)).await?;
        return Ok(());
    }

    let panel = OutgoingMessage::embed(panel_embed()?).with_components(panel_components());

    match services.platform.send(target, panel).await {
        Ok(()) => {
            info!(
                guild_id = guild_id.get(),
                channel_id = target.get(),
                "ticket panel created by {}",
                msg.author.name
            );
            reply(http, msg.channel_id, &format!("✅ Ticket panel created in <#{target}>!")).await?;
        }
        Err(source) if source.is_forbidden() => {
            reply(
                http,
                msg.channel_id,
                &format!("❌ I don't have permission to send messages in <#{target}>!"),
            )
            .await?;
        }
        Err(source) => {
            error!(?source, channel_id = target.get(), "failed to create ticket panel");
            reply(
                http,
                msg.channel_id,
                &generic_failure_message("creating the ticket panel"),
            )
            .await?;
        }
    }

    Ok(())
}

pub fn missing_permissions_message(channel_id: Id<ChannelMarker>) -> String {
    format!("❌ I don't have permission to send messages or embeds in <#{channel_id}>!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_requires_view_send_and_embed() {
        assert!(grants(PANEL_PERMISSIONS | Permissions::ATTACH_FILES, PANEL_PERMISSIONS));
        assert!(!grants(
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            PANEL_PERMISSIONS
        ));
        assert!(grants(Permissions::ADMINISTRATOR, PANEL_PERMISSIONS));
    }

    #[test]
    fn missing_permissions_message_mentions_channel() {
        assert_eq!(
            missing_permissions_message(Id::new(12)),
            "❌ I don't have permission to send messages or embeds in <#12>!"
        );
    }
}
