use twilight_model::{
    channel::message::embed::Embed, gateway::payload::incoming::MessageCreate, guild::Permissions,
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use super::{reply_embed, report_platform_failure, report_store_failure, require_guild_permission};
use crate::CommandMeta;
use ticket_core::{Context, PlatformError};
use ticket_core::model::{ChannelInfo, RoleInfo};
use ticket_store::GuildConfig;
use ticket_utils::embed::INFO_COLOR;

pub const META: CommandMeta = CommandMeta {
    name: "ticket-info",
    desc: "Show the ticket system settings of this server.",
    category: "tickets",
    usage: "!ticket-info",
};

const NOT_CONFIGURED: &str = "Not configured";

/// Show category, staff roles and transcript channel of the current guild.
pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let Some(guild_id) =
        require_guild_permission(http, &msg, Permissions::MANAGE_CHANNELS).await?
    else {
        return Ok(());
    };

    let guild_config = match services.store.guild(guild_id.get()).await {
        Ok(guild_config) => guild_config,
        Err(source) => {
            return report_store_failure(http, &msg, source, "reading the ticket settings").await;
        }
    };

    let platform = &services.platform;
    let resolved = async {
        let channels = platform.guild_channels(guild_id).await?;
        let roles = platform.guild_roles(guild_id).await?;
        let guild_name = platform.guild_name(guild_id).await?;
        Ok::<_, PlatformError>((channels, roles, guild_name))
    };

    let (channels, roles, guild_name) = match resolved.await {
        Ok(resolved) => resolved,
        Err(source) => {
            return report_platform_failure(http, &msg, source, "reading the ticket settings")
                .await;
        }
    };

    let embed = info_embed(&guild_name, &info_fields(&guild_config, &channels, &roles))?;
    reply_embed(http, msg.channel_id, embed).await?;

    Ok(())
}

/// `(name, value)` pairs describing a guild's settings.
///
/// References to deleted channels or roles render as warnings.
pub fn info_fields(
    guild_config: &GuildConfig,
    channels: &[ChannelInfo],
    roles: &[RoleInfo],
) -> Vec<(&'static str, String)> {
    let find_channel = |id: u64| channels.iter().find(|channel| channel.id.get() == id);

    let category = match guild_config.ticket_category_id {
        Some(category_id) => find_channel(category_id).map_or_else(
            || "⚠️ Category not found".to_owned(),
            |category| category.name.clone(),
        ),
        None => NOT_CONFIGURED.to_owned(),
    };

    let staff = if guild_config.staff_role_ids.is_empty() {
        NOT_CONFIGURED.to_owned()
    } else {
        guild_config
            .staff_role_ids
            .iter()
            .map(|role_id| {
                if roles.iter().any(|role| role.id.get() == *role_id) {
                    format!("<@&{role_id}>")
                } else {
                    format!("⚠️ Role not found (ID: {role_id})")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let transcript = match guild_config.transcript_channel_id {
        Some(channel_id) => find_channel(channel_id)
            .map_or_else(|| "⚠️ Channel not found".to_owned(), ChannelInfo::mention),
        None => NOT_CONFIGURED.to_owned(),
    };

    vec![
        ("📁 Ticket Category", category),
        ("👮 Staff Roles", staff),
        ("📝 Transcript Channel", transcript),
    ]
}

fn info_embed(guild_name: &str, fields: &[(&'static str, String)]) -> anyhow::Result<Embed> {
    let builder = fields.iter().fold(
        EmbedBuilder::new()
            .title("🎫 Ticket System Settings")
            .color(INFO_COLOR),
        |builder, (name, value)| builder.field(EmbedFieldBuilder::new(*name, value.as_str())),
    );

    let embed = builder
        .footer(EmbedFooterBuilder::new(format!("Server: {guild_name}")))
        .validate()?
        .build();

    Ok(embed)
}
