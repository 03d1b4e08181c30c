use tracing::info;
use twilight_model::{gateway::payload::incoming::MessageCreate, guild::Permissions, id::Id};

use super::{
    find_guild_channel, reply, report_platform_failure, report_store_failure,
    require_guild_permission,
};
use crate::CommandMeta;
use crate::messages::usage_message;
use ticket_core::Context;
use ticket_core::model::ChannelInfo;
use ticket_store::Change;
use ticket_utils::parse::parse_channel_id;

pub const META: CommandMeta = CommandMeta {
    name: "set-ticket-category",
    desc: "Set the category new tickets are created in, or show the current one.",
    category: "tickets",
    usage: "!set-ticket-category [category]",
};

/// Set the ticket category; without an argument, show the configured one.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let Some(guild_id) =
        require_guild_permission(http, &msg, Permissions::MANAGE_CHANNELS).await?
    else {
        return Ok(());
    };

    let Some(raw_category) = arg1 else {
        let configured = match services.store.guild(guild_id.get()).await {
            Ok(guild_config) => guild_config.ticket_category_id,
            Err(source) => {
                return report_store_failure(http, &msg, source, "reading the ticket category")
                    .await;
            }
        };

        let category = match configured.and_then(Id::new_checked) {
            Some(category_id) => match find_guild_channel(services, guild_id, category_id).await {
                Ok(category) => category,
                Err(source) => {
                    return report_platform_failure(
                        http,
                        &msg,
                        source,
                        "reading the ticket category",
                    )
                    .await;
                }
            },
            None => None,
        };

        reply(
            http,
            msg.channel_id,
            &current_category_message(configured, category.as_ref()),
        )
        .await?;
        return Ok(());
    };

    let Some(category_id) = parse_channel_id(raw_category) else {
        reply(http, msg.channel_id, &usage_message(META.usage)).await?;
        return Ok(());
    };

    let category = match find_guild_channel(services, guild_id, category_id).await {
        Ok(Some(channel)) if channel.is_category() => channel,
        Err(source) => {
            return report_platform_failure(http, &msg, source, "setting the ticket category")
                .await;
        }
        _ => {
            reply(http, msg.channel_id, "❌ That is not a category of this server.").await?;
            return Ok(());
        }
    };

    let change = match services
        .store
        .update(guild_id.get(), |guild_config| {
            guild_config.set_ticket_category(category_id.get())
        })
        .await
    {
        Ok(change) => change,
        Err(source) => {
            return report_store_failure(http, &msg, source, "setting the ticket category").await;
        }
    };

    if change.is_applied() {
        info!(
            guild_id = guild_id.get(),
            category_id = category_id.get(),
            "ticket category set to {} by {}",
            category.name,
            msg.author.name
        );
    }

    reply(http, msg.channel_id, &category_set_message(change, &category)).await?;

    Ok(())
}

pub fn current_category_message(configured: Option<u64>, resolved: Option<&ChannelInfo>) -> String {
    match (configured, resolved) {
        (None, _) => format!(
            "ℹ️ No ticket category is configured. Set one with `{}`.",
            META.usage
        ),
        (Some(_), Some(category)) => format!("📁 Tickets are created in: {}", category.name),
        (Some(category_id), None) => {
            format!("⚠️ The configured ticket category no longer exists (ID: {category_id}).")
        }
    }
}

pub fn category_set_message(change: Change, category: &ChannelInfo) -> String {
    match change {
        Change::Applied => format!("✅ Ticket category set to: {}", category.name),
        Change::Unchanged => format!("⚠️ Tickets are already created in {}.", category.name),
    }
}

#[cfg(test)]
mod tests {
    use twilight_model::channel::ChannelType;

    use super::*;
    use ticket_core::platform::memory::fixed_time;

    fn category() -> ChannelInfo {
        ChannelInfo {
            id: Id::new(30),
            guild_id: Some(Id::new(1)),
            name: "Support".to_owned(),
            kind: ChannelType::GuildCategory,
            parent_id: None,
            topic: None,
            created_at: fixed_time(0),
        }
    }

    #[test]
    fn shows_unset_dangling_and_resolved_categories() {
        assert!(current_category_message(None, None).starts_with("ℹ️ No ticket category"));
        assert_eq!(
            current_category_message(Some(30), None),
            "⚠️ The configured ticket category no longer exists (ID: 30)."
        );
        assert_eq!(
            current_category_message(Some(30), Some(&category())),
            "📁 Tickets are created in: Support"
        );
    }

    #[test]
    fn repeated_category_is_a_notice() {
        assert_eq!(
            category_set_message(Change::Applied, &category()),
            "✅ Ticket category set to: Support"
        );
        assert_eq!(
            category_set_message(Change::Unchanged, &category()),
            "⚠️ Tickets are already created in Support."
        );
    }
}
