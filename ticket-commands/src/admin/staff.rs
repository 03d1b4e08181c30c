use tracing::info;
use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    id::{Id, marker::RoleMarker},
};

use super::{reply, report_platform_failure, report_store_failure, require_guild_permission};
use crate::CommandMeta;
use crate::messages::usage_message;
use ticket_core::Context;
use ticket_store::{Change, GuildConfig};
use ticket_utils::parse::parse_role_id;

pub const ADD_META: CommandMeta = CommandMeta {
    name: "set-staff-role",
    desc: "Add a role that can see, close and manage tickets.",
    category: "tickets",
    usage: "!set-staff-role <role>",
};

pub const REMOVE_META: CommandMeta = CommandMeta {
    name: "remove-staff-role",
    desc: "Remove a role from the ticket staff.",
    category: "tickets",
    usage: "!remove-staff-role <role>",
};

/// Outcome of removing a staff role from a guild's settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Removal {
    Removed,
    NotStaff,
    NoneConfigured,
}

pub fn remove_staff_role(guild_config: &mut GuildConfig, role_id: u64) -> Removal {
    if guild_config.staff_role_ids.is_empty() {
        return Removal::NoneConfigured;
    }

    match guild_config.remove_staff_role(role_id) {
        Change::Applied => Removal::Removed,
        Change::Unchanged => Removal::NotStaff,
    }
}

/// Add a staff role. The role must exist in the guild.
pub async fn run_add(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let Some(guild_id) = require_guild_permission(http, &msg, Permissions::MANAGE_ROLES).await?
    else {
        return Ok(());
    };

    let Some(role_id) = arg1.and_then(parse_role_id) else {
        reply(http, msg.channel_id, &usage_message(ADD_META.usage)).await?;
        return Ok(());
    };

    let roles = match services.platform.guild_roles(guild_id).await {
        Ok(roles) => roles,
        Err(source) => {
            return report_platform_failure(http, &msg, source, "adding the staff role").await;
        }
    };
    let Some(role) = roles.iter().find(|role| role.id == role_id) else {
        reply(http, msg.channel_id, "❌ That role does not exist in this server.").await?;
        return Ok(());
    };

    let change = match services
        .store
        .update(guild_id.get(), |guild_config| {
            guild_config.add_staff_role(role_id.get())
        })
        .await
    {
        Ok(change) => change,
        Err(source) => {
            return report_store_failure(http, &msg, source, "adding the staff role").await;
        }
    };

    if change.is_applied() {
        info!(
            guild_id = guild_id.get(),
            role_id = role_id.get(),
            "staff role {} added by {}",
            role.name,
            msg.author.name
        );
    }

    reply(http, msg.channel_id, &staff_added_message(change, role_id)).await?;

    Ok(())
}

/// Remove a staff role. Ids of deleted roles can still be removed.
pub async fn run_remove(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let Some(guild_id) = require_guild_permission(http, &msg, Permissions::MANAGE_ROLES).await?
    else {
        return Ok(());
    };

    let Some(role_id) = arg1.and_then(parse_role_id) else {
        reply(http, msg.channel_id, &usage_message(REMOVE_META.usage)).await?;
        return Ok(());
    };

    let removal = match services
        .store
        .update(guild_id.get(), |guild_config| {
            remove_staff_role(guild_config, role_id.get())
        })
        .await
    {
        Ok(removal) => removal,
        Err(source) => {
            return report_store_failure(http, &msg, source, "removing the staff role").await;
        }
    };

    if removal == Removal::Removed {
        info!(
            guild_id = guild_id.get(),
            role_id = role_id.get(),
            "staff role removed by {}",
            msg.author.name
        );
    }

    reply(http, msg.channel_id, &staff_removed_message(removal, role_id)).await?;

    Ok(())
}

pub fn staff_added_message(change: Change, role_id: Id<RoleMarker>) -> String {
    match change {
        Change::Applied => format!(
            "✅ Staff role added: <@&{role_id}>\n\
             Members with this role can now close and manage tickets."
        ),
        Change::Unchanged => format!("⚠️ The role <@&{role_id}> is already a staff role."),
    }
}

pub fn staff_removed_message(removal: Removal, role_id: Id<RoleMarker>) -> String {
    match removal {
        Removal::Removed => format!("✅ Staff role removed: <@&{role_id}>"),
        Removal::NotStaff => format!("⚠️ The role <@&{role_id}> is not a staff role."),
        Removal::NoneConfigured => "ℹ️ No staff roles are configured in this server.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_an_absent_role_is_a_notice() {
        let mut guild_config = GuildConfig {
            staff_role_ids: vec![1, 2],
            ..GuildConfig::default()
        };

        let removal = remove_staff_role(&mut guild_config, 9);

        assert_eq!(removal, Removal::NotStaff);
        assert_eq!(guild_config.staff_role_ids, vec![1, 2]);
        assert_eq!(
            staff_removed_message(removal, Id::new(9)),
            "⚠️ The role <@&9> is not a staff role."
        );
    }

    #[test]
    fn removing_from_an_empty_staff_set_says_so() {
        let mut guild_config = GuildConfig::default();

        assert_eq!(remove_staff_role(&mut guild_config, 9), Removal::NoneConfigured);
    }

    #[test]
    fn dangling_role_ids_can_be_removed() {
        let mut guild_config = GuildConfig {
            staff_role_ids: vec![404],
            ..GuildConfig::default()
        };

        assert_eq!(remove_staff_role(&mut guild_config, 404), Removal::Removed);
        assert!(guild_config.staff_role_ids.is_empty());
    }

    #[test]
    fn adding_twice_reports_existing_role() {
        assert_eq!(
            staff_added_message(Change::Unchanged, Id::new(3)),
            "⚠️ The role <@&3> is already a staff role."
        );
    }
}
