use twilight_http::Client;
use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    channel::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType},
    id::{
        Id,
        marker::{GuildMarker, RoleMarker, UserMarker},
    },
};

use ticket_core::model::Actor;

/// Permissions granted to the member who opened a ticket.
pub const OPENER_ALLOW: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::EMBED_LINKS);

/// Permissions granted to the bot inside ticket channels.
pub const BOT_ALLOW: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::MANAGE_CHANNELS)
    .union(Permissions::MANAGE_MESSAGES);

/// Permissions granted to each configured staff role.
pub const STAFF_ALLOW: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::MANAGE_MESSAGES);

/// Whether a permission set satisfies `required` (administrators always do).
pub fn grants(perms: Permissions, required: Permissions) -> bool {
    perms.contains(Permissions::ADMINISTRATOR) || perms.contains(required)
}

/// Overwrites for a new ticket channel: hidden from `@everyone`, visible to
/// the opener, the bot, and every staff role.
pub fn ticket_overwrites(
    guild_id: Id<GuildMarker>,
    opener_id: Id<UserMarker>,
    bot_id: Id<UserMarker>,
    staff_roles: &[Id<RoleMarker>],
) -> Vec<PermissionOverwrite> {
    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            id: guild_id.cast(),
            kind: PermissionOverwriteType::Role,
        },
        PermissionOverwrite {
            allow: OPENER_ALLOW,
            deny: Permissions::empty(),
            id: opener_id.cast(),
            kind: PermissionOverwriteType::Member,
        },
        PermissionOverwrite {
            allow: BOT_ALLOW,
            deny: Permissions::empty(),
            id: bot_id.cast(),
            kind: PermissionOverwriteType::Member,
        },
    ];

    overwrites.extend(staff_roles.iter().map(|role_id| PermissionOverwrite {
        allow: STAFF_ALLOW,
        deny: Permissions::empty(),
        id: role_id.cast(),
        kind: PermissionOverwriteType::Role,
    }));

    overwrites
}

/// Why an actor may close a ticket. Checked in declaration order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CloseGrant {
    Opener,
    Staff,
    ChannelManager,
}

/// Close authorization: the opener, then staff roles, then channel managers.
pub fn close_grant(actor: &Actor, is_opener: bool, staff_roles: &[u64]) -> Option<CloseGrant> {
    if is_opener {
        return Some(CloseGrant::Opener);
    }

    if actor
        .member
        .roles
        .iter()
        .any(|role_id| staff_roles.contains(&role_id.get()))
    {
        return Some(CloseGrant::Staff);
    }

    grants(actor.permissions, Permissions::MANAGE_CHANNELS).then_some(CloseGrant::ChannelManager)
}

/// Resolve the invoking author's effective guild permissions for a message command.
///
/// Returns `Ok(None)` when the message is not from a guild context.
pub async fn resolve_message_author_permissions(
    http: &Client,
    msg: &MessageCreate,
) -> anyhow::Result<Option<Permissions>> {
    if let Some(perms) = msg.member.as_ref().and_then(|m| m.permissions) {
        return Ok(Some(perms));
    }

    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };

    let guild = http.guild(guild_id).await?.model().await?;
    if guild.owner_id == msg.author.id {
        return Ok(Some(Permissions::all()));
    }

    let member = http
        .guild_member(guild_id, msg.author.id)
        .await?
        .model()
        .await?;

    let mut resolved = Permissions::empty();

    for role in guild.roles {
        if role.id == guild_id.cast() || member.roles.contains(&role.id) {
            resolved |= role.permissions;
        }
    }

    Ok(Some(resolved))
}

/// Check whether the message author has a required permission (or administrator).
///
/// Returns `Ok(false)` when the message is outside a guild context.
pub async fn has_message_permission(
    http: &Client,
    msg: &MessageCreate,
    required: Permissions,
) -> anyhow::Result<bool> {
    let Some(perms) = resolve_message_author_permissions(http, msg).await? else {
        return Ok(false);
    };

    Ok(grants(perms, required))
}
