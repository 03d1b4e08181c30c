use tracing::{error, info};
use twilight_model::{
    gateway::payload::incoming::InteractionCreate,
    id::{
        Id,
        marker::{GuildMarker, RoleMarker},
    },
};

use super::TicketError;
use super::embeds::{close_components, staff_notice, welcome_embed};
use crate::messages::{generic_failure_message, guild_only_message};
use ticket_core::model::{ChannelInfo, MemberInfo, NewChannel, OutgoingMessage};
use ticket_core::{Context, Services};
use ticket_utils::interaction::{
    actor_from_interaction, defer_ephemeral, followup_ephemeral, respond_ephemeral_message,
};
use ticket_utils::parse::{ticket_channel_name, ticket_topic};
use ticket_utils::permissions::ticket_overwrites;

/// Result of an open-ticket request.
#[derive(Clone, Debug, PartialEq)]
pub enum OpenOutcome {
    Created(ChannelInfo),
    /// The user already has a ticket channel; nothing was created.
    AlreadyOpen(ChannelInfo),
    /// Another request from the same user is still creating a ticket.
    Pending,
    Forbidden,
    Failed,
}

/// Provision a ticket channel for `opener`, or point at their existing one.
pub async fn open_ticket(
    services: &Services,
    guild_id: Id<GuildMarker>,
    opener: &MemberInfo,
) -> OpenOutcome {
    let Some(_reservation) = services.reservations.try_reserve(guild_id, opener.user_id) else {
        return OpenOutcome::Pending;
    };

    match try_open(services, guild_id, opener).await {
        Ok(outcome) => outcome,
        Err(source) if source.is_forbidden() => OpenOutcome::Forbidden,
        Err(source) => {
            error!(
                ?source,
                guild_id = guild_id.get(),
                user_id = opener.user_id.get(),
                "failed to create ticket"
            );
            OpenOutcome::Failed
        }
    }
}

async fn try_open(
    services: &Services,
    guild_id: Id<GuildMarker>,
    opener: &MemberInfo,
) -> Result<OpenOutcome, TicketError> {
    let platform = &services.platform;
    let name = ticket_channel_name(&opener.handle);

    let channels = platform.guild_channels(guild_id).await?;
    if let Some(existing) = channels.iter().find(|channel| channel.name == name) {
        return Ok(OpenOutcome::AlreadyOpen(existing.clone()));
    }

    let guild_config = services.store.guild(guild_id.get()).await?;

    let parent_id = guild_config.ticket_category_id.and_then(|category_id| {
        channels
            .iter()
            .find(|channel| channel.id.get() == category_id && channel.is_category())
            .map(|channel| channel.id)
    });

    let staff_roles = resolve_staff_roles(services, guild_id, &guild_config.staff_role_ids).await?;
    let bot_id = platform.bot_user_id().await?;

    let channel = platform
        .create_channel(NewChannel {
            guild_id,
            name,
            parent_id,
            topic: ticket_topic(&opener.display_name, opener.user_id),
            overwrites: ticket_overwrites(guild_id, opener.user_id, bot_id, &staff_roles),
        })
        .await?;

    if !staff_roles.is_empty() {
        platform
            .send(channel.id, OutgoingMessage::text(staff_notice(&staff_roles, opener)))
            .await?;
    }

    let welcome = OutgoingMessage::embed(welcome_embed(opener)?).with_components(close_components());
    platform.send(channel.id, welcome).await?;

    info!(
        guild_id = guild_id.get(),
        channel_id = channel.id.get(),
        user_id = opener.user_id.get(),
        "ticket created by {}",
        opener.handle
    );

    Ok(OpenOutcome::Created(channel))
}

/// Configured staff roles that still exist in the guild.
async fn resolve_staff_roles(
    services: &Services,
    guild_id: Id<GuildMarker>,
    configured: &[u64],
) -> Result<Vec<Id<RoleMarker>>, TicketError> {
    if configured.is_empty() {
        return Ok(Vec::new());
    }

    let roles = services.platform.guild_roles(guild_id).await?;

    Ok(configured
        .iter()
        .filter_map(|role_id| roles.iter().find(|role| role.id.get() == *role_id))
        .map(|role| role.id)
        .collect())
}

/// Ephemeral reply for each open outcome.
pub fn open_outcome_message(outcome: &OpenOutcome) -> String {
    match outcome {
        OpenOutcome::Created(channel) => {
            format!("✅ Your ticket has been created: {}", channel.mention())
        }
        OpenOutcome::AlreadyOpen(channel) => {
            format!("❌ You already have an open ticket: {}", channel.mention())
        }
        OpenOutcome::Pending => "⏳ Your ticket is already being created.".to_owned(),
        OpenOutcome::Forbidden => "❌ I don't have permission to create channels!".to_owned(),
        OpenOutcome::Failed => generic_failure_message("creating your ticket"),
    }
}

/// Handle a press on the panel's "Create Ticket" button.
pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<()> {
    let http = &ctx.http;

    let (Some(guild_id), Some(actor)) = (interaction.guild_id, actor_from_interaction(&interaction))
    else {
        respond_ephemeral_message(http, &interaction, guild_only_message()).await?;
        return Ok(());
    };

    defer_ephemeral(http, &interaction).await?;

    let outcome = open_ticket(&ctx.services, guild_id, &actor.member).await;
    followup_ephemeral(http, &interaction, &open_outcome_message(&outcome)).await?;

    Ok(())
}
