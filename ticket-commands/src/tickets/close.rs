use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use twilight_model::{
    gateway::payload::incoming::InteractionCreate,
    id::{
        Id,
        marker::{GuildMarker, UserMarker},
    },
};

use super::TicketError;
use super::embeds::{
    archive_embed, closing_embed, direct_message_failed_embed, direct_transcript_embed,
};
use crate::messages::{guild_only_message, platform_failure_message};
use ticket_core::model::{Actor, ChannelInfo, MemberInfo, OutgoingMessage};
use ticket_core::{Context, Services};
use ticket_store::GuildConfig;
use ticket_utils::interaction::{actor_from_interaction, respond_embed, respond_ephemeral_message};
use ticket_utils::parse::{
    is_ticket_channel, opener_id_from_topic, parse_ticket_channel_name, ticket_channel_name,
};
use ticket_utils::permissions::{CloseGrant, close_grant};
use ticket_utils::transcript::Transcript;

/// Whether a close-button press may proceed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CloseDecision {
    Allowed(CloseGrant),
    Denied,
    /// The button was pressed outside a ticket channel.
    NotATicket,
}

/// How the transcript reached the opener.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    Sent,
    /// The opener does not accept direct messages.
    Blocked,
    Failed,
    /// No opener, or no transcript to send.
    Skipped,
}

/// What a completed close did.
#[derive(Clone, Debug, PartialEq)]
pub struct CloseReport {
    pub opener: Option<Id<UserMarker>>,
    pub transcript: Option<Transcript>,
    pub archived: bool,
    pub direct_message: Delivery,
    pub deleted: bool,
}

/// Decide whether `actor` may close `channel`.
///
/// Opener first, then staff roles, then channel managers.
pub fn authorize_close(
    channel: &ChannelInfo,
    actor: &Actor,
    guild_config: &GuildConfig,
) -> CloseDecision {
    if !is_ticket_channel(&channel.name) {
        return CloseDecision::NotATicket;
    }

    let opened_by_actor = channel
        .topic
        .as_deref()
        .and_then(opener_id_from_topic)
        .is_some_and(|opener_id| opener_id == actor.user_id())
        || ticket_channel_name(&actor.member.handle) == channel.name;

    match close_grant(actor, opened_by_actor, &guild_config.staff_role_ids) {
        Some(grant) => CloseDecision::Allowed(grant),
        None => CloseDecision::Denied,
    }
}

/// Archive the transcript, hand it to the opener, then delete the channel
/// after the configured delay.
///
/// Transcript failures are logged and never stop the deletion.
pub async fn finish_close(
    services: &Services,
    guild_id: Id<GuildMarker>,
    channel: &ChannelInfo,
    closer: &MemberInfo,
    guild_config: &GuildConfig,
    closed_at: DateTime<Utc>,
) -> CloseReport {
    let opener = resolve_opener(services, guild_id, channel).await;

    let mut report = CloseReport {
        opener: opener.as_ref().map(|member| member.user_id),
        transcript: None,
        archived: false,
        direct_message: Delivery::Skipped,
        deleted: false,
    };

    let delivered = deliver_transcript(
        services,
        guild_id,
        channel,
        opener.as_ref(),
        closer,
        guild_config,
        closed_at,
        &mut report,
    )
    .await;

    if let Err(source) = delivered {
        error!(
            ?source,
            channel_id = channel.id.get(),
            "failed to create transcript for {}",
            channel.name
        );
    }

    tokio::time::sleep(services.settings.close_delay).await;

    let reason = format!("Ticket closed by {}", closer.handle);
    report.deleted = match services.platform.delete_channel(channel.id, &reason).await {
        Ok(()) => true,
        Err(source) if source.is_not_found() => true,
        Err(source) => {
            error!(?source, channel_id = channel.id.get(), "failed to delete ticket channel");
            false
        }
    };

    if report.deleted {
        info!(
            guild_id = guild_id.get(),
            channel_id = channel.id.get(),
            "ticket {} closed by {}",
            channel.name,
            closer.handle
        );
    }

    report
}

/// Opener recorded in the topic, or the member the channel name points at.
async fn resolve_opener(
    services: &Services,
    guild_id: Id<GuildMarker>,
    channel: &ChannelInfo,
) -> Option<MemberInfo> {
    let platform = &services.platform;

    if let Some(user_id) = channel.topic.as_deref().and_then(opener_id_from_topic) {
        match platform.member(guild_id, user_id).await {
            Ok(member) => return Some(member),
            Err(source) => warn!(
                ?source,
                user_id = user_id.get(),
                "ticket opener is no longer resolvable"
            ),
        }
    }

    let handle = parse_ticket_channel_name(&channel.name)?;

    match platform.find_member_by_handle(guild_id, &handle).await {
        Ok(member) => member,
        Err(source) => {
            warn!(?source, "failed to look up ticket opener {handle}");
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn deliver_transcript(
    services: &Services,
    guild_id: Id<GuildMarker>,
    channel: &ChannelInfo,
    opener: Option<&MemberInfo>,
    closer: &MemberInfo,
    guild_config: &GuildConfig,
    closed_at: DateTime<Utc>,
    report: &mut CloseReport,
) -> Result<(), TicketError> {
    let platform = &services.platform;

    let history = platform.history(channel.id).await?;
    let transcript = Transcript::build(&channel.name, opener, channel.created_at, closed_at, &history);
    let filename = Transcript::filename(&channel.name);
    let bytes = transcript.render().into_bytes();
    report.transcript = Some(transcript);

    let archive = resolve_archive(services, guild_id, guild_config).await;

    if let Some(archive) = &archive {
        let message = OutgoingMessage::embed(archive_embed(&channel.name, opener, closer, closed_at)?)
            .with_attachment(filename.clone(), bytes.clone());

        match platform.send(archive.id, message).await {
            Ok(()) => report.archived = true,
            Err(source) => warn!(
                ?source,
                channel_id = archive.id.get(),
                "failed to post transcript to archive channel"
            ),
        }
    }

    let Some(opener) = opener else {
        return Ok(());
    };

    let guild_name = match platform.guild_name(guild_id).await {
        Ok(name) => name,
        Err(source) => {
            warn!(?source, guild_id = guild_id.get(), "failed to fetch guild name");
            "the server".to_owned()
        }
    };

    let direct = OutgoingMessage::embed(direct_transcript_embed(&guild_name, closer, closed_at)?)
        .with_attachment(filename, bytes);

    report.direct_message = match platform.send_direct(opener.user_id, direct).await {
        Ok(()) => Delivery::Sent,
        Err(source) if source.is_forbidden() => {
            warn!(
                user_id = opener.user_id.get(),
                "could not send transcript to {}, direct messages are disabled",
                opener.handle
            );

            if let Some(archive) = &archive {
                let notice = OutgoingMessage::embed(direct_message_failed_embed(opener)?);
                if let Err(source) = platform.send(archive.id, notice).await {
                    warn!(?source, "failed to post direct message notice");
                }
            }

            Delivery::Blocked
        }
        Err(source) => {
            warn!(
                ?source,
                user_id = opener.user_id.get(),
                "failed to send transcript by direct message"
            );
            Delivery::Failed
        }
    };

    Ok(())
}

/// Configured archive channel, if it still exists in this guild.
async fn resolve_archive(
    services: &Services,
    guild_id: Id<GuildMarker>,
    guild_config: &GuildConfig,
) -> Option<ChannelInfo> {
    let channel_id = Id::new_checked(guild_config.transcript_channel_id?)?;

    match services.platform.channel(channel_id).await {
        Ok(channel) if channel.guild_id == Some(guild_id) => Some(channel),
        Ok(_) => None,
        Err(source) => {
            warn!(
                ?source,
                channel_id = channel_id.get(),
                "transcript channel is not resolvable"
            );
            None
        }
    }
}

/// Handle a press on a ticket's "Close Ticket" button.
pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    let services = &ctx.services;

    let (Some(guild_id), Some(channel_id), Some(actor)) = (
        interaction.guild_id,
        interaction.channel.as_ref().map(|channel| channel.id),
        actor_from_interaction(&interaction),
    ) else {
        respond_ephemeral_message(http, &interaction, guild_only_message()).await?;
        return Ok(());
    };

    let channel = match services.platform.channel(channel_id).await {
        Ok(channel) => channel,
        Err(source) => {
            if !source.is_forbidden() {
                error!(?source, channel_id = channel_id.get(), "failed to fetch ticket channel");
            }

            let message = platform_failure_message(&source, "closing the ticket");
            respond_ephemeral_message(http, &interaction, &message).await?;
            return Ok(());
        }
    };

    let guild_config = match services.store.guild(guild_id.get()).await {
        Ok(guild_config) => guild_config,
        Err(source) => {
            error!(?source, guild_id = guild_id.get(), "failed to load guild config");
            GuildConfig::default()
        }
    };

    match authorize_close(&channel, &actor, &guild_config) {
        CloseDecision::NotATicket => {
            respond_ephemeral_message(
                http,
                &interaction,
                "❌ This button only works in ticket channels!",
            )
            .await?;
        }
        CloseDecision::Denied => {
            respond_ephemeral_message(
                http,
                &interaction,
                "❌ You don't have permission to close this ticket!",
            )
            .await?;
        }
        CloseDecision::Allowed(_) => {
            let delay_secs = services.settings.close_delay.as_secs();
            respond_embed(http, &interaction, closing_embed(&actor.member, delay_secs)?).await?;

            finish_close(
                services,
                guild_id,
                &channel,
                &actor.member,
                &guild_config,
                Utc::now(),
            )
            .await;
        }
    }

    Ok(())
}
