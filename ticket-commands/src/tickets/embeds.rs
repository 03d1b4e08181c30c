use chrono::{DateTime, Utc};
use twilight_model::{
    channel::message::{component::ButtonStyle, component::Component, embed::Embed},
    id::{Id, marker::RoleMarker},
};

use ticket_core::model::MemberInfo;
use ticket_utils::embed::{
    DANGER_COLOR, Footer, INFO_COLOR, SUCCESS_COLOR, WARNING_COLOR, build_embed,
};
use ticket_utils::interaction::button_row;
use ticket_utils::transcript::format_timestamp;

use super::{CLOSE_TICKET_ID, OPEN_TICKET_ID};

pub fn panel_embed() -> anyhow::Result<Embed> {
    build_embed(
        "🎫 Support Tickets",
        "Opening a ticket puts you in touch with the server staff, who will answer \
         shortly. Please explain the reason for your ticket concisely so we can help \
         you faster.\n\n\
         **What happens when you open a ticket:**\n\
         • A private channel is created just for you\n\
         • Only you and the staff can see it\n\
         • Describe your problem and we will help you\n\n\
         **Note:** you can only have one open ticket at a time.",
        INFO_COLOR,
        Some(Footer::text("Click the button to open a ticket")),
    )
}

pub fn panel_components() -> Vec<Component> {
    button_row(OPEN_TICKET_ID, "Create Ticket", "🎫", ButtonStyle::Primary)
}

pub fn welcome_embed(opener: &MemberInfo) -> anyhow::Result<Embed> {
    let footer_text = format!("Ticket opened by {}", opener.display_name);

    build_embed(
        "🎫 Support Ticket Created",
        format!(
            "Hello {}! Thanks for opening a ticket.\n\n\
             Please describe your problem in detail and our staff will help you shortly.\n\n\
             To close this ticket, click the button below.",
            opener.mention()
        ),
        SUCCESS_COLOR,
        Some(Footer::with_icon(&footer_text, &opener.avatar_url)),
    )
}

pub fn close_components() -> Vec<Component> {
    button_row(CLOSE_TICKET_ID, "Close Ticket", "🔒", ButtonStyle::Danger)
}

/// Ping for the staff roles of a freshly opened ticket.
pub fn staff_notice(staff_roles: &[Id<RoleMarker>], opener: &MemberInfo) -> String {
    let mentions = staff_roles
        .iter()
        .map(|role_id| format!("<@&{role_id}>"))
        .collect::<Vec<_>>()
        .join(" ");

    format!("{mentions} - New ticket opened by {}", opener.mention())
}

pub fn closing_embed(closer: &MemberInfo, delay_secs: u64) -> anyhow::Result<Embed> {
    let footer_text = format!("Closed by {}", closer.display_name);

    build_embed(
        "🔒 Closing Ticket",
        format!("This ticket will close in {delay_secs} seconds..."),
        DANGER_COLOR,
        Some(Footer::with_icon(&footer_text, &closer.avatar_url)),
    )
}

/// Metadata posted with the transcript in the archive channel.
pub fn archive_embed(
    channel_name: &str,
    opener: Option<&MemberInfo>,
    closer: &MemberInfo,
    closed_at: DateTime<Utc>,
) -> anyhow::Result<Embed> {
    let opener_name = opener.map_or("Unknown", |member| member.display_name.as_str());

    build_embed(
        "📝 Ticket Transcript",
        format!(
            "**Channel:** {channel_name}\n\
             **User:** {opener_name}\n\
             **Closed by:** {}\n\
             **Date:** {}",
            closer.display_name,
            format_timestamp(closed_at)
        ),
        INFO_COLOR,
        None,
    )
}

/// Embed sent to the opener alongside their transcript.
pub fn direct_transcript_embed(
    guild_name: &str,
    closer: &MemberInfo,
    closed_at: DateTime<Utc>,
) -> anyhow::Result<Embed> {
    let footer_text = format!("Server: {guild_name}");

    build_embed(
        "📝 Your Ticket Transcript",
        format!(
            "Your ticket in **{guild_name}** has been closed.\n\
             Here is the full transcript of the conversation.\n\n\
             **Closed by:** {}\n\
             **Closed at:** {}",
            closer.display_name,
            format_timestamp(closed_at)
        ),
        INFO_COLOR,
        Some(Footer::text(&footer_text)),
    )
}

/// Archive-channel notice for an opener whose DMs are closed.
pub fn direct_message_failed_embed(opener: &MemberInfo) -> anyhow::Result<Embed> {
    build_embed(
        "⚠️ Transcript could not be sent by DM",
        format!(
            "{}, your ticket was closed but we could not send you the transcript by DM.\n\
             Please enable direct messages to receive transcripts in the future.",
            opener.mention()
        ),
        WARNING_COLOR,
        None,
    )
}
