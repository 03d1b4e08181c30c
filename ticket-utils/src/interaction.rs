use twilight_http::Client;
use twilight_model::{
    application::interaction::{Interaction, InteractionData},
    channel::message::{
        EmojiReactionType, MessageFlags,
        component::{ActionRow, Button, ButtonStyle, Component},
        embed::Embed,
    },
    guild::Permissions,
    http::interaction::{InteractionResponse, InteractionResponseType},
};
use twilight_util::builder::InteractionResponseDataBuilder;

use ticket_core::model::{Actor, Handle, MemberInfo, avatar_url, display_name};

/// Single-button action row, as used by the ticket panel and close control.
pub fn button_row(
    custom_id: &str,
    label: &str,
    emoji: &str,
    style: ButtonStyle,
) -> Vec<Component> {
    vec![Component::ActionRow(ActionRow {
        id: None,
        components: vec![Component::Button(Button {
            id: None,
            custom_id: Some(custom_id.to_owned()),
            disabled: false,
            emoji: Some(EmojiReactionType::Unicode {
                name: emoji.to_owned(),
            }),
            label: Some(label.to_owned()),
            style,
            url: None,
            sku_id: None,
        })],
    })]
}

/// Custom id of a message component interaction.
pub fn component_custom_id(interaction: &Interaction) -> Option<&str> {
    match interaction.data.as_ref()? {
        InteractionData::MessageComponent(data) => Some(data.custom_id.as_str()),
        _ => None,
    }
}

/// Build the acting member (with channel permissions) from a guild interaction.
///
/// Returns `None` for interactions outside a guild.
pub fn actor_from_interaction(interaction: &Interaction) -> Option<Actor> {
    let member = interaction.member.as_ref()?;
    let user = member.user.as_ref().or(interaction.user.as_ref())?;

    Some(Actor {
        member: MemberInfo {
            user_id: user.id,
            handle: Handle::from_user(user),
            display_name: display_name(user, member.nick.as_deref()),
            avatar_url: avatar_url(user.id, user.avatar),
            roles: member.roles.clone(),
        },
        permissions: member.permissions.unwrap_or_else(Permissions::empty),
    })
}

/// Respond to an interaction with an ephemeral message.
pub async fn respond_ephemeral_message(
    http: &Client,
    interaction: &Interaction,
    content: &str,
) -> anyhow::Result<()> {
    let response = InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .content(content)
                .flags(MessageFlags::EPHEMERAL)
                .build(),
        ),
    };

    http.interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await?;

    Ok(())
}

/// Respond to an interaction with a public embed in the channel.
pub async fn respond_embed(
    http: &Client,
    interaction: &Interaction,
    embed: Embed,
) -> anyhow::Result<()> {
    let response = InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .embeds(vec![embed])
                .build(),
        ),
    };

    http.interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await?;

    Ok(())
}

/// Acknowledge an interaction now and answer privately later.
pub async fn defer_ephemeral(http: &Client, interaction: &Interaction) -> anyhow::Result<()> {
    let response = InteractionResponse {
        kind: InteractionResponseType::DeferredChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .flags(MessageFlags::EPHEMERAL)
                .build(),
        ),
    };

    http.interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await?;

    Ok(())
}

/// Send an ephemeral follow-up to a deferred interaction.
pub async fn followup_ephemeral(
    http: &Client,
    interaction: &Interaction,
    content: &str,
) -> anyhow::Result<()> {
    http.interaction(interaction.application_id)
        .create_followup(&interaction.token)
        .content(content)
        .flags(MessageFlags::EPHEMERAL)
        .await?;

    Ok(())
}
