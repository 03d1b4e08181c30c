use twilight_model::channel::message::embed::{Embed, EmbedFooter};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder, ImageSource};

/// Informational embeds (panel, transcripts, configuration).
pub const INFO_COLOR: u32 = 0x34_98_DB;
/// Ticket created.
pub const SUCCESS_COLOR: u32 = 0x00_FF_00;
/// Ticket closing.
pub const DANGER_COLOR: u32 = 0xFF_00_00;
/// Delivery problems the user should know about.
pub const WARNING_COLOR: u32 = 0xFF_AA_00;

/// Footer line with an optional icon.
#[derive(Clone, Copy, Debug)]
pub struct Footer<'a> {
    pub text: &'a str,
    pub icon_url: Option<&'a str>,
}

impl<'a> Footer<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text,
            icon_url: None,
        }
    }

    pub fn with_icon(text: &'a str, icon_url: &'a str) -> Self {
        Self {
            text,
            icon_url: Some(icon_url),
        }
    }
}

/// Build a titled embed with consistent styling.
pub fn build_embed(
    title: &str,
    description: impl Into<String>,
    color: u32,
    footer: Option<Footer<'_>>,
) -> anyhow::Result<Embed> {
    let builder = EmbedBuilder::new()
        .title(title)
        .color(color)
        .description(description);

    let embed = match footer {
        Some(footer) => builder.footer(build_footer(footer)?).validate()?.build(),
        None => builder.validate()?.build(),
    };

    Ok(embed)
}

fn build_footer(footer: Footer<'_>) -> anyhow::Result<EmbedFooter> {
    let builder = EmbedFooterBuilder::new(footer.text);

    let builder = match footer.icon_url.filter(|url| !url.is_empty()) {
        Some(url) => builder.icon_url(ImageSource::url(url)?),
        None => builder,
    };

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_titled_embed_with_footer() {
        let embed = build_embed(
            "Ticket",
            "body",
            INFO_COLOR,
            Some(Footer::with_icon(
                "footer",
                "https://cdn.discordapp.com/embed/avatars/0.png",
            )),
        )
        .expect("valid embed");

        assert_eq!(embed.title.as_deref(), Some("Ticket"));
        assert_eq!(embed.color, Some(INFO_COLOR));
        let footer = embed.footer.expect("footer");
        assert_eq!(footer.text, "footer");
        assert!(footer.icon_url.is_some());
    }
}
