use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::admin::{reply, reply_embed};
use crate::{COMMANDS, CommandMeta};
use ticket_core::Context;
use ticket_utils::embed::{Footer, INFO_COLOR, build_embed};

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category]",
};

/// Render the command catalog, optionally filtered by category.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let category = arg1.map(|raw| raw.trim().to_ascii_lowercase());

    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();

    if let Some(wanted_category) = category.as_deref()
        && !categories.contains(&wanted_category)
    {
        let out = unknown_category_message(wanted_category, &categories);
        reply(http, msg.channel_id, &out).await?;
        return Ok(());
    }

    let commands = sorted_commands(category.as_deref());
    let embed = build_embed(
        "Available Commands",
        grouped_help_description(&commands),
        INFO_COLOR,
        Some(Footer::text("Use !usage <command> for details")),
    )?;
    reply_embed(http, msg.channel_id, embed).await?;

    Ok(())
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut filtered: Vec<&'static CommandMeta> = COMMANDS
        .iter()
        .filter(|cmd| match category {
            Some(wanted) => cmd.category == wanted,
            None => true,
        })
        .collect();

    filtered.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    filtered
}

/// Commands grouped under a bold heading per category. Expects sorted input.
fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut out = String::new();
    let mut current = None;

    for command in commands {
        if current != Some(command.category) {
            if current.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("**{}**\n", command.category));
            current = Some(command.category);
        }

        out.push_str(&format!("`{}` - {}\n", command.usage, command.desc));
    }

    out
}

fn unknown_category_message(wanted: &str, categories: &[&str]) -> String {
    format!(
        "Unknown category: `{wanted}`. Available: {}",
        categories
            .iter()
            .map(|category| format!("`{category}`"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_command_once() {
        let description = grouped_help_description(&sorted_commands(None));

        for command in COMMANDS {
            assert_eq!(description.matches(&format!("`{}`", command.usage)).count(), 1);
        }
        assert!(description.starts_with("**tickets**\n"));
    }

    #[test]
    fn category_filter_keeps_only_that_category() {
        let commands = sorted_commands(Some("utility"));

        assert!(!commands.is_empty());
        assert!(commands.iter().all(|command| command.category == "utility"));
    }
}
