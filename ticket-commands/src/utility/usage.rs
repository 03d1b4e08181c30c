use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::admin::reply;
use crate::messages::usage_message;
use crate::{COMMANDS, CommandMeta};
use ticket_core::Context;

pub const META: CommandMeta = CommandMeta {
    name: "usage",
    desc: "Show usage syntax for a specific command.",
    category: "utility",
    usage: "!usage <command>",
};

/// Show usage for a specific command.
///
/// A missing argument returns this command's usage; an unknown command
/// returns a short not-found message.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let Some(raw_name) = arg1 else {
        reply(http, msg.channel_id, &usage_message(META.usage)).await?;
        return Ok(());
    };

    reply(http, msg.channel_id, &usage_lookup(raw_name)).await?;

    Ok(())
}

fn usage_lookup(raw_name: &str) -> String {
    let lookup = raw_name.trim().trim_start_matches('!').to_ascii_lowercase();

    match COMMANDS.iter().find(|command| command.name == lookup) {
        Some(command) => usage_message(command.usage),
        None => format!("Unknown command: `{lookup}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_commands_with_or_without_prefix() {
        assert_eq!(
            usage_lookup("!Set-Staff-Role"),
            "Usage: `!set-staff-role <role>`"
        );
        assert_eq!(usage_lookup("ticket-info"), "Usage: `!ticket-info`");
        assert_eq!(usage_lookup("ban"), "Unknown command: `ban`");
    }
}
