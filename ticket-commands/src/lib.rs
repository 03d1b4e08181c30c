pub mod admin;
pub mod messages;
pub mod tickets;
pub mod utility;

use twilight_model::gateway::payload::incoming::{InteractionCreate, MessageCreate};

use ticket_core::Context;
use ticket_utils::COMMAND_PREFIX;
use ticket_utils::interaction::component_custom_id;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum InteractionRoute {
    OpenTicket,
    CloseTicket,
}

fn route_interaction(custom_id: &str) -> Option<InteractionRoute> {
    const ROUTES: [(&str, InteractionRoute); 2] = [
        (tickets::OPEN_TICKET_ID, InteractionRoute::OpenTicket),
        (tickets::CLOSE_TICKET_ID, InteractionRoute::CloseTicket),
    ];

    ROUTES
        .into_iter()
        .find_map(|(id, route)| (custom_id == id).then_some(route))
}

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::help::META,
    utility::usage::META,
    admin::panel::META,
    admin::category::META,
    admin::staff::ADD_META,
    admin::staff::REMOVE_META,
    admin::transcript::SET_META,
    admin::transcript::REMOVE_META,
    admin::info::META,
    // Add new commands here
];

/// Split `!command rest` into the lowercased command and its first argument.
fn parse_command(content: &str) -> Option<(String, Option<&str>)> {
    let content = content.trim().strip_prefix(COMMAND_PREFIX)?.trim();
    let mut command_and_rest = content.splitn(2, char::is_whitespace);
    let cmd = command_and_rest.next().unwrap_or("").to_ascii_lowercase();

    let arg1 = command_and_rest
        .next()
        .and_then(|rest| rest.split_whitespace().next());

    Some((cmd, arg1))
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let content = msg.content.clone();
    let Some((cmd, arg1)) = parse_command(&content) else {
        return Ok(());
    };

    match cmd.as_str() {
        "help" => utility::help::run(ctx, msg, arg1).await?,
        "usage" => utility::usage::run(ctx, msg, arg1).await?,

        "ticket-panel" => admin::panel::run(ctx, msg, arg1).await?,
        "set-ticket-category" => admin::category::run(ctx, msg, arg1).await?,
        "set-staff-role" => admin::staff::run_add(ctx, msg, arg1).await?,
        "remove-staff-role" => admin::staff::run_remove(ctx, msg, arg1).await?,
        "set-transcript-channel" => admin::transcript::run_set(ctx, msg, arg1).await?,
        "remove-transcript-channel" => admin::transcript::run_remove(ctx, msg).await?,
        "ticket-info" => admin::info::run(ctx, msg).await?,
        // Add new commands here
        _ => {}
    }

    Ok(())
}

pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<()> {
    let Some(route) = component_custom_id(&interaction).and_then(route_interaction) else {
        return Ok(());
    };

    match route {
        InteractionRoute::OpenTicket => tickets::open::handle_interaction(ctx, interaction).await?,
        InteractionRoute::CloseTicket => {
            tickets::close::handle_interaction(ctx, interaction).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_ticket_buttons_by_exact_id() {
        assert_eq!(route_interaction("ticket:open"), Some(InteractionRoute::OpenTicket));
        assert_eq!(route_interaction("ticket:close"), Some(InteractionRoute::CloseTicket));
        assert_eq!(route_interaction("ticket:open:extra"), None);
        assert_eq!(route_interaction("pg:help"), None);
    }

    #[test]
    fn parses_command_and_first_argument() {
        assert_eq!(
            parse_command("  !Set-Staff-Role <@&5> trailing"),
            Some(("set-staff-role".to_owned(), Some("<@&5>")))
        );
        assert_eq!(parse_command("!ticket-info"), Some(("ticket-info".to_owned(), None)));
        assert_eq!(parse_command("hello"), None);
    }

    #[test]
    fn command_names_are_unique() {
        for (index, command) in COMMANDS.iter().enumerate() {
            assert!(COMMANDS[index + 1..].iter().all(|other| other.name != command.name));
            assert!(command.usage.starts_with(&format!("!{}", command.name)));
        }
    }
}
