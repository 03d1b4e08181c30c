use twilight_model::id::{
    Id,
    marker::{ChannelMarker, RoleMarker, UserMarker},
};

use ticket_core::model::Handle;

/// Prefix shared by every ticket channel name.
pub const TICKET_CHANNEL_PREFIX: &str = "ticket-";

/// Parse a channel from a raw argument (`<#id>` or raw ID).
pub fn parse_channel_id(raw: &str) -> Option<Id<ChannelMarker>> {
    let trimmed = raw.trim();
    parse_snowflake(unwrap_mention(trimmed, "<#").unwrap_or(trimmed))
}

/// Parse a role from a raw argument (`<@&id>` or raw ID).
pub fn parse_role_id(raw: &str) -> Option<Id<RoleMarker>> {
    let trimmed = raw.trim();
    parse_snowflake(unwrap_mention(trimmed, "<@&").unwrap_or(trimmed))
}

fn unwrap_mention<'a>(raw: &'a str, open: &str) -> Option<&'a str> {
    raw.strip_prefix(open)?.strip_suffix('>')
}

fn parse_snowflake<T>(numeric: &str) -> Option<Id<T>> {
    let id = numeric.parse::<u64>().ok()?;
    Id::new_checked(id)
}

/// Deterministic channel name for a user's ticket: `ticket-{name}-{discriminator}`.
pub fn ticket_channel_name(handle: &Handle) -> String {
    format!(
        "{TICKET_CHANNEL_PREFIX}{}-{}",
        handle.channel_slug(),
        handle.discriminator_label()
    )
}

pub fn is_ticket_channel(name: &str) -> bool {
    name.starts_with(TICKET_CHANNEL_PREFIX)
}

/// Recover the opener's handle from a ticket channel name.
///
/// The username part may itself contain hyphens; the discriminator is always
/// the last segment.
pub fn parse_ticket_channel_name(name: &str) -> Option<Handle> {
    let rest = name.strip_prefix(TICKET_CHANNEL_PREFIX)?;
    let (username, discriminator) = rest.rsplit_once('-')?;

    if username.is_empty() {
        return None;
    }

    let discriminator = discriminator.parse::<u16>().ok()?;
    Some(Handle::new(username, discriminator))
}

/// Channel topic recording who opened a ticket.
pub fn ticket_topic(display_name: &str, user_id: Id<UserMarker>) -> String {
    format!("Support ticket for {display_name} ({user_id})")
}

/// Opener id recorded in a ticket channel topic, if the topic is intact.
pub fn opener_id_from_topic(topic: &str) -> Option<Id<UserMarker>> {
    let inner = topic.trim().strip_suffix(')')?;
    let (_, raw_id) = inner.rsplit_once('(')?;
    parse_snowflake(raw_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mentions_and_raw_ids() {
        assert_eq!(parse_channel_id("<#7>"), Some(Id::new(7)));
        assert_eq!(parse_channel_id(" 7 "), Some(Id::new(7)));
        assert_eq!(parse_role_id("<@&9>"), Some(Id::new(9)));
        assert_eq!(parse_role_id("0"), None);
        assert_eq!(parse_role_id("<#9>"), None);
        assert_eq!(parse_channel_id("general"), None);
    }

    #[test]
    fn ticket_name_round_trips_hyphenated_usernames() {
        let handle = Handle::new("Mary Jane", 7);
        let name = ticket_channel_name(&handle);

        assert_eq!(name, "ticket-mary-jane-0007");
        assert!(is_ticket_channel(&name));

        let parsed = parse_ticket_channel_name(&name).expect("ticket name");
        assert_eq!(parsed, Handle::new("mary-jane", 7));
    }

    #[test]
    fn migrated_accounts_use_zero_discriminator() {
        let name = ticket_channel_name(&Handle::new("bob", 0));
        assert_eq!(name, "ticket-bob-0");
        assert_eq!(parse_ticket_channel_name(&name), Some(Handle::new("bob", 0)));
    }

    #[test]
    fn rejects_non_ticket_names() {
        assert_eq!(parse_ticket_channel_name("general"), None);
        assert_eq!(parse_ticket_channel_name("ticket-"), None);
        assert_eq!(parse_ticket_channel_name("ticket-bob"), None);
        assert_eq!(parse_ticket_channel_name("ticket-bob-xyz"), None);
    }

    #[test]
    fn topic_records_opener_id() {
        let topic = ticket_topic("Alice (support)", Id::new(123));
        assert_eq!(topic, "Support ticket for Alice (support) (123)");
        assert_eq!(opener_id_from_topic(&topic), Some(Id::new(123)));
        assert_eq!(opener_id_from_topic("edited by staff"), None);
    }
}
