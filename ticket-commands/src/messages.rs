//! Reply strings shared across commands.

use ticket_core::PlatformError;

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{usage}`")
}

pub fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub fn permission_denied_message() -> &'static str {
    "You are not permitted to use this command."
}

pub fn generic_failure_message(action: &str) -> String {
    format!("❌ Something went wrong while {action}!")
}

pub fn bot_forbidden_message() -> &'static str {
    "❌ I don't have permission to do that in this server!"
}

/// Reply for a failed platform call: a short notice for permission denials,
/// the generic failure message for everything else.
pub fn platform_failure_message(source: &PlatformError, action: &str) -> String {
    if source.is_forbidden() {
        bot_forbidden_message().to_owned()
    } else {
        generic_failure_message(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denials_get_a_short_notice() {
        assert_eq!(
            platform_failure_message(&PlatformError::Forbidden, "reading the ticket settings"),
            bot_forbidden_message()
        );
    }

    #[test]
    fn other_platform_failures_name_the_action() {
        let source = PlatformError::Other(anyhow::anyhow!("gateway timeout"));

        assert_eq!(
            platform_failure_message(&source, "adding the staff role"),
            "❌ Something went wrong while adding the staff role!"
        );
        assert_eq!(
            platform_failure_message(&PlatformError::NotFound, "adding the staff role"),
            "❌ Something went wrong while adding the staff role!"
        );
    }
}
