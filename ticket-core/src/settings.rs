use std::{env, path::PathBuf, time::Duration};

use anyhow::Context as _;

/// Seconds a closed ticket stays visible before its channel is deleted.
pub const DEFAULT_CLOSE_DELAY_SECS: u64 = 5;
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Runtime settings read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Settings {
    pub discord_token: String,
    pub config_path: PathBuf,
    pub tickets: TicketSettings,
}

/// Knobs of the ticket lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TicketSettings {
    pub close_delay: Duration,
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            close_delay: Duration::from_secs(DEFAULT_CLOSE_DELAY_SECS),
        }
    }
}

impl Settings {
    /// Load settings, reading a `.env` file first when one exists.
    ///
    /// `DISCORD_TOKEN` is required; `TICKET_CONFIG_PATH` and
    /// `TICKET_CLOSE_DELAY_SECS` fall back to their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
        let config_path = env::var("TICKET_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let close_delay_secs = match env::var("TICKET_CLOSE_DELAY_SECS") {
            Ok(raw) => parse_delay_secs(&raw)?,
            Err(_) => DEFAULT_CLOSE_DELAY_SECS,
        };

        Ok(Self {
            discord_token,
            config_path,
            tickets: TicketSettings {
                close_delay: Duration::from_secs(close_delay_secs),
            },
        })
    }
}

fn parse_delay_secs(raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("TICKET_CLOSE_DELAY_SECS must be whole seconds, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_close_delay_is_five_seconds() {
        assert_eq!(
            TicketSettings::default().close_delay,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn delay_must_be_whole_seconds() {
        assert_eq!(parse_delay_secs(" 12 ").expect("valid"), 12);
        assert!(parse_delay_secs("1.5").is_err());
        assert!(parse_delay_secs("soon").is_err());
    }
}
