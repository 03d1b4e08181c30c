use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whole settings document as stored on disk.
///
/// Keys other than `servers` belong to other bot features sharing the file
/// and are written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub servers: BTreeMap<String, GuildConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    /// Ticket settings for a guild, or an empty record when none exist yet.
    pub fn guild(&self, guild_id: u64) -> GuildConfig {
        self.servers
            .get(&guild_id.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Mutable ticket settings for a guild, created on first access.
    pub fn guild_mut(&mut self, guild_id: u64) -> &mut GuildConfig {
        self.servers.entry(guild_id.to_string()).or_default()
    }
}

/// Per-guild ticket settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_category_id: Option<u64>,
    #[serde(default)]
    pub staff_role_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_channel_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of applying a settings mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Change {
    Applied,
    /// The record already had the requested value.
    Unchanged,
}

impl Change {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl GuildConfig {
    pub fn is_staff_role(&self, role_id: u64) -> bool {
        self.staff_role_ids.contains(&role_id)
    }

    pub fn set_ticket_category(&mut self, category_id: u64) -> Change {
        replace(&mut self.ticket_category_id, Some(category_id))
    }

    pub fn add_staff_role(&mut self, role_id: u64) -> Change {
        if self.is_staff_role(role_id) {
            return Change::Unchanged;
        }

        self.staff_role_ids.push(role_id);
        Change::Applied
    }

    pub fn remove_staff_role(&mut self, role_id: u64) -> Change {
        let before = self.staff_role_ids.len();
        self.staff_role_ids.retain(|id| *id != role_id);

        if self.staff_role_ids.len() == before {
            Change::Unchanged
        } else {
            Change::Applied
        }
    }

    pub fn set_transcript_channel(&mut self, channel_id: u64) -> Change {
        replace(&mut self.transcript_channel_id, Some(channel_id))
    }

    pub fn clear_transcript_channel(&mut self) -> Change {
        replace(&mut self.transcript_channel_id, None)
    }
}

fn replace(slot: &mut Option<u64>, value: Option<u64>) -> Change {
    if *slot == value {
        return Change::Unchanged;
    }

    *slot = value;
    Change::Applied
}
