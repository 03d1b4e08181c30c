//! Flat text rendering of a ticket channel's history.

use chrono::{DateTime, Utc};

use ticket_core::model::{HistoryMessage, MemberInfo};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 50;

/// Rendered transcript: a header block plus one entry per message.
#[derive(Clone, Debug, PartialEq)]
pub struct Transcript {
    pub header: Vec<String>,
    pub entries: Vec<String>,
}

impl Transcript {
    /// Render a channel history (oldest first) with its header.
    ///
    /// `opener` is `None` when the ticket opener could not be resolved.
    pub fn build(
        channel_name: &str,
        opener: Option<&MemberInfo>,
        created_at: DateTime<Utc>,
        closed_at: DateTime<Utc>,
        history: &[HistoryMessage],
    ) -> Self {
        let opener_line = match opener {
            Some(member) => format!("User: {} ({})", member.display_name, member.handle),
            None => "User: unknown".to_owned(),
        };

        let header = vec![
            format!("Ticket transcript: {channel_name}"),
            opener_line,
            format!("Created: {}", format_timestamp(created_at)),
            format!("Closed: {}", format_timestamp(closed_at)),
            "=".repeat(RULE_WIDTH),
        ];

        Self {
            header,
            entries: history.iter().map(render_message).collect(),
        }
    }

    /// Attachment filename for a ticket channel's transcript.
    pub fn filename(channel_name: &str) -> String {
        format!("transcript-{channel_name}.txt")
    }

    pub fn render(&self) -> String {
        let mut out = self.header.join("\n");
        out.push_str("\n\n");
        out.push_str(&self.entries.join("\n"));
        out
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `[timestamp] display (handle): content [Embed: ...] [Attachment: ...]`
fn render_message(message: &HistoryMessage) -> String {
    let mut parts = Vec::with_capacity(1 + message.embeds.len() * 2 + message.attachments.len());

    parts.push(if message.content.trim().is_empty() {
        "[No content]".to_owned()
    } else {
        flatten(&message.content)
    });

    for embed in &message.embeds {
        if let Some(title) = embed.title.as_deref().filter(|title| !title.is_empty()) {
            parts.push(format!("[Embed: {}]", flatten(title)));
        }
        if let Some(description) = embed.description.as_deref().filter(|text| !text.is_empty()) {
            parts.push(flatten(description));
        }
    }

    parts.extend(
        message
            .attachments
            .iter()
            .map(|filename| format!("[Attachment: {filename}]")),
    );

    format!(
        "[{}] {} ({}): {}",
        format_timestamp(message.timestamp),
        message.author.display_name,
        message.author.handle,
        parts.join(" ")
    )
}

/// Keep each message on one line.
///
/// Trailing whitespace and blank lines are dropped, the remaining lines are
/// joined with ` | `.
fn flatten(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
