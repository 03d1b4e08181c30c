//! Ticket lifecycle: open on the panel button, close on the in-ticket button.

pub mod close;
pub mod embeds;
pub mod open;

use ticket_core::PlatformError;
use ticket_store::StoreError;

/// Custom id of the panel's "Create Ticket" button.
pub const OPEN_TICKET_ID: &str = "ticket:open";
/// Custom id of the "Close Ticket" button posted in every ticket.
pub const CLOSE_TICKET_ID: &str = "ticket:close";

/// Failure inside a lifecycle step.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TicketError {
    /// Whether the platform refused the action for lack of permissions.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Platform(source) if source.is_forbidden())
    }
}
