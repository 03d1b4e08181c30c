/// Embed styling shared across ticket messages.
pub mod embed;
/// Interaction response and component helpers.
pub mod interaction;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers and ticket channel naming.
pub mod parse;
/// Permission overwrites and permission checks.
pub mod permissions;
/// Transcript rendering.
pub mod transcript;
