/// Owner-gated message components, their containers and the runtime driving them.
pub mod components;
/// Generic embed builders shared across commands.
pub mod embed;
/// Classified failures raised by component callbacks.
pub mod errors;
/// Long-content pagination and the reply helper.
pub mod pagination;
/// Local path scrubbing for outgoing diagnostics.
pub mod redact;
/// Failure routing to invokers and the bot owner.
pub mod router;
/// Messaging boundary over the chat client.
pub mod transport;

/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
