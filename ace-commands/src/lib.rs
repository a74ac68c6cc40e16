pub mod party;
pub mod utility;

use std::sync::Arc;

use tracing::debug;
use twilight_model::gateway::payload::incoming::{InteractionCreate, MessageCreate, VoiceStateUpdate};

use ace_core::Context;
use ace_utils::COMMAND_PREFIX;
use ace_utils::components::InteractionContext;
use ace_utils::errors::InteractionError;
use ace_utils::router::CommandOrigin;

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    utility::info::META,
    utility::charinfo::META,
    party::META,
    // Add new commands here
];

/// Resolve a command name or alias to its canonical name.
pub fn resolve_command(name: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .find(|command| command.name == name || command.aliases.contains(&name))
        .map(|command| command.name)
}

/// A prefixed command line split into name, first argument and the rest.
#[derive(Debug, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub name: String,
    pub arg1: Option<&'a str>,
    /// Everything after the command name, untouched.
    pub rest: Option<&'a str>,
}

pub fn parse_invocation(content: &str) -> Option<Invocation<'_>> {
    let content = content.trim().strip_prefix(COMMAND_PREFIX)?.trim_start();

    let mut command_and_rest = content.splitn(2, char::is_whitespace);
    let name = command_and_rest.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let rest = command_and_rest
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let arg1 = rest.and_then(|value| value.split_whitespace().next());

    Some(Invocation { name, arg1, rest })
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let Some(invocation) = parse_invocation(&msg.content) else {
        return Ok(());
    };
    let Some(command) = resolve_command(&invocation.name) else {
        return Ok(());
    };

    let result: Result<(), InteractionError> = match command {
        "ping" => utility::ping::run(&ctx, &msg).await,
        "help" => utility::help::run(&ctx, &msg, invocation.arg1).await,
        "info" => utility::info::run(&ctx, &msg).await,
        "charinfo" => utility::charinfo::run(&ctx, &msg, invocation.rest).await,
        "party" => party::run(&ctx, &msg, invocation.arg1).await,
        // Add new commands here
        _ => return Ok(()),
    };

    match result {
        Ok(()) => ctx.stats.record_command(command).await,
        Err(error) => {
            let origin = CommandOrigin {
                command: command.to_owned(),
                channel_id: msg.channel_id,
                message_id: msg.id,
                invoker: msg.author.id,
            };
            ctx.components
                .router()
                .report_command_error(&ctx.components, error, &origin)
                .await;
        }
    }

    Ok(())
}

pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<()> {
    let transport = Arc::clone(ctx.components.transport());
    let Some(component) = InteractionContext::from_interaction(transport, &interaction) else {
        return Ok(());
    };

    let custom_id = component.custom_id().to_owned();
    if !ctx.components.dispatch(component).await {
        debug!(%custom_id, "component interaction not owned by any view");
    }

    Ok(())
}

pub async fn handle_voice_state(ctx: Context, update: Box<VoiceStateUpdate>) -> anyhow::Result<()> {
    if let Some(change) = ctx
        .party
        .voice_state_update(update.user_id, update.channel_id)
        .await
    {
        debug!(?change, user = update.user_id.get(), "party state changed");
    }

    Ok(())
}
