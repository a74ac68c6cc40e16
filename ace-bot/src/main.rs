use std::sync::Arc;

use tracing::{error, info};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::gateway::event::Event;

use rustls::crypto::ring::default_provider;

use ace_commands::{handle_interaction, handle_message, handle_voice_state};
use ace_core::{Context, Settings};
use ace_utils::components::ComponentRuntime;
use ace_utils::transport::TwilightTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Reads .env, then the process environment
    let settings = Settings::from_env()?;
    let token = settings.token.clone();

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(token.clone()));
    let transport = Arc::new(TwilightTransport::new(http));
    let components = ComponentRuntime::new(transport, settings.error_router());
    let ctx = Context::new(components, settings);

    // Declare which intents the bot has
    let intents = Intents::GUILDS
        | Intents::GUILD_MESSAGES
        | Intents::MESSAGE_CONTENT
        | Intents::GUILD_VOICE_STATES;

    // A shard is one Gateway WebSocket connection to Discord
    let mut shard = Shard::new(ShardId::new(0, 1), token, intents);

    info!("Ace is connecting...");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        match event {
            Event::Ready(ready) => {
                for guild in &ready.guilds {
                    ctx.stats.guild_available(guild.id).await;
                }
                info!(user = %ready.user.name, guilds = ready.guilds.len(), "Ace is ready");
            }
            Event::GuildCreate(guild) => {
                ctx.stats.guild_available(guild.id()).await;
            }
            Event::GuildDelete(guild) => {
                ctx.stats.guild_removed(guild.id).await;
            }
            Event::MessageCreate(msg) => {
                // Handlers run off the gateway loop
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, "message handler failed");
                    }
                });
            }
            Event::InteractionCreate(interaction) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_interaction(ctx, interaction).await {
                        error!(?source, "interaction handler failed");
                    }
                });
            }
            Event::VoiceStateUpdate(update) => {
                if let Err(source) = handle_voice_state(ctx.clone(), update).await {
                    error!(?source, "voice state handler failed");
                }
            }
            _ => {} // Ignore unused events
        }
    }

    Ok(()) // Return Success, shutdown cleanly
}
