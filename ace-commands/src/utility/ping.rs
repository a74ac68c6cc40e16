use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use ace_core::Context;
use ace_utils::errors::InteractionError;
use ace_utils::transport::OutgoingMessage;

pub const META: CommandMeta = CommandMeta {
    name: "ping",
    aliases: &[],
    desc: "Replies with Pong!",
    category: "utility",
    usage: "!ping",
};

/// Send a simple connectivity response.
pub async fn run(ctx: &Context, msg: &MessageCreate) -> Result<(), InteractionError> {
    ctx.components
        .transport()
        .send_message(msg.channel_id, &OutgoingMessage::text("Pong!"))
        .await?;

    Ok(())
}
