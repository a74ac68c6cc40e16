use std::sync::Arc;

use twilight_model::{
    channel::message::{component::ButtonStyle, embed::Embed},
    gateway::payload::incoming::MessageCreate,
    id::{Id, marker::ChannelMarker},
};

use crate::CommandMeta;
use ace_core::Context;
use ace_core::party::{Party, PartyChannels};
use ace_utils::components::{
    AuthorizedComponent, ButtonPolicy, ComponentAction, InteractionContext, ReplyView, callback,
};
use ace_utils::embed::titled_embed;
use ace_utils::errors::InteractionError;
use ace_utils::transport::OutgoingMessage;

pub const META: CommandMeta = CommandMeta {
    name: "party",
    aliases: &["vc", "voice"],
    desc: "An all-in-one menu for your own voice channel; `host` turns your channel into a party.",
    category: "utility",
    usage: "!party [host]",
};

/// `!party` shows the menu of the caller's party, `!party host` creates one.
pub async fn run(ctx: &Context, msg: &MessageCreate, arg1: Option<&str>) -> Result<(), InteractionError> {
    let party = match arg1.map(str::to_ascii_lowercase).as_deref() {
        Some("host") => ctx.party.host(msg.author.id).await?,
        _ => ctx.party.require_party(msg.author.id).await?,
    };

    let mut view = ReplyView::new(ctx.settings.view_timeout, msg.author.id);

    let parties = Arc::clone(&ctx.party);
    let channel_id = party.channel_id;
    view.add(AuthorizedComponent::public(
        ButtonPolicy::new("Claim").style(ButtonStyle::Success),
        ComponentAction::Callback(callback(move |interaction: InteractionContext| {
            let parties = Arc::clone(&parties);
            async move { claim(&parties, channel_id, &interaction).await }
        })),
    ))?;
    view.add(AuthorizedComponent::quit(msg.author.id))?;

    ctx.components
        .send(
            view,
            msg.channel_id,
            OutgoingMessage::embed(party_embed(&party)?).replying_to(msg.id),
        )
        .await?;

    Ok(())
}

async fn claim(
    parties: &PartyChannels,
    channel_id: Id<ChannelMarker>,
    interaction: &InteractionContext,
) -> Result<(), InteractionError> {
    let party = parties.claim(interaction.invoking_user(), channel_id).await?;

    interaction
        .update_message(OutgoingMessage::embed(party_embed(&party)?))
        .await?;
    interaction
        .respond(format!("You now own <#{}> !", party.channel_id), true)
        .await?;

    Ok(())
}

pub fn party_embed(party: &Party) -> anyhow::Result<Embed> {
    titled_embed(
        "🎉 Party",
        format!(
            ">>> channel: <#{}>\nowner: <@{}>\noccupants: `{}`",
            party.channel_id, party.owner, party.occupants
        ),
        Some("Claim the party once its owner has left"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_mentions_channel_and_owner() {
        let embed = party_embed(&Party {
            channel_id: Id::new(500),
            owner: Id::new(1),
            occupants: 3,
        })
        .unwrap();

        let description = embed.description.unwrap();
        assert!(description.contains("<#500>"));
        assert!(description.contains("<@1>"));
        assert!(description.contains("`3`"));
    }
}
