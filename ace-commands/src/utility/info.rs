use std::sync::Arc;

use twilight_model::{
    channel::message::{component::ButtonStyle, embed::Embed},
    gateway::payload::incoming::MessageCreate,
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use crate::{COMMANDS, CommandMeta};
use ace_core::Context;
use ace_core::stats::{BotStats, StatsSnapshot, format_duration};
use ace_utils::components::{
    AuthorizedComponent, ButtonPolicy, ComponentAction, ComponentRuntime, InteractionContext,
    ReplyView, callback,
};
use ace_utils::embed::DEFAULT_EMBED_COLOR;
use ace_utils::errors::InteractionError;
use ace_utils::transport::OutgoingMessage;

pub const META: CommandMeta = CommandMeta {
    name: "info",
    aliases: &["stats", "about"],
    desc: "Statistics for nerds.",
    category: "utility",
    usage: "!info",
};

pub const REFRESH_DENIED: &str = "Only the owner can refresh stats manually";

const MEDALS: [&str; 5] = ["🥇", "🥈", "🥉", "🏅", "🏅"];
const INDENT: &str = "\u{2800} ";

/// Post the stats embed with "See more", owner-only "Refresh" and "Quit".
pub async fn run(ctx: &Context, msg: &MessageCreate) -> Result<(), InteractionError> {
    let runtime = &ctx.components;
    let snapshot = ctx.stats.snapshot().await;
    let embed = stats_embed(&snapshot, runtime.live_views().await)?;

    let mut view = ReplyView::new(ctx.settings.view_timeout, msg.author.id);

    let stats = Arc::clone(&ctx.stats);
    view.add(AuthorizedComponent::public(
        ButtonPolicy::new("See more").style(ButtonStyle::Primary),
        ComponentAction::Callback(callback(move |interaction: InteractionContext| {
            let stats = Arc::clone(&stats);
            async move { show_more(&stats, &interaction).await }
        })),
    ))?;

    let stats = Arc::clone(&ctx.stats);
    let refresh_runtime = runtime.clone();
    view.add(AuthorizedComponent::bind(
        ctx.settings.owner_id,
        ButtonPolicy::new("Refresh").denial_reason(REFRESH_DENIED),
        ComponentAction::Callback(callback(move |interaction: InteractionContext| {
            let stats = Arc::clone(&stats);
            let runtime = refresh_runtime.clone();
            async move { refresh(&stats, &runtime, &interaction).await }
        })),
    ))?;

    view.add(AuthorizedComponent::quit(msg.author.id))?;

    runtime
        .send(
            view,
            msg.channel_id,
            OutgoingMessage::embed(embed).replying_to(msg.id),
        )
        .await?;

    Ok(())
}

async fn show_more(stats: &BotStats, interaction: &InteractionContext) -> Result<(), InteractionError> {
    let embed = details_embed(&stats.snapshot().await)?;
    interaction.reply(OutgoingMessage::embed(embed), true).await?;
    Ok(())
}

async fn refresh(
    stats: &BotStats,
    runtime: &ComponentRuntime,
    interaction: &InteractionContext,
) -> Result<(), InteractionError> {
    let snapshot = stats.refresh().await;
    let embed = stats_embed(&snapshot, runtime.live_views().await)?;
    interaction.update_message(OutgoingMessage::embed(embed)).await
}

pub fn stats_embed(snapshot: &StatsSnapshot, live_views: usize) -> anyhow::Result<Embed> {
    let embed = EmbedBuilder::new()
        .title("📊 Statistics")
        .color(DEFAULT_EMBED_COLOR)
        .description(format!("{INDENT}servers: `{}`", snapshot.guilds))
        .field(
            EmbedFieldBuilder::new(
                "Timestamps",
                format!("{INDENT}uptime: `{}`", format_duration(snapshot.uptime)),
            )
            .build(),
        )
        .field(
            EmbedFieldBuilder::new(
                "Code statistics",
                format!(
                    "{INDENT}commands: `{}`\n{INDENT}commands ran: `{}`",
                    COMMANDS.len(),
                    snapshot.total_runs
                ),
            )
            .build(),
        )
        .field(
            EmbedFieldBuilder::new(
                "Process",
                format!(
                    "{INDENT}pid: `{}`\n{INDENT}live views: `{live_views}`",
                    std::process::id()
                ),
            )
            .build(),
        )
        .footer(EmbedFooterBuilder::new("Made with twilight").build())
        .validate()?
        .build();

    Ok(embed)
}

pub fn details_embed(snapshot: &StatsSnapshot) -> anyhow::Result<Embed> {
    let ranking = if snapshot.top_commands.is_empty() {
        format!("{INDENT}`nothing ran yet`")
    } else {
        snapshot
            .top_commands
            .iter()
            .zip(MEDALS)
            .map(|((command, runs), medal)| format!("{INDENT}{medal} {command}: `{runs}`"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = EmbedBuilder::new()
        .color(DEFAULT_EMBED_COLOR)
        .field(
            EmbedFieldBuilder::new(
                "Top commands",
                format!("{ranking}\n\n{INDENT}Total ran: `{}`", snapshot.total_runs),
            )
            .build(),
        )
        .validate()?
        .build();

    Ok(embed)
}
