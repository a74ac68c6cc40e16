use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::{COMMANDS, CommandMeta};
use ace_core::Context;
use ace_utils::errors::{InteractionError, Precondition};
use ace_utils::pagination::{PaginatorSession, clamp_page, parse_one_based_page};

pub const META: CommandMeta = CommandMeta {
    name: "help",
    aliases: &["h", "commands"],
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [page]",
};

const HELP_LINES_PER_PAGE: usize = 10;
const HELP_HEADER: &str = "__**Available commands**__\n";

/// Page through the command catalog, starting at the requested page.
pub async fn run(ctx: &Context, msg: &MessageCreate, arg1: Option<&str>) -> Result<(), InteractionError> {
    let Some(requested_page) = parse_one_based_page(arg1) else {
        return Err(InteractionError::precondition(Precondition::Custom(format!(
            "`{}` is not a page number",
            arg1.unwrap_or_default()
        ))));
    };

    let session = help_session(requested_page);
    session
        .start(
            &ctx.components,
            msg.author.id,
            ctx.settings.view_timeout,
            msg.channel_id,
            Some(msg.id),
        )
        .await?;

    Ok(())
}

/// Catalog session positioned on `page` (one-based, clamped).
pub fn help_session(page: usize) -> PaginatorSession {
    let mut session = PaginatorSession::paginate(help_lines(), HELP_HEADER, "", HELP_LINES_PER_PAGE);

    let page = clamp_page(page, session.pages().len());
    for _ in 1..page {
        session.next();
    }

    session
}

/// One header line per category followed by its commands, both sorted.
pub fn help_lines() -> Vec<String> {
    let mut commands: Vec<&CommandMeta> = COMMANDS.iter().collect();
    commands.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    let mut lines = Vec::with_capacity(commands.len() * 2);
    let mut current_category = None;
    for command in commands {
        if current_category != Some(command.category) {
            current_category = Some(command.category);
            lines.push(format!("**{}**", command.category));
        }

        let aliases = if command.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aka {})", command.aliases.join(", "))
        };
        lines.push(format!("`{}` {}{aliases}", command.usage, command.desc));
    }

    lines
}
