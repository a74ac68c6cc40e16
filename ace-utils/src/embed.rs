use twilight_model::channel::message::embed::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_54_30;
/// Color of owner-facing failure reports.
pub const DIAGNOSTIC_EMBED_COLOR: u32 = 0xE0_3C_31;
/// Platform cap on an embed description.
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Build a standard embed with consistent styling and an optional footer.
pub fn titled_embed(
    title: &str,
    description: impl Into<String>,
    footer: Option<&str>,
) -> anyhow::Result<Embed> {
    let builder = EmbedBuilder::new()
        .title(title)
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    let embed = match footer {
        Some(note) if !note.is_empty() => builder
            .footer(EmbedFooterBuilder::new(note).build())
            .validate()?
            .build(),
        _ => builder.validate()?.build(),
    };

    Ok(embed)
}

/// Owner-facing report: `report` is shown verbatim inside a code block.
///
/// Oversized reports keep their head and are marked as cut.
pub fn diagnostic_embed(title: &str, report: &str, footer: &str) -> anyhow::Result<Embed> {
    const FENCE: usize = "```\n\n```".len();
    const CUT_MARKER: &str = "\n[...]";

    let budget = EMBED_DESCRIPTION_LIMIT - FENCE;
    let body = if report.chars().count() > budget {
        let head: String = report
            .chars()
            .take(budget - CUT_MARKER.chars().count())
            .collect();
        format!("{head}{CUT_MARKER}")
    } else {
        report.to_owned()
    };

    let embed = EmbedBuilder::new()
        .title(title)
        .color(DIAGNOSTIC_EMBED_COLOR)
        .description(format!("```\n{body}\n```"))
        .footer(EmbedFooterBuilder::new(footer).build())
        .validate()?
        .build();

    Ok(embed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_reports_are_cut_to_the_description_limit() {
        let report = "x".repeat(10_000);
        let embed = diagnostic_embed("boom", &report, "Unhandled").unwrap();

        let description = embed.description.unwrap();
        assert!(description.chars().count() <= EMBED_DESCRIPTION_LIMIT);
        assert!(description.ends_with("[...]\n```"));
    }

    #[test]
    fn footer_is_optional() {
        let plain = titled_embed("Help", "body", None).unwrap();
        assert!(plain.footer.is_none());
        assert_eq!(plain.color, Some(DEFAULT_EMBED_COLOR));

        let noted = titled_embed("Help", "body", Some("Page 1/2")).unwrap();
        assert_eq!(noted.footer.unwrap().text, "Page 1/2");
    }
}
