use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use ace_core::Context;
use ace_utils::errors::{InteractionError, Precondition};
use ace_utils::pagination::{ReplyTarget, reply};

pub const META: CommandMeta = CommandMeta {
    name: "charinfo",
    aliases: &["char", "character"],
    desc: "Gets information on one or multiple characters; numbers are read as code points.",
    category: "utility",
    usage: "!charinfo <characters>",
};

const VARIATION_SELECTOR: char = '\u{FE0F}';
/// Decimal code points accepted in place of a literal character.
const CODE_POINT_RANGE: std::ops::RangeInclusive<u32> = 161..=55291;

/// One line per inspected character.
pub async fn run(ctx: &Context, msg: &MessageCreate, rest: Option<&str>) -> Result<(), InteractionError> {
    let Some(characters) = rest else {
        return Err(InteractionError::precondition(Precondition::Custom(format!(
            "Usage: `{}`",
            META.usage
        ))));
    };

    let lines = describe(characters);
    let content = if lines.is_empty() {
        "Nothing to convert".to_owned()
    } else {
        lines.join("\n")
    };

    reply(
        &ctx.components,
        ReplyTarget {
            channel_id: msg.channel_id,
            reply_to: Some(msg.id),
            principal: msg.author.id,
        },
        &content,
        "",
        "",
        ctx.settings.view_timeout,
    )
    .await?;

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Custom { raw: String, name: String },
    Char(Vec<char>),
}

/// Describe every non-trivial character of `input`.
///
/// Custom emojis (`<:name:id>`) are listed as such, runs of digits are read as
/// decimal code points, and ASCII letters and spaces are skipped.
pub fn describe(input: &str) -> Vec<String> {
    tokenize(input)
        .into_iter()
        .map(|token| match token {
            Token::Custom { raw, name } => format!("{raw} `:{name}:` custom emoji"),
            Token::Char(chars) => describe_char(&chars),
        })
        .collect()
}

fn describe_char(chars: &[char]) -> String {
    let literal: String = chars.iter().collect();
    let code_points = chars
        .iter()
        .map(|c| format!("U+{:04X}", u32::from(*c)))
        .collect::<Vec<_>>()
        .join(" ");
    let first = chars.first().map_or(0, |c| u32::from(*c));

    format!(
        "`{literal}` {code_points} #{first} <https://www.fileformat.info/info/unicode/char/{first:04x}/index.htm>"
    )
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        if c == '<'
            && let Some((raw, name)) = custom_emoji(rest)
        {
            tokens.push(Token::Custom {
                raw: raw.to_owned(),
                name: name.to_owned(),
            });
            rest = &rest[raw.len()..];
            continue;
        }

        if c.is_ascii_digit() {
            let digits = rest
                .find(|candidate: char| !candidate.is_ascii_digit())
                .unwrap_or(rest.len());
            if let Some(decoded) = rest[..digits]
                .parse::<u32>()
                .ok()
                .filter(|value| CODE_POINT_RANGE.contains(value))
                .and_then(char::from_u32)
            {
                tokens.push(Token::Char(vec![decoded]));
            }
            rest = &rest[digits..];
            continue;
        }

        rest = &rest[c.len_utf8()..];
        if c.is_ascii_alphabetic() || c.is_whitespace() {
            continue;
        }

        if c == VARIATION_SELECTOR
            && let Some(Token::Char(previous)) = tokens.last_mut()
        {
            previous.push(c);
            continue;
        }

        tokens.push(Token::Char(vec![c]));
    }

    tokens
}

/// `<:name:id>` or `<a:name:id>` at the start of `input`, with its name.
fn custom_emoji(input: &str) -> Option<(&str, &str)> {
    let end = input.find('>')?;
    let raw = &input[..=end];
    let inner = raw.strip_prefix('<')?.strip_suffix('>')?;

    let mut parts = inner.split(':');
    let animated = parts.next()?;
    let name = parts.next()?;
    let id = parts.next()?;

    let valid = (animated.is_empty() || animated == "a")
        && !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !id.is_empty()
        && id.chars().all(|c| c.is_ascii_digit())
        && parts.next().is_none();

    valid.then_some((raw, name))
}
