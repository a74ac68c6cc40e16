use std::{env, time::Duration};

use anyhow::Context as _;
use ace_utils::router::{ErrorRouter, OwnerTarget};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

/// Default inactivity timeout of command views.
pub const DEFAULT_VIEW_TIMEOUT_SECS: u64 = 180;
/// Default lifetime of precondition notices.
pub const DEFAULT_NOTICE_TTL_SECS: u64 = 10;

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub token: String,
    pub owner_id: Id<UserMarker>,
    /// Owner diagnostics go here when set, to the owner's direct messages otherwise.
    pub diagnostics_channel_id: Option<Id<ChannelMarker>>,
    pub view_timeout: Duration,
    pub notice_ttl: Duration,
    /// Extra path prefixes stripped from diagnostics.
    pub redact_prefixes: Vec<String>,
}

impl Settings {
    /// Load the `.env` file if present, then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let token = lookup("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
        let owner_id = lookup("OWNER_ID")
            .context("OWNER_ID is not set")
            .and_then(|raw| parse_id(&raw).context("OWNER_ID is not a valid user id"))?;

        let diagnostics_channel_id = match lookup("DIAGNOSTICS_CHANNEL_ID") {
            Some(raw) if !raw.trim().is_empty() => Some(
                parse_id(&raw).context("DIAGNOSTICS_CHANNEL_ID is not a valid channel id")?,
            ),
            _ => None,
        };

        let view_timeout = seconds(&lookup, "VIEW_TIMEOUT_SECS", DEFAULT_VIEW_TIMEOUT_SECS)?;
        let notice_ttl = seconds(&lookup, "NOTICE_TTL_SECS", DEFAULT_NOTICE_TTL_SECS)?;

        let redact_prefixes = lookup("REDACT_PATH_PREFIXES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|prefix| !prefix.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            token,
            owner_id,
            diagnostics_channel_id,
            view_timeout,
            notice_ttl,
            redact_prefixes,
        })
    }

    /// Error router configured for this process.
    pub fn error_router(&self) -> ErrorRouter {
        ErrorRouter::new(OwnerTarget {
            owner: self.owner_id,
            channel: self.diagnostics_channel_id,
        })
        .with_redact_prefixes(self.redact_prefixes.iter().cloned())
        .with_notice_ttl(self.notice_ttl)
    }
}

fn parse_id<T>(raw: &str) -> anyhow::Result<Id<T>> {
    let value = raw.trim().parse::<u64>()?;
    Id::new_checked(value).context("ids cannot be zero")
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a whole number of seconds")),
        None => Ok(Duration::from_secs(default)),
    }
}
