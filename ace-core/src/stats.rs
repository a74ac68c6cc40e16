use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use tokio::{sync::Mutex, time::Instant};
use twilight_model::id::{Id, marker::GuildMarker};

/// How long a stats snapshot is served before being recomputed.
pub const SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(300);
/// Number of entries in the "top commands" ranking.
pub const TOP_COMMANDS: usize = 5;

/// Point-in-time view of the counters, as shown by `!info`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatsSnapshot {
    pub taken_at: Instant,
    pub uptime: Duration,
    pub guilds: usize,
    pub total_runs: u64,
    /// Most used commands, most runs first; ties broken by name.
    pub top_commands: Vec<(String, u64)>,
}

/// Process-lifetime usage counters.
#[derive(Debug)]
pub struct BotStats {
    started: Instant,
    runs: Mutex<HashMap<String, u64>>,
    guilds: Mutex<HashSet<Id<GuildMarker>>>,
    snapshot: Mutex<Option<StatsSnapshot>>,
}

impl BotStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            runs: Mutex::new(HashMap::new()),
            guilds: Mutex::new(HashSet::new()),
            snapshot: Mutex::new(None),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Count one completed run of `command`.
    pub async fn record_command(&self, command: &str) {
        *self.runs.lock().await.entry(command.to_owned()).or_default() += 1;
    }

    pub async fn runs_of(&self, command: &str) -> u64 {
        self.runs.lock().await.get(command).copied().unwrap_or_default()
    }

    pub async fn guild_available(&self, guild_id: Id<GuildMarker>) {
        self.guilds.lock().await.insert(guild_id);
    }

    pub async fn guild_removed(&self, guild_id: Id<GuildMarker>) {
        self.guilds.lock().await.remove(&guild_id);
    }

    /// Cached snapshot, recomputed once older than [`SNAPSHOT_MAX_AGE`].
    pub async fn snapshot(&self) -> StatsSnapshot {
        let mut cached = self.snapshot.lock().await;
        if let Some(snapshot) = cached.as_ref()
            && snapshot.taken_at.elapsed() < SNAPSHOT_MAX_AGE
        {
            return snapshot.clone();
        }

        let fresh = self.compute().await;
        *cached = Some(fresh.clone());
        fresh
    }

    /// Recompute the snapshot regardless of its age.
    pub async fn refresh(&self) -> StatsSnapshot {
        let fresh = self.compute().await;
        *self.snapshot.lock().await = Some(fresh.clone());
        fresh
    }

    async fn compute(&self) -> StatsSnapshot {
        let guilds = self.guilds.lock().await.len();

        let runs = self.runs.lock().await;
        let total_runs = runs.values().sum();
        let mut top_commands: Vec<(String, u64)> = runs
            .iter()
            .map(|(command, count)| (command.clone(), *count))
            .collect();
        top_commands.sort_unstable_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
        top_commands.truncate(TOP_COMMANDS);

        StatsSnapshot {
            taken_at: Instant::now(),
            uptime: self.uptime(),
            guilds,
            total_runs,
            top_commands,
        }
    }
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

/// `1d 2h 3m 4s` style rendering, omitting leading zero units.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );

    let units = [(days, "d"), (hours, "h"), (minutes, "m")];
    let mut out: Vec<String> = units
        .into_iter()
        .skip_while(|(value, _)| *value == 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();
    out.push(format!("{seconds}s"));
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_cached_until_it_ages_out() {
        let stats = BotStats::new();
        stats.record_command("ping").await;

        let first = stats.snapshot().await;
        assert_eq!(first.total_runs, 1);

        stats.record_command("ping").await;
        assert_eq!(stats.snapshot().await, first);

        tokio::time::advance(SNAPSHOT_MAX_AGE).await;
        assert_eq!(stats.snapshot().await.total_runs, 2);
    }

    #[tokio::test]
    async fn refresh_bypasses_the_cache() {
        let stats = BotStats::new();
        stats.snapshot().await;
        stats.guild_available(Id::new(1)).await;
        stats.guild_available(Id::new(2)).await;
        stats.guild_removed(Id::new(1)).await;

        assert_eq!(stats.snapshot().await.guilds, 0);
        assert_eq!(stats.refresh().await.guilds, 1);
    }

    #[tokio::test]
    async fn top_commands_are_ranked() {
        let stats = BotStats::new();
        for command in ["help", "ping", "ping", "info", "ping", "help"] {
            stats.record_command(command).await;
        }

        let snapshot = stats.refresh().await;
        assert_eq!(
            snapshot.top_commands,
            vec![
                ("ping".to_owned(), 3),
                ("help".to_owned(), 2),
                ("info".to_owned(), 1),
            ]
        );
        assert_eq!(stats.runs_of("ping").await, 3);
        assert_eq!(stats.runs_of("party").await, 0);
    }

    #[test]
    fn durations_drop_leading_zero_units() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1h 2m 5s");
        assert_eq!(format_duration(Duration::from_secs(90_061)), "1d 1h 1m 1s");
        assert_eq!(format_duration(Duration::from_secs(86_400)), "1d 0h 0m 0s");
    }
}
