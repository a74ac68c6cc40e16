use std::sync::Arc;

use ace_utils::components::ComponentRuntime;

/// Voice-channel party ownership.
pub mod party;
/// Environment-driven process configuration.
pub mod settings;
/// Usage counters behind `!info`.
pub mod stats;

pub use party::PartyChannels;
pub use settings::Settings;
pub use stats::BotStats;

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    pub components: ComponentRuntime,
    pub settings: Arc<Settings>,
    pub stats: Arc<BotStats>,
    pub party: Arc<PartyChannels>,
}

impl Context {
    /// Create a new application context with empty stats and party state.
    pub fn new(components: ComponentRuntime, settings: Settings) -> Self {
        Self {
            components,
            settings: Arc::new(settings),
            stats: Arc::new(BotStats::new()),
            party: Arc::new(PartyChannels::new()),
        }
    }
}
