use realmkeep_common::GameTime;
use serde::{Deserialize, Serialize};

/// Decay scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Delay, in game seconds, applied to an object whose decay was refused.
    pub cooldown_secs: GameTime,
    /// Track per-cycle active/decayed counters and log aggregates.
    pub statistics: bool,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 10 * 60,
            statistics: true,
        }
    }
}
