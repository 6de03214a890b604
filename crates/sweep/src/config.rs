use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Background sweep pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Wall time for one full pass over every zone of every realm.
    pub sweep_period_ms: u64,
    /// Lower bound on the pause between two zones.
    pub min_zone_budget_ms: u64,
    /// Stop the driver when a zone sweep reports an index inconsistency.
    pub abort_on_violation: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            sweep_period_ms: 10 * 60 * 1000,
            min_zone_budget_ms: 30,
            abort_on_violation: false,
        }
    }
}

impl DriverConfig {
    /// Pause between two zone sweeps so that `total_zones` zones take one period.
    pub fn zone_budget(&self, total_zones: usize) -> Duration {
        let per_zone = self
            .sweep_period_ms
            .checked_div(total_zones as u64)
            .unwrap_or(self.sweep_period_ms);
        Duration::from_millis(per_zone.max(self.min_zone_budget_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_splits_period_across_zones() {
        let config = DriverConfig::default();
        // 6144x4096 tiles at 64 tiles per zone.
        assert_eq!(config.zone_budget(96 * 64), Duration::from_millis(97));
        assert_eq!(config.zone_budget(1), Duration::from_millis(600_000));
    }

    #[test]
    fn budget_is_floored() {
        let config = DriverConfig::default();
        assert_eq!(config.zone_budget(100_000), Duration::from_millis(30));
        let tight = DriverConfig {
            sweep_period_ms: 0,
            min_zone_budget_ms: 1,
            ..DriverConfig::default()
        };
        assert_eq!(tight.zone_budget(4), Duration::from_millis(1));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: DriverConfig = serde_yaml::from_str("abort_on_violation: true").unwrap();
        assert!(config.abort_on_violation);
        assert_eq!(config.sweep_period_ms, 600_000);
    }
}
