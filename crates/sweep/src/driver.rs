use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use realmkeep_common::{GameClock, GameTime, RealmId, ZoneCoord};
use realmkeep_kernel::{DecayHooks, SpatialError, SweepReport, WorldState};
use serde::Serialize;

use crate::config::DriverConfig;
use crate::cursor::ZoneCursor;
use crate::shutdown::ShutdownSignal;

/// Driver failures.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no realm grids to sweep")]
    MissingRealmGrid,

    #[error("zone {zone} of realm {realm}: {count} consistency violation(s), first: {source}")]
    Violation {
        realm: RealmId,
        zone: ZoneCoord,
        count: usize,
        #[source]
        source: SpatialError,
    },
}

/// Result of sweeping one zone.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub realm: RealmId,
    pub zone: ZoneCoord,
    /// The previous step finished a full cycle.
    pub cycle_completed: bool,
    pub report: SweepReport,
}

/// Totals over the driver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverSummary {
    pub steps: u64,
    pub cycles: u64,
    pub destroyed: u64,
    pub violations: u64,
}

/// Visits one zone per step, round-robin across every realm.
#[derive(Debug)]
pub struct SweepDriver {
    config: DriverConfig,
    cursor: ZoneCursor,
    budget: Duration,
    summary: DriverSummary,
}

impl SweepDriver {
    /// Fails with [`DriverError::MissingRealmGrid`] when the world has no zones.
    pub fn new(config: DriverConfig, world: &WorldState) -> Result<Self, DriverError> {
        let cursor = match ZoneCursor::new(world) {
            Ok(cursor) => cursor,
            Err(err) => {
                tracing::error!(error = %err, "sweep driver not started");
                return Err(err);
            }
        };
        let budget = config.zone_budget(cursor.total_zones());
        tracing::info!(
            zones = cursor.total_zones(),
            budget_ms = budget.as_millis() as u64,
            period_ms = config.sweep_period_ms,
            "sweep driver configured"
        );
        Ok(Self {
            config,
            cursor,
            budget,
            summary: DriverSummary::default(),
        })
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn summary(&self) -> DriverSummary {
        self.summary
    }

    /// Advance to the next zone and sweep it at `now`.
    ///
    /// Closes the statistics cycle first when the cursor wrapped.
    pub fn step(
        &mut self,
        world: &mut WorldState,
        now: GameTime,
        hooks: &mut dyn DecayHooks,
    ) -> Result<StepOutcome, DriverError> {
        let step = self.cursor.advance();
        if step.wrapped {
            self.summary.cycles += 1;
            if world.decay_config().statistics {
                let stats = world.decay_statistics_mut();
                stats.finish_cycle();
                tracing::info!(cycle = self.summary.cycles, "decay statistics {stats}");
            }
        }

        let report = world.sweep_zone(step.realm, step.zone, now, hooks);
        self.summary.steps += 1;
        self.summary.destroyed += report.destroyed as u64;

        if let Some(first) = report.violations.first() {
            let count = report.violations.len();
            self.summary.violations += count as u64;
            if self.config.abort_on_violation {
                return Err(DriverError::Violation {
                    realm: step.realm,
                    zone: step.zone,
                    count,
                    source: first.clone(),
                });
            }
            tracing::warn!(
                realm = %step.realm,
                zone = %step.zone,
                count,
                "zone sweep hit consistency violations; continuing"
            );
        }

        Ok(StepOutcome {
            realm: step.realm,
            zone: step.zone,
            cycle_completed: step.wrapped,
            report,
        })
    }

    /// Sweep zones until `shutdown` is triggered.
    ///
    /// The world lock is held for a single zone at a time and released
    /// before sleeping.
    pub async fn run<H>(
        mut self,
        world: Arc<Mutex<WorldState>>,
        clock: Arc<dyn GameClock>,
        mut hooks: H,
        shutdown: ShutdownSignal,
    ) -> Result<DriverSummary, DriverError>
    where
        H: DecayHooks + Send,
    {
        tracing::info!(budget_ms = self.budget.as_millis() as u64, "sweep driver started");
        while !shutdown.is_triggered() {
            let outcome = {
                let mut world = world.lock();
                let now = clock.now();
                let _span = tracing::debug_span!("sweep_step", now).entered();
                self.step(&mut world, now, &mut hooks)
            };
            if let Err(err) = outcome {
                tracing::error!(error = %err, "sweep driver aborted");
                return Err(err);
            }
            tokio::time::sleep(self.budget).await;
        }
        tracing::info!(
            steps = self.summary.steps,
            cycles = self.summary.cycles,
            destroyed = self.summary.destroyed,
            "sweep driver stopped"
        );
        Ok(self.summary)
    }
}
