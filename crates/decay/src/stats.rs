use std::fmt;

/// Streaming max/mean/variance over integer samples (Welford's method).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    max: u64,
}

impl RunningStats {
    pub fn update(&mut self, sample: u64) {
        self.count += 1;
        self.max = self.max.max(sample);
        let x = sample as f64;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; zero until there are two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

/// Per-cycle decay counters and their aggregates across cycles.
#[derive(Debug, Clone, Default)]
pub struct DecayStatistics {
    pub decayed: RunningStats,
    pub active: RunningStats,
    cycle_decayed: u64,
    cycle_active: u64,
}

impl DecayStatistics {
    pub fn record_decayed(&mut self, n: u64) {
        self.cycle_decayed += n;
    }

    pub fn record_active(&mut self, n: u64) {
        self.cycle_active += n;
    }

    /// `(decayed, active)` counted so far in the running cycle.
    pub fn cycle_counts(&self) -> (u64, u64) {
        (self.cycle_decayed, self.cycle_active)
    }

    /// Fold the running cycle into the aggregates and reset its counters.
    pub fn finish_cycle(&mut self) {
        self.decayed.update(self.cycle_decayed);
        self.active.update(self.cycle_active);
        self.cycle_decayed = 0;
        self.cycle_active = 0;
    }
}

impl fmt::Display for DecayStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "decayed: max {} mean {:.2} variance {:.2} runs {} | active: max {} mean {:.2} variance {:.2} runs {}",
            self.decayed.max(),
            self.decayed.mean(),
            self.decayed.variance(),
            self.decayed.count(),
            self.active.max(),
            self.active.mean(),
            self.active.variance(),
            self.active.count(),
        )
    }
}
