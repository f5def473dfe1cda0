//! Reading-time contribution to progress

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// How elapsed reading time converts into progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingPolicy {
    /// Seconds of reading per step
    pub interval_secs: u64,
    /// Percentage points per completed interval
    pub step: u8,
    /// Highest percentage reading alone can reach
    pub ceiling: u8,
}

impl Default for ReadingPolicy {
    fn default() -> Self {
        Self { interval_secs: 60, step: 10, ceiling: 50 }
    }
}

impl ReadingPolicy {
    /// `min(floor(elapsed / interval) * step, ceiling)`
    pub fn contribution(&self, elapsed: Duration) -> u8 {
        let intervals = elapsed.as_secs() / self.interval_secs.max(1);
        let raw = intervals.saturating_mul(u64::from(self.step));
        raw.min(u64::from(self.ceiling)).min(100) as u8
    }
}

/// Measures how long one material has been open
#[derive(Debug, Clone)]
pub struct ReadingTimer {
    material_id: String,
    policy: ReadingPolicy,
    clock: Clock,
    started: Duration,
    reported: u8,
}

impl ReadingTimer {
    /// Start timing `material_id` from the clock's current reading
    pub fn start(material_id: impl Into<String>, policy: ReadingPolicy, clock: Clock) -> Self {
        let started = clock.now();
        Self { material_id: material_id.into(), policy, clock, started, reported: 0 }
    }

    /// Material being read
    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    /// Reading time so far
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    /// Current contribution
    pub fn contribution(&self) -> u8 {
        self.policy.contribution(self.elapsed())
    }

    /// The contribution, only when it grew since the last report
    pub fn tick(&mut self) -> Option<u8> {
        let current = self.contribution();
        if current > self.reported {
            self.reported = current;
            Some(current)
        } else {
            None
        }
    }

    /// Whether reading alone can add nothing more
    pub fn is_saturated(&self) -> bool {
        self.reported >= self.policy.ceiling
    }

    /// Move a manual clock forward
    pub fn advance(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }
}
