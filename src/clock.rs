// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Economic Clock

use serde::{Deserialize, Serialize};

/// Turns caller-supplied elapsed time into whole simulated days.
///
/// The clock never reads wall time itself: the owner passes "seconds since
/// start" on every poll, which keeps stepping deterministic under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicClock {
    day_duration: f64,
    last_reward_time: f64,
    day: u64,
}

impl EconomicClock {
    pub fn new(day_duration: f64, start_time: f64) -> Self {
        Self {
            day_duration,
            last_reward_time: start_time,
            day: 0,
        }
    }

    pub fn day(&self) -> u64 { self.day }
    pub fn day_duration(&self) -> f64 { self.day_duration }
    pub fn last_reward_time(&self) -> f64 { self.last_reward_time }

    /// Whole days elapsed since the last consumed day boundary, at most
    /// `max_days`. Consumes them: the reference time moves forward by
    /// exactly `days * day_duration`, so fractional progress and any days
    /// past the cap stay pending for the next poll.
    pub fn take_due_days(&mut self, now: f64, max_days: u64) -> u64 {
        let elapsed = now - self.last_reward_time;
        if !elapsed.is_finite() || elapsed < self.day_duration || self.day_duration <= 0.0 {
            return 0;
        }
        // float to int casts saturate
        let days = ((elapsed / self.day_duration).floor() as u64).min(max_days);
        self.last_reward_time += days as f64 * self.day_duration;
        days
    }

    /// Advances the day counter and returns the new day index.
    pub fn begin_day(&mut self) -> u64 {
        self.day += 1;
        self.day
    }
}
