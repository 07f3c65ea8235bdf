//! Scheduler configuration.
//!
//! Time is measured in integer slots. `origin` and `horizon` bound every
//! activity; `time_step_minutes` gives the wall-clock length of one slot
//! and is used to convert periodic cost rates into per-slot rates.

use serde::{Deserialize, Serialize};

/// Direction in which the propagation cycle groups are ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Rank by successors (forward scheduling).
    #[default]
    Forward,
    /// Rank by predecessors (backward scheduling).
    Backward,
}

/// Scheduler configuration shared by the dataset, the manager and the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// First usable time slot.
    pub origin: i64,
    /// One past the last usable time slot.
    pub horizon: i64,
    /// Length of one slot in minutes.
    pub time_step_minutes: i64,
    /// Scheduling direction.
    pub direction: Direction,
    /// Step used when nudging release-time genes.
    pub release_step: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            origin: 0,
            horizon: 100_000,
            time_step_minutes: 60,
            direction: Direction::Forward,
            release_step: 1,
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the origin slot.
    pub fn with_origin(mut self, origin: i64) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the horizon slot.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the slot length in minutes (clamped to at least one minute).
    pub fn with_time_step(mut self, minutes: i64) -> Self {
        self.time_step_minutes = minutes.max(1);
        self
    }

    /// Sets the scheduling direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the release-time nudge step (clamped to at least one slot).
    pub fn with_release_step(mut self, step: i64) -> Self {
        self.release_step = step.max(1);
        self
    }

    /// Slots per hour (at least one).
    pub fn hour_slots(&self) -> i64 {
        (60 / self.time_step_minutes.max(1)).max(1)
    }

    /// Slots per day.
    pub fn day_slots(&self) -> i64 {
        self.hour_slots() * 24
    }

    /// Slots per week.
    pub fn week_slots(&self) -> i64 {
        self.day_slots() * 7
    }

    /// Slots per month (30 days).
    pub fn month_slots(&self) -> i64 {
        self.day_slots() * 30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_lengths() {
        let cfg = SchedulerConfig::new().with_time_step(15);
        assert_eq!(cfg.hour_slots(), 4);
        assert_eq!(cfg.day_slots(), 96);
        assert_eq!(cfg.week_slots(), 672);
        assert_eq!(cfg.month_slots(), 2880);
    }

    #[test]
    fn test_coarse_step_keeps_one_slot_per_hour() {
        let cfg = SchedulerConfig::new().with_time_step(240);
        assert_eq!(cfg.hour_slots(), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let cfg = SchedulerConfig::new()
            .with_origin(10)
            .with_horizon(500)
            .with_direction(Direction::Backward);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SchedulerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
