//! Monotonic turn deadline shared by the planning stages.

use std::time::{Duration, Instant};

use crate::configuration::Configuration;

/// Time budget of one turn, measured from the moment the state line was received.
#[derive(Debug, Clone, Copy)]
pub struct TurnClock {
    started: Instant,
    budget: Duration,
}

impl TurnClock {
    /// Starts a clock now with the given budget.
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Starts a clock now with the budget `config` grants a fleet of `unit_count` units.
    pub fn for_fleet(config: &Configuration, unit_count: usize) -> Self {
        Self::start(config.turn_budget(unit_count))
    }

    /// A clock that is already out of time.
    pub fn expired() -> Self {
        Self::start(Duration::ZERO)
    }

    /// Same start, budget capped at `limit`.
    pub fn with_limit(&self, limit: Duration) -> Self {
        Self {
            started: self.started,
            budget: self.budget.min(limit),
        }
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the budget runs out, zero once it has.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// True once the budget is spent.
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// The full budget.
    pub fn budget(&self) -> Duration {
        self.budget
    }
}
