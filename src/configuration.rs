//! Config for the pilot behaviors
//!
//! This module provides the tunables of a running pilot: turn deadline, navigation limits and
//! logging.
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Numbers that fail to parse fall back to the default. Set a flag to
//! `"true"` (case-insensitive) to enable it.
//!
//! - `PILOT_TURN_CEILING_MS` - Hard ceiling for one turn, in milliseconds (default: `1900`)
//! - `PILOT_PER_UNIT_MICROS` - Budget reserved per own unit, in microseconds (default: `1000`)
//! - `PILOT_NAVIGATION_CUTOFF_MS` - Time after which navigation stops searching (default: `1200`)
//! - `PILOT_MAX_CORRECTIONS` - Heading corrections tried on a blocked path (default: `180`)
//! - `PILOT_ANGULAR_STEP` - Degrees added per correction (default: `1`)
//! - `PILOT_SPEED` - Maximum thrust per turn (default: `7`)
//! - `PILOT_LOG` - Enable logging to a file (default: `true`)

use std::{env, time::Duration};

/// Configuration for pilot behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) turn_ceiling: Duration,
    pub(crate) per_unit_allowance: Duration,
    pub(crate) navigation_cutoff: Duration,
    pub(crate) max_corrections: usize,
    pub(crate) angular_step: u32,
    pub(crate) speed: u32,
    pub(crate) log: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - A turn may last at most 1.9s, minus 1ms for each own unit.
    /// - Navigation stops searching for a heading after 1.2s.
    /// - Up to 180 corrections of 1 degree are tried around an obstacle.
    /// - Units thrust at speed 7.
    /// - Logging to file is enabled.
    pub fn new() -> Self {
        Self {
            turn_ceiling: Duration::from_millis(1900),
            per_unit_allowance: Duration::from_millis(1),
            navigation_cutoff: Duration::from_millis(1200),
            max_corrections: 180,
            angular_step: 1,
            speed: 7,
            log: true,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the [module documentation](self) for the recognized variables. Any unset or invalid
    /// value results in the default for that field.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn parse_usize(var: &str) -> Option<usize> {
            env::var(var).ok()?.parse().ok()
        }

        fn parse_u32(var: &str) -> Option<u32> {
            env::var(var).ok()?.parse().ok()
        }

        fn parse_duration_millis(var: &str) -> Option<Duration> {
            env::var(var)
                .ok()?
                .parse::<u64>()
                .ok()
                .map(Duration::from_millis)
        }

        fn parse_duration_micros(var: &str) -> Option<Duration> {
            env::var(var)
                .ok()?
                .parse::<u64>()
                .ok()
                .map(Duration::from_micros)
        }

        let default = Self::new();
        Self {
            turn_ceiling: parse_duration_millis("PILOT_TURN_CEILING_MS")
                .unwrap_or(default.turn_ceiling),
            per_unit_allowance: parse_duration_micros("PILOT_PER_UNIT_MICROS")
                .unwrap_or(default.per_unit_allowance),
            navigation_cutoff: parse_duration_millis("PILOT_NAVIGATION_CUTOFF_MS")
                .unwrap_or(default.navigation_cutoff),
            max_corrections: parse_usize("PILOT_MAX_CORRECTIONS")
                .unwrap_or(default.max_corrections),
            angular_step: parse_u32("PILOT_ANGULAR_STEP")
                .filter(|step| *step > 0)
                .unwrap_or(default.angular_step),
            speed: parse_u32("PILOT_SPEED").unwrap_or(default.speed),
            log: get_env_flag("PILOT_LOG", default.log),
        }
    }

    /// Time left for a turn when `unit_count` own units need orders.
    ///
    /// Saturates at zero for very large fleets.
    pub fn turn_budget(&self, unit_count: usize) -> Duration {
        let reserved = self
            .per_unit_allowance
            .saturating_mul(u32::try_from(unit_count).unwrap_or(u32::MAX));
        self.turn_ceiling.saturating_sub(reserved)
    }

    /// Set the hard ceiling of a turn.
    pub fn with_turn_ceiling(mut self, value: Duration) -> Self {
        self.turn_ceiling = value;
        self
    }

    /// Set the time reserved for each own unit.
    pub fn with_per_unit_allowance(mut self, value: Duration) -> Self {
        self.per_unit_allowance = value;
        self
    }

    /// Set the time after which navigation gives up searching.
    pub fn with_navigation_cutoff(mut self, value: Duration) -> Self {
        self.navigation_cutoff = value;
        self
    }

    /// Set how many corrected headings are tried around an obstacle.
    pub fn with_max_corrections(mut self, value: usize) -> Self {
        self.max_corrections = value;
        self
    }

    /// Set the number of degrees per correction. Zero is raised to one.
    pub fn with_angular_step(mut self, value: u32) -> Self {
        self.angular_step = value.max(1);
        self
    }

    /// Set the thrust used when a path is clear.
    pub fn with_speed(mut self, value: u32) -> Self {
        self.speed = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Hard ceiling of a turn.
    pub fn turn_ceiling(&self) -> Duration {
        self.turn_ceiling
    }

    /// Time after which navigation gives up searching.
    pub fn navigation_cutoff(&self) -> Duration {
        self.navigation_cutoff
    }

    /// Maximum thrust.
    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Whether logs are written to a file.
    pub fn log(&self) -> bool {
        self.log
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
