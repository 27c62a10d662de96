//! Orders sent back to the engine.

use std::fmt;

use crate::entity::{ObjectiveId, UnitId};

/// A single order for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move `speed` units in direction `angle` (whole degrees).
    Thrust {
        /// Ordered unit.
        unit: UnitId,
        /// Whole-number speed.
        speed: u32,
        /// Direction in `[0, 360)`.
        angle: u32,
    },
    /// Start docking to `objective`.
    Dock {
        /// Ordered unit.
        unit: UnitId,
        /// Target objective.
        objective: ObjectiveId,
    },
    /// Leave the objective the unit is docked to.
    Undock {
        /// Ordered unit.
        unit: UnitId,
    },
}

impl Command {
    /// Builds a thrust order, truncating `speed` and wrapping `angle` into `[0, 360)`.
    pub fn thrust(unit: UnitId, speed: f64, angle: u32) -> Self {
        Command::Thrust {
            unit,
            speed: speed.max(0.0) as u32,
            angle: angle % 360,
        }
    }

    /// The unit this order is addressed to.
    pub fn unit(&self) -> UnitId {
        match *self {
            Command::Thrust { unit, .. } | Command::Dock { unit, .. } | Command::Undock { unit } => {
                unit
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Thrust { unit, speed, angle } => write!(f, "t {unit} {speed} {angle}"),
            Command::Dock { unit, objective } => write!(f, "d {unit} {objective}"),
            Command::Undock { unit } => write!(f, "u {unit}"),
        }
    }
}

/// Joins a turn's orders into the single line the engine expects (without the terminator).
pub fn serialize<C: fmt::Display>(commands: &[C]) -> String {
    commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
