//! Collision-aware routing of one unit towards a point.
//!
//! The planner only reads the [`World`]. It tries the direct heading first, then a bounded
//! fan of corrected headings around it, and gives up (returns `None`) once the turn clock is
//! out of time. Callers that must issue an order anyway use
//! [`Navigator::navigate_or_thrust`].

use tracing::{trace, warn};

use crate::clock::TurnClock;
use crate::command::Command;
use crate::configuration::Configuration;
use crate::entity::{Entity, Unit};
use crate::geometry::Position;
use crate::world::World;

/// A thrust decided for one unit this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    /// Whole-number speed.
    pub speed: u32,
    /// Direction in `[0, 360)`.
    pub angle: u32,
}

impl Motion {
    /// The thrust order moving `unit` this way.
    pub fn command(&self, unit: &Unit) -> Command {
        Command::Thrust {
            unit: unit.id,
            speed: self.speed,
            angle: self.angle,
        }
    }
}

/// Search parameters of the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    speed: u32,
    max_corrections: usize,
    angular_step: u32,
}

impl Navigator {
    /// Planner with an explicit speed, correction count and step in degrees.
    pub fn new(speed: u32, max_corrections: usize, angular_step: u32) -> Self {
        Self {
            speed,
            max_corrections,
            angular_step: angular_step.max(1),
        }
    }

    /// Planner using the tunables of `config`.
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.speed, config.max_corrections, config.angular_step)
    }

    /// A clear heading from `unit` towards `destination`, or `None` when every tried heading
    /// is blocked or the clock ran out before the correction search.
    ///
    /// Entities containing `destination` (the objective being approached, for example) are not
    /// treated as obstacles. Corrected headings are tried at `+step, -step, +2 step, ...` from
    /// the direct one and keep the full distance to the destination.
    pub fn navigate(
        &self,
        unit: &Unit,
        destination: Position,
        world: &World,
        clock: &TurnClock,
    ) -> Option<Motion> {
        let distance = unit.distance_to(destination);
        if distance <= f64::EPSILON {
            return Some(Motion { speed: 0, angle: 0 });
        }
        let speed = self.capped_speed(distance);
        let direct = unit.angle_to(destination);

        let obstacles = world.path_obstacles(unit, destination);
        let is_clear = |end: Position| !obstacles.iter().any(|obstacle| obstacle.blocks(unit, end));

        if is_clear(destination) {
            return Some(Motion {
                speed,
                angle: direct,
            });
        }
        if clock.is_expired() {
            trace!(unit = unit.id, "no time left for heading correction");
            return None;
        }

        for (tried, angle) in corrections(direct, self.angular_step, self.max_corrections).enumerate()
        {
            if clock.is_expired() {
                trace!(unit = unit.id, tried, "heading search cut short");
                return None;
            }
            let end = unit.position.offset(f64::from(angle), distance);
            if is_clear(end) {
                trace!(unit = unit.id, direct, angle, "corrected heading");
                return Some(Motion { speed, angle });
            }
        }
        None
    }

    /// Like [`Navigator::navigate`], but falls back to thrusting straight at `destination`.
    pub fn navigate_or_thrust(
        &self,
        unit: &Unit,
        destination: Position,
        world: &World,
        clock: &TurnClock,
    ) -> Motion {
        self.navigate(unit, destination, world, clock)
            .unwrap_or_else(|| {
                warn!(
                    unit = unit.id,
                    elapsed = ?clock.elapsed(),
                    "no clear heading, thrusting straight"
                );
                self.direct_thrust(unit, destination)
            })
    }

    /// Straight thrust at `destination`, ignoring obstacles.
    pub fn direct_thrust(&self, unit: &Unit, destination: Position) -> Motion {
        Motion {
            speed: self.capped_speed(unit.distance_to(destination)),
            angle: unit.angle_to(destination),
        }
    }

    fn capped_speed(&self, distance: f64) -> u32 {
        f64::from(self.speed).min(distance).max(0.0) as u32
    }
}

/// Headings alternating around `direct`: `+step, -step, +2 step, -2 step, ...`, `count` in
/// total, wrapped into `[0, 360)`.
fn corrections(direct: u32, step: u32, count: usize) -> impl Iterator<Item = u32> {
    (0..count).map(move |i| {
        let k = (i / 2 + 1) as i64 * i64::from(step);
        let offset = if i % 2 == 0 { k } else { -k };
        (i64::from(direct) + offset).rem_euclid(360) as u32
    })
}
