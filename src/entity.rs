//! Typed world objects rebuilt from every state line.
//!
//! Relations between objects (a unit's owner, the objective a unit is docked to, the units docked
//! to an objective) are stored as ids and resolved through [`World`](crate::world::World). Nothing
//! here holds a reference to another object, so a whole turn's graph can be dropped at once.

use std::collections::BTreeMap;

use crate::command::Command;
use crate::geometry::{Position, COLLISION_MARGIN};

/// Identifier of a participant.
pub type OwnerId = u32;
/// Identifier of a unit, unique within its owner.
pub type UnitId = u32;
/// Identifier of an objective, stable for the whole game.
pub type ObjectiveId = u32;

/// Collision radius of every unit.
pub const UNIT_RADIUS: f64 = 0.5;
/// Extra distance around an objective's surface within which a unit may dock.
pub const DOCK_RADIUS: f64 = 4.0;
/// Default gap kept between an approach point and the approached entity's surface.
pub const MIN_APPROACH_DISTANCE: f64 = 3.0;
/// Upper bound on objective ids; ids index fixed-size per-objective arrays.
pub const MAX_OBJECTIVES: usize = 28;

/// Anything with a position and a collision radius.
pub trait Entity {
    /// Centre of the entity.
    fn position(&self) -> Position;

    /// Body radius, without the collision margin.
    fn radius(&self) -> f64;

    /// Distance between centres.
    fn distance_to(&self, target: Position) -> f64 {
        self.position().distance_to(&target)
    }

    /// Whole-degree direction from this entity towards `target`.
    fn angle_to(&self, target: Position) -> u32 {
        self.position().angle_to(&target)
    }

    /// True when both collision boundaries touch.
    fn collides_with(&self, other: &dyn Entity) -> bool {
        self.distance_to(other.position()) <= self.radius() + other.radius() + COLLISION_MARGIN
    }

    /// True when `point` lies within this entity's body.
    fn contains(&self, point: Position) -> bool {
        self.distance_to(point) <= self.radius()
    }

    /// The point `min_distance` off this entity's surface, on the side facing `from`.
    fn approach_point(&self, from: Position, min_distance: f64) -> Position {
        let center = self.position();
        center.offset(center.heading_to(&from), self.radius() + min_distance)
    }
}

/// Docking state of a unit. Every state but `Undocked` refers to an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DockingState {
    /// Free to move.
    #[default]
    Undocked,
    /// Attaching to the objective.
    Docking(ObjectiveId),
    /// Attached to the objective.
    Docked(ObjectiveId),
    /// Detaching from the objective.
    Undocking(ObjectiveId),
}

impl DockingState {
    /// Decodes the wire code (`0..=3`). `objective` is only read for attached states.
    ///
    /// Returns `None` for an unknown code.
    pub fn from_code(code: u8, objective: ObjectiveId) -> Option<Self> {
        match code {
            0 => Some(Self::Undocked),
            1 => Some(Self::Docking(objective)),
            2 => Some(Self::Docked(objective)),
            3 => Some(Self::Undocking(objective)),
            _ => None,
        }
    }

    /// The objective this state is attached to, if any.
    pub fn objective(&self) -> Option<ObjectiveId> {
        match *self {
            Self::Undocked => None,
            Self::Docking(id) | Self::Docked(id) | Self::Undocking(id) => Some(id),
        }
    }

    /// True for [`DockingState::Undocked`].
    pub fn is_undocked(&self) -> bool {
        matches!(self, Self::Undocked)
    }
}

/// A mobile entity belonging to one owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Id, unique within the owner.
    pub id: UnitId,
    /// Owning participant.
    pub owner: OwnerId,
    /// Current position.
    pub position: Position,
    /// Collision radius.
    pub radius: f64,
    /// Remaining health.
    pub health: u32,
    /// Velocity reported by the engine.
    pub velocity: Position,
    /// Docking state and the objective it refers to.
    pub docking: DockingState,
}

impl Unit {
    /// True when close enough to `objective` to dock and a slot is free.
    pub fn can_dock(&self, objective: &Objective) -> bool {
        !objective.is_full()
            && self.distance_to(objective.position) <= objective.radius + DOCK_RADIUS + self.radius
    }

    /// Move command. `speed` is truncated to a whole number.
    pub fn thrust(&self, speed: f64, angle: u32) -> Command {
        Command::thrust(self.id, speed, angle)
    }

    /// Dock command targeting `objective`.
    pub fn dock(&self, objective: &Objective) -> Command {
        Command::Dock {
            unit: self.id,
            objective: objective.id,
        }
    }

    /// Undock command.
    pub fn undock(&self) -> Command {
        Command::Undock { unit: self.id }
    }
}

impl Entity for Unit {
    fn position(&self) -> Position {
        self.position
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}

/// A stationary entity units dock to.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Id, `< MAX_OBJECTIVES`.
    pub id: ObjectiveId,
    /// Controlling participant, `None` when unclaimed.
    pub owner: Option<OwnerId>,
    /// Centre.
    pub position: Position,
    /// Body radius.
    pub radius: f64,
    /// Remaining health.
    pub health: u32,
    /// Number of docking slots.
    pub capacity: u32,
    /// Current yield per turn.
    pub yield_rate: u32,
    /// Resources left to extract.
    pub remaining_resources: u32,
    /// Units of `owner` currently docked.
    pub docked: Vec<UnitId>,
}

impl Objective {
    /// True when some participant controls it.
    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    /// True when controlled by `owner`.
    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner == Some(owner)
    }

    /// Free docking slots.
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.docked.len() as u32)
    }

    /// True when no slot is free.
    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == 0
    }
}

impl Entity for Objective {
    fn position(&self) -> Position {
        self.position
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}

/// A participant and its units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Owner {
    /// Participant id.
    pub id: OwnerId,
    /// Units by id.
    pub units: BTreeMap<UnitId, Unit>,
}

impl Owner {
    /// The unit with id `id`.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// All units, ordered by id.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: f64, y: f64) -> Unit {
        Unit {
            id: 3,
            owner: 0,
            position: Position::new(x, y),
            radius: UNIT_RADIUS,
            health: 255,
            velocity: Position::default(),
            docking: DockingState::Undocked,
        }
    }

    fn objective_at(x: f64, y: f64, capacity: u32) -> Objective {
        Objective {
            id: 1,
            owner: None,
            position: Position::new(x, y),
            radius: 5.0,
            health: 1000,
            capacity,
            yield_rate: 0,
            remaining_resources: 1000,
            docked: vec![],
        }
    }

    #[test]
    fn docking_codes() {
        assert_eq!(DockingState::from_code(0, 7), Some(DockingState::Undocked));
        assert_eq!(DockingState::from_code(2, 7), Some(DockingState::Docked(7)));
        assert_eq!(DockingState::from_code(4, 7), None);
        assert_eq!(DockingState::Undocking(2).objective(), Some(2));
        assert!(DockingState::Undocked.objective().is_none());
    }

    #[test]
    fn dock_range_includes_both_radii() {
        let objective = objective_at(20.0, 20.0, 2);
        // 5 + 4 + 0.5
        assert!(unit_at(29.5, 20.0).can_dock(&objective));
        assert!(!unit_at(29.6, 20.0).can_dock(&objective));
    }

    #[test]
    fn full_objective_cannot_be_docked() {
        let mut objective = objective_at(20.0, 20.0, 1);
        objective.owner = Some(0);
        objective.docked.push(9);
        assert!(objective.is_full());
        assert!(!unit_at(26.0, 20.0).can_dock(&objective));
    }

    #[test]
    fn approach_point_faces_the_origin() {
        let objective = objective_at(20.0, 20.0, 2);
        let point = objective.approach_point(Position::new(0.0, 20.0), MIN_APPROACH_DISTANCE);
        assert!((point.x - 12.0).abs() < 1e-9);
        assert!((point.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn collision_uses_margin() {
        let a = unit_at(0.0, 0.0);
        assert!(a.collides_with(&unit_at(1.05, 0.0)));
        assert!(!a.collides_with(&unit_at(1.2, 0.0)));
    }

    #[test]
    fn commands_carry_unit_id() {
        let unit = unit_at(0.0, 0.0);
        assert_eq!(unit.thrust(6.9, 45).to_string(), "t 3 6 45");
        assert_eq!(unit.dock(&objective_at(1.0, 1.0, 1)).to_string(), "d 3 1");
        assert_eq!(unit.undock().to_string(), "u 3");
    }
}
