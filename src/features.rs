//! Per-objective feature matrix and the scoring boundary.
//!
//! Row `i` describes the objective with id `i`; ids without an objective are all-zero rows.
//! An [`ObjectiveScorer`] turns the matrix into the target distribution consumed by
//! [`assign`](crate::assignment::assign).

use crate::entity::{Entity, MAX_OBJECTIVES};
use crate::geometry::Position;
use crate::world::World;

/// Number of columns of the matrix.
pub const FEATURES_PER_OBJECTIVE: usize = 11;

/// Value used for "nearest unit" columns when the side has no unit.
pub const NO_UNIT_DISTANCE: f64 = 10_000.0;

/// Column indices.
pub mod column {
    /// Objective health.
    pub const HEALTH: usize = 0;
    /// Free docking slots.
    pub const REMAINING_SLOTS: usize = 1;
    /// Resources left.
    pub const REMAINING_RESOURCES: usize = 2;
    /// Yield multiplied by ownership.
    pub const SIGNED_YIELD: usize = 3;
    /// Own health pull minus enemy health pull (health over squared distance).
    pub const GRAVITY: usize = 4;
    /// Distance of the nearest own unit.
    pub const MY_BEST_DISTANCE: usize = 5;
    /// Distance of the nearest enemy unit.
    pub const ENEMY_BEST_DISTANCE: usize = 6;
    /// `1` when mine, `0` when unclaimed, `-1` otherwise.
    pub const OWNERSHIP: usize = 7;
    /// Distance to the map centre.
    pub const DISTANCE_FROM_CENTER: usize = 8;
    /// Mean own-unit distance weighted by health.
    pub const HEALTH_WEIGHTED_DISTANCE: usize = 9;
    /// `1` when the objective still accepts own units or is not mine.
    pub const ACTIVE: usize = 10;
}

/// One row of features.
pub type FeatureRow = [f64; FEATURES_PER_OBJECTIVE];

/// `MAX_OBJECTIVES` rows of [`FEATURES_PER_OBJECTIVE`] features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    fn zeroed() -> Self {
        Self {
            rows: vec![[0.0; FEATURES_PER_OBJECTIVE]; MAX_OBJECTIVES],
        }
    }

    /// Features of objective `id`. `None` past `MAX_OBJECTIVES`.
    pub fn row(&self, id: usize) -> Option<&FeatureRow> {
        self.rows.get(id)
    }

    /// All rows, indexed by objective id.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// True when row `id` describes an objective that can still take units.
    pub fn is_active(&self, id: usize) -> bool {
        self.row(id).is_some_and(|row| row[column::ACTIVE] != 0.0)
    }
}

/// Computes the feature matrix of `world` from the local participant's point of view.
pub fn objective_features(world: &World) -> FeatureMatrix {
    let mut matrix = FeatureMatrix::zeroed();
    let my_id = world.my_id();
    let center = Position::new(
        f64::from(world.width()) / 2.0,
        f64::from(world.height()) / 2.0,
    );

    for objective in world.objectives() {
        let Some(row) = matrix.rows.get_mut(objective.id as usize) else {
            continue;
        };

        let ownership = match objective.owner {
            Some(owner) if owner == my_id => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        };

        let mut my_best = NO_UNIT_DISTANCE;
        let mut enemy_best = NO_UNIT_DISTANCE;
        let mut gravity = 0.0;
        let mut weighted_distance = 0.0;
        let mut health_sum = 0.0;

        for unit in world.all_units() {
            let d = unit.distance_to(objective.position);
            let health = f64::from(unit.health);
            // a unit sitting on the centre has no defined pull
            let pull = if d > f64::EPSILON { health / (d * d) } else { 0.0 };
            if unit.owner == my_id {
                my_best = my_best.min(d);
                health_sum += health;
                weighted_distance += d * health;
                gravity += pull;
            } else {
                enemy_best = enemy_best.min(d);
                gravity -= pull;
            }
        }

        let remaining_slots = f64::from(objective.remaining_capacity());
        let active = remaining_slots > 0.0 || ownership != 1.0;

        row[column::HEALTH] = f64::from(objective.health);
        row[column::REMAINING_SLOTS] = remaining_slots;
        row[column::REMAINING_RESOURCES] = f64::from(objective.remaining_resources);
        row[column::SIGNED_YIELD] = f64::from(objective.yield_rate) * ownership;
        row[column::GRAVITY] = gravity;
        row[column::MY_BEST_DISTANCE] = my_best;
        row[column::ENEMY_BEST_DISTANCE] = enemy_best;
        row[column::OWNERSHIP] = ownership;
        row[column::DISTANCE_FROM_CENTER] = objective.distance_to(center);
        row[column::HEALTH_WEIGHTED_DISTANCE] = if health_sum > 0.0 {
            weighted_distance / health_sum
        } else {
            0.0
        };
        row[column::ACTIVE] = if active { 1.0 } else { 0.0 };
    }
    matrix
}

/// Turns a feature matrix into a per-objective target distribution, indexed by objective id.
pub trait ObjectiveScorer {
    /// One value per row of `features`.
    fn score(&self, features: &FeatureMatrix) -> Vec<f64>;
}

/// Spreads units evenly over every active objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformScorer;

impl ObjectiveScorer for UniformScorer {
    fn score(&self, features: &FeatureMatrix) -> Vec<f64> {
        let active = (0..features.rows().len())
            .filter(|id| features.is_active(*id))
            .count();
        (0..features.rows().len())
            .map(|id| {
                if active > 0 && features.is_active(id) {
                    1.0 / active as f64
                } else {
                    0.0
                }
            })
            .collect()
    }
}
