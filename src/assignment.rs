//! Greedy assignment of free units to objectives under a target distribution.
//!
//! Every objective gets a demand of `distribution[id] * unit_count`. The objective with the
//! highest remaining demand repeatedly takes its closest unassigned unit and loses one unit
//! of demand. This is a greedy approximation, bounded by the turn clock; it makes no
//! optimality claim.
//!
//! Ties: on equal demand the smaller objective id is served first, on equal distance the
//! smaller unit id is taken first.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, instrument, warn};

use crate::clock::TurnClock;
use crate::entity::{Entity, Objective, ObjectiveId, Unit, UnitId};

#[derive(Debug)]
struct Demand {
    demand: f64,
    objective: usize,
    id: ObjectiveId,
}

impl PartialEq for Demand {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Demand {}

impl PartialOrd for Demand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Demand {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.demand.total_cmp(&other.demand) {
            // max-heap: the smaller id must compare greater
            Ordering::Equal => other.id.cmp(&self.id),
            ordering => ordering,
        }
    }
}

#[derive(Debug)]
struct Candidate {
    distance: f64,
    id: UnitId,
    unit: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.distance.total_cmp(&other.distance) {
            Ordering::Equal => self.id.cmp(&other.id),
            ordering => ordering,
        }
    }
}

/// Pairs each unit of `undocked` with one of `objectives`.
///
/// `distribution` is indexed by objective id; missing entries count as zero. Stops early once
/// `clock` expires and returns the pairs made so far. Pairs come in the order they were made.
#[instrument(skip_all, fields(units = undocked.len(), objectives = objectives.len()))]
pub fn assign<'w>(
    undocked: &[&'w Unit],
    objectives: &[&'w Objective],
    distribution: &[f64],
    clock: &TurnClock,
) -> Vec<(&'w Unit, &'w Objective)> {
    if undocked.is_empty() || objectives.is_empty() {
        return Vec::new();
    }

    let total = undocked.len() as f64;
    let mut demands = objectives
        .iter()
        .enumerate()
        .map(|(objective, target)| Demand {
            demand: distribution
                .get(target.id as usize)
                .copied()
                .unwrap_or(0.0)
                * total,
            objective,
            id: target.id,
        })
        .collect::<BinaryHeap<_>>();

    let mut candidates = objectives
        .iter()
        .map(|target| {
            undocked
                .iter()
                .enumerate()
                .map(|(unit, candidate)| {
                    Reverse(Candidate {
                        distance: candidate.distance_to(target.position),
                        id: candidate.id,
                        unit,
                    })
                })
                .collect::<BinaryHeap<_>>()
        })
        .collect::<Vec<_>>();

    let mut assigned = HashSet::with_capacity(undocked.len());
    let mut pairs = Vec::with_capacity(undocked.len());

    while pairs.len() < undocked.len() {
        let Some(mut top) = demands.pop() else {
            break;
        };
        let objective = top.objective;
        top.demand -= 1.0;
        demands.push(top);

        // entries for units taken by another objective are stale
        let next = std::iter::from_fn(|| candidates[objective].pop())
            .map(|Reverse(candidate)| candidate.unit)
            .find(|unit| !assigned.contains(unit));
        let Some(unit) = next else {
            break;
        };
        assigned.insert(unit);
        pairs.push((undocked[unit], objectives[objective]));

        if clock.is_expired() {
            warn!(
                assigned = pairs.len(),
                elapsed = ?clock.elapsed(),
                "turn budget spent, partial assignment"
            );
            break;
        }
    }

    debug!(assigned = pairs.len(), "assignment done");
    pairs
}
