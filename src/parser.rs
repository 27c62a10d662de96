//! Turns one engine state line into a linked [`World`].
//!
//! Token grammar, in order:
//!
//! ```text
//! owner_count
//!   { owner_id unit_count
//!       { id x y health vel_x vel_y docking_code objective_id docking_progress } }
//! objective_count
//!   { id x y health radius yield_rate remaining_resources owned_flag owner_id capacity
//!     docked_count { unit_id } }
//! ```
//!
//! Every declared count must be honoured and no token may be left over. Any violation is a
//! [`ParseError`]; there is no partial world.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use thiserror::Error;
use tracing::trace;

use crate::entity::{
    DockingState, Objective, ObjectiveId, Owner, OwnerId, Unit, UnitId, MAX_OBJECTIVES,
    UNIT_RADIUS,
};
use crate::geometry::Position;
use crate::world::{GameHeader, World};

/// Why a state line was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line ended before a declared count was satisfied.
    #[error("state line ended while reading {field}")]
    MissingToken {
        /// What was being read.
        field: &'static str,
    },
    /// A token did not parse as the expected number.
    #[error("invalid {field}: '{token}'")]
    InvalidNumber {
        /// What was being read.
        field: &'static str,
        /// The offending token.
        token: String,
    },
    /// A number that parsed but is outside the values the field allows.
    #[error("out of range {field}: '{token}'")]
    InvalidValue {
        /// What was being read.
        field: &'static str,
        /// The offending token.
        token: String,
    },
    /// Tokens were left after the last declared objective.
    #[error("{0} token(s) left after the last objective")]
    TrailingTokens(usize),
    /// A docking code outside `0..=3`.
    #[error("unknown docking state code {0}")]
    UnknownDockingState(u8),
    /// An objective id that does not fit the per-objective tables.
    #[error("objective id {0} is not below {}", MAX_OBJECTIVES)]
    ObjectiveOutOfRange(ObjectiveId),
    /// Same owner id twice in one line.
    #[error("owner {0} declared twice")]
    DuplicateOwner(OwnerId),
    /// Same unit id twice for one owner.
    #[error("unit {unit} of owner {owner} declared twice")]
    DuplicateUnit {
        /// Owner of the unit.
        owner: OwnerId,
        /// Repeated id.
        unit: UnitId,
    },
    /// Same objective id twice in one line.
    #[error("objective {0} declared twice")]
    DuplicateObjective(ObjectiveId),
    /// An owned objective names an owner missing from the line.
    #[error("objective {objective} is controlled by unknown owner {owner}")]
    UnknownOwner {
        /// Referencing objective.
        objective: ObjectiveId,
        /// Missing owner.
        owner: OwnerId,
    },
    /// An objective lists a docked unit its owner does not have.
    #[error("objective {objective} lists unit {unit} which owner {owner} does not have")]
    UnknownDockedUnit {
        /// Referencing objective.
        objective: ObjectiveId,
        /// Controlling owner.
        owner: OwnerId,
        /// Missing unit.
        unit: UnitId,
    },
    /// An objective lists the same docked unit twice.
    #[error("objective {objective} lists unit {unit} twice")]
    DuplicateDockedUnit {
        /// Referencing objective.
        objective: ObjectiveId,
        /// Repeated unit.
        unit: UnitId,
    },
    /// An objective lists a unit whose own docking state points elsewhere.
    #[error("objective {objective} lists unit {unit} of owner {owner}, which is not attached to it")]
    DockingMismatch {
        /// Referencing objective.
        objective: ObjectiveId,
        /// Controlling owner.
        owner: OwnerId,
        /// Listed unit.
        unit: UnitId,
    },
    /// An unowned objective lists docked units.
    #[error("objective {0} lists docked units but has no owner")]
    UnownedDockedUnits(ObjectiveId),
    /// A unit is attached to an objective missing from the line.
    #[error("unit {unit} of owner {owner} is attached to unknown objective {objective}")]
    UnknownObjective {
        /// Owner of the unit.
        owner: OwnerId,
        /// Attached unit.
        unit: UnitId,
        /// Missing objective.
        objective: ObjectiveId,
    },
}

/// Parses a whole state line.
pub fn parse_line(header: GameHeader, line: &str) -> Result<World, ParseError> {
    parse(header, line.split_whitespace())
}

/// Parses a token sequence into a linked world carrying `header`.
pub fn parse<'a>(
    header: GameHeader,
    tokens: impl IntoIterator<Item = &'a str>,
) -> Result<World, ParseError> {
    let mut tokens = TokenStream::new(tokens.into_iter());

    let owners = parse_owners(&mut tokens)?;
    let objectives = parse_objectives(&mut tokens)?;
    let consumed = tokens.finish()?;

    link(&owners, &objectives)?;
    trace!(
        consumed,
        owners = owners.len(),
        objectives = objectives.len(),
        "state parsed"
    );
    Ok(World::from_tables(header, owners, objectives))
}

struct TokenStream<I> {
    tokens: I,
    consumed: usize,
}

impl<'a, I: Iterator<Item = &'a str>> TokenStream<I> {
    fn new(tokens: I) -> Self {
        Self {
            tokens,
            consumed: 0,
        }
    }

    fn next<T: FromStr>(&mut self, field: &'static str) -> Result<T, ParseError> {
        let token = self
            .tokens
            .next()
            .ok_or(ParseError::MissingToken { field })?;
        self.consumed += 1;
        token.parse().map_err(|_| ParseError::InvalidNumber {
            field,
            token: token.to_owned(),
        })
    }

    /// A finite number: `NaN` and infinities are rejected.
    fn finite(&mut self, field: &'static str) -> Result<f64, ParseError> {
        let value: f64 = self.next(field)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ParseError::InvalidValue {
                field,
                token: value.to_string(),
            })
        }
    }

    /// A finite, non-negative number.
    fn extent(&mut self, field: &'static str) -> Result<f64, ParseError> {
        let value = self.finite(field)?;
        if value >= 0.0 {
            Ok(value)
        } else {
            Err(ParseError::InvalidValue {
                field,
                token: value.to_string(),
            })
        }
    }

    fn finish(mut self) -> Result<usize, ParseError> {
        match self.tokens.by_ref().count() {
            0 => Ok(self.consumed),
            left => Err(ParseError::TrailingTokens(left)),
        }
    }
}

fn parse_owners<'a>(
    tokens: &mut TokenStream<impl Iterator<Item = &'a str>>,
) -> Result<BTreeMap<OwnerId, Owner>, ParseError> {
    let count: usize = tokens.next("owner count")?;
    let mut owners = BTreeMap::new();
    for _ in 0..count {
        let id: OwnerId = tokens.next("owner id")?;
        let units = parse_units(tokens, id)?;
        match owners.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(Owner { id, units });
            }
            Entry::Occupied(_) => return Err(ParseError::DuplicateOwner(id)),
        }
    }
    Ok(owners)
}

fn parse_units<'a>(
    tokens: &mut TokenStream<impl Iterator<Item = &'a str>>,
    owner: OwnerId,
) -> Result<BTreeMap<UnitId, Unit>, ParseError> {
    let count: usize = tokens.next("unit count")?;
    let mut units = BTreeMap::new();
    for _ in 0..count {
        let id: UnitId = tokens.next("unit id")?;
        let x = tokens.finite("unit x")?;
        let y = tokens.finite("unit y")?;
        let health = tokens.next("unit health")?;
        let vel_x = tokens.finite("unit velocity x")?;
        let vel_y = tokens.finite("unit velocity y")?;
        let code: u8 = tokens.next("docking state")?;
        let objective: i64 = tokens.next("docked objective")?;
        let _progress: i64 = tokens.next("docking progress")?;

        let docking = DockingState::from_code(code, 0)
            .ok_or(ParseError::UnknownDockingState(code))?;
        let docking = if docking.is_undocked() {
            docking
        } else {
            // only attached states give the objective token a meaning
            let objective =
                ObjectiveId::try_from(objective).map_err(|_| ParseError::InvalidNumber {
                    field: "docked objective",
                    token: objective.to_string(),
                })?;
            DockingState::from_code(code, objective)
                .ok_or(ParseError::UnknownDockingState(code))?
        };

        let unit = Unit {
            id,
            owner,
            position: Position::new(x, y),
            radius: UNIT_RADIUS,
            health,
            velocity: Position::new(vel_x, vel_y),
            docking,
        };
        if units.insert(id, unit).is_some() {
            return Err(ParseError::DuplicateUnit { owner, unit: id });
        }
    }
    Ok(units)
}

fn parse_objectives<'a>(
    tokens: &mut TokenStream<impl Iterator<Item = &'a str>>,
) -> Result<BTreeMap<ObjectiveId, Objective>, ParseError> {
    let count: usize = tokens.next("objective count")?;
    let mut objectives = BTreeMap::new();
    for _ in 0..count {
        let id: ObjectiveId = tokens.next("objective id")?;
        if id as usize >= MAX_OBJECTIVES {
            return Err(ParseError::ObjectiveOutOfRange(id));
        }
        let x = tokens.finite("objective x")?;
        let y = tokens.finite("objective y")?;
        let health = tokens.next("objective health")?;
        let radius = tokens.extent("objective radius")?;
        let yield_rate = tokens.next("objective yield rate")?;
        let remaining_resources = tokens.next("objective remaining resources")?;
        let owned: u8 = tokens.next("objective owned flag")?;
        let owner_id: OwnerId = tokens.next("objective owner")?;
        let capacity = tokens.next("objective capacity")?;
        let docked_count: usize = tokens.next("docked unit count")?;
        let docked = (0..docked_count)
            .map(|_| tokens.next("docked unit id"))
            .collect::<Result<Vec<UnitId>, _>>()?;

        let objective = Objective {
            id,
            owner: (owned != 0).then_some(owner_id),
            position: Position::new(x, y),
            radius,
            health,
            capacity,
            yield_rate,
            remaining_resources,
            docked,
        };
        if objectives.insert(id, objective).is_some() {
            return Err(ParseError::DuplicateObjective(id));
        }
    }
    Ok(objectives)
}

/// Checks every id-based back-reference against the freshly parsed tables.
///
/// Runs once both tables are complete: objectives name units that live inside owner records.
/// A docked list must name each unit once, and every listed unit must itself be attached
/// (docking, docked or undocking) to that objective.
fn link(
    owners: &BTreeMap<OwnerId, Owner>,
    objectives: &BTreeMap<ObjectiveId, Objective>,
) -> Result<(), ParseError> {
    for objective in objectives.values() {
        let Some(owner_id) = objective.owner else {
            if !objective.docked.is_empty() {
                return Err(ParseError::UnownedDockedUnits(objective.id));
            }
            continue;
        };
        let owner = owners.get(&owner_id).ok_or(ParseError::UnknownOwner {
            objective: objective.id,
            owner: owner_id,
        })?;
        let mut seen = HashSet::with_capacity(objective.docked.len());
        for &id in &objective.docked {
            let unit = owner.unit(id).ok_or(ParseError::UnknownDockedUnit {
                objective: objective.id,
                owner: owner_id,
                unit: id,
            })?;
            if !seen.insert(id) {
                return Err(ParseError::DuplicateDockedUnit {
                    objective: objective.id,
                    unit: id,
                });
            }
            if unit.docking.objective() != Some(objective.id) {
                return Err(ParseError::DockingMismatch {
                    objective: objective.id,
                    owner: owner_id,
                    unit: id,
                });
            }
        }
    }

    for unit in owners.values().flat_map(Owner::units) {
        if let Some(objective) = unit.docking.objective() {
            if !objectives.contains_key(&objective) {
                return Err(ParseError::UnknownObjective {
                    owner: unit.owner,
                    unit: unit.id,
                    objective,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: GameHeader = GameHeader {
        my_id: 1,
        width: 240,
        height: 160,
    };

    // owner 1 with one docked unit, owner 2 with two free units, one owned and one free objective
    const LINE: &str = "2 \
        1 1 4 30.5 40.25 255 0 0 2 1 5 \
        2 2 0 100 100 200 1.5 -2 0 0 0 1 110 100 255 0 0 0 0 0 \
        2 \
        1 35 45 1500 6.2 3 1800 1 1 3 1 4 \
        6 150 90 1200 5 0 2000 0 0 2 0";

    fn token_count() -> usize {
        // 1 owner count + (2 + 9) + (2 + 2*9) + 1 objective count + (11 + 1) + 11
        1 + (2 + 9) + (2 + 2 * 9) + 1 + (11 + 1) + 11
    }

    #[test]
    fn parses_owners_units_and_objectives() {
        let world = parse_line(HEADER, LINE).unwrap();
        assert_eq!(world.header(), HEADER);
        assert_eq!(world.owners().count(), 2);

        let unit = world.unit(1, 4).unwrap();
        assert_eq!(unit.position, Position::new(30.5, 40.25));
        assert_eq!(unit.health, 255);
        assert_eq!(unit.docking, DockingState::Docked(1));
        assert_eq!(unit.radius, UNIT_RADIUS);

        let enemy = world.unit(2, 0).unwrap();
        assert_eq!(enemy.velocity, Position::new(1.5, -2.0));
        assert!(enemy.docking.is_undocked());

        let objective = world.objective(1).unwrap();
        assert_eq!(objective.owner, Some(1));
        assert_eq!(objective.radius, 6.2);
        assert_eq!(objective.yield_rate, 3);
        assert_eq!(objective.remaining_resources, 1800);
        assert_eq!(objective.capacity, 3);
        assert_eq!(objective.docked, vec![4]);
        assert_eq!(objective.remaining_capacity(), 2);

        let free = world.objective(6).unwrap();
        assert_eq!(free.owner, None);
        assert!(free.docked.is_empty());
    }

    #[test]
    fn consumes_exactly_the_declared_tokens() {
        let tokens = LINE.split_whitespace().collect::<Vec<_>>();
        assert_eq!(tokens.len(), token_count());
        assert!(parse(HEADER, tokens.iter().copied()).is_ok());

        let short = &tokens[..tokens.len() - 1];
        assert!(matches!(
            parse(HEADER, short.iter().copied()),
            Err(ParseError::MissingToken { .. })
        ));

        let mut long = tokens.clone();
        long.push("0");
        assert_eq!(
            parse(HEADER, long.iter().copied()),
            Err(ParseError::TrailingTokens(1))
        );
    }

    #[test]
    fn owned_objectives_link_to_their_owner() {
        let world = parse_line(HEADER, LINE).unwrap();
        for objective in world.objectives() {
            if let Some(owner) = world.objective_owner(objective) {
                assert_eq!(Some(owner.id), objective.owner);
                for id in &objective.docked {
                    assert!(owner.unit(*id).is_some());
                }
            }
        }
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = parse_line(HEADER, "1 0 1 0 1x 2 255 0 0 0 0 0 0").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                field: "unit x",
                token: "1x".to_owned()
            }
        );
    }

    #[test]
    fn rejects_non_finite_positions_and_negative_radius() {
        let err = parse_line(HEADER, "1 0 1 0 NaN 2 255 0 0 0 0 0 0").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                field: "unit x",
                token: "NaN".to_owned()
            }
        );

        let err = parse_line(HEADER, "1 0 1 0 1 2 255 inf 0 0 0 0 0").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                field: "unit velocity x",
                token: "inf".to_owned()
            }
        );

        let err = parse_line(HEADER, "0 1 0 50 50 1000 -5 0 1000 0 0 2 0").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                field: "objective radius",
                token: "-5".to_owned()
            }
        );

        let world = parse_line(HEADER, "0 1 0 50 50 1000 0 0 1000 0 0 2 0").unwrap();
        assert_eq!(world.objective(0).unwrap().radius, 0.0);
    }

    #[test]
    fn rejects_unknown_docking_code() {
        let err = parse_line(HEADER, "1 0 1 0 1 2 255 0 0 7 0 0 0").unwrap_err();
        assert_eq!(err, ParseError::UnknownDockingState(7));
    }

    #[test]
    fn undocked_units_ignore_objective_sentinel() {
        let world = parse_line(HEADER, "1 0 1 0 1 2 255 0 0 0 -1 0 0").unwrap();
        assert!(world.unit(0, 0).unwrap().docking.is_undocked());
    }

    #[test]
    fn rejects_out_of_range_objective() {
        let err = parse_line(HEADER, "0 1 28 1 1 1 1 0 0 0 0 1 0").unwrap_err();
        assert_eq!(err, ParseError::ObjectiveOutOfRange(28));
    }

    #[test]
    fn rejects_dangling_references() {
        // docked unit 9 does not exist
        let err = parse_line(HEADER, "1 0 0 1 0 1 1 1 1 0 1000 1 0 2 1 9").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownDockedUnit {
                objective: 0,
                owner: 0,
                unit: 9
            }
        );

        // objective controlled by an owner that is not in the line
        let err = parse_line(HEADER, "0 1 0 1 1 1 1 0 1000 1 5 2 0").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownOwner {
                objective: 0,
                owner: 5
            }
        );

        // unowned objective with docked units
        let err = parse_line(HEADER, "1 0 1 3 1 1 255 0 0 2 0 0 1 0 1 1 1 1 0 1000 0 0 2 1 3")
            .unwrap_err();
        assert_eq!(err, ParseError::UnownedDockedUnits(0));

        // unit attached to an objective that is not in the line
        let err = parse_line(HEADER, "1 0 1 3 1 1 255 0 0 1 4 0 0").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownObjective {
                owner: 0,
                unit: 3,
                objective: 4
            }
        );
    }

    #[test]
    fn docked_lists_match_unit_docking_states() {
        // unit 1 docked to objective 0, listed twice
        let err = parse_line(
            HEADER,
            "1 0 1 1 1 1 255 0 0 2 0 0 1 0 1 1 1 1 0 1000 1 0 2 2 1 1",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::DuplicateDockedUnit {
                objective: 0,
                unit: 1
            }
        );

        // unit 1 is undocked but objective 0 lists it
        let err = parse_line(
            HEADER,
            "1 0 1 1 1 1 255 0 0 0 0 0 1 0 1 1 1 1 0 1000 1 0 2 1 1",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::DockingMismatch {
                objective: 0,
                owner: 0,
                unit: 1
            }
        );

        // unit 1 is docked to objective 3 but objective 0 lists it
        let err = parse_line(
            HEADER,
            "1 0 1 1 1 1 255 0 0 2 3 0 \
             2 0 1 1 1 1 0 1000 1 0 2 1 1 3 9 9 1 1 0 1000 1 0 2 1 1",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::DockingMismatch {
                objective: 0,
                owner: 0,
                unit: 1
            }
        );
    }

    #[test]
    fn rejects_duplicates() {
        let err = parse_line(HEADER, "2 0 0 0 0 0").unwrap_err();
        assert_eq!(err, ParseError::DuplicateOwner(0));
        let err = parse_line(HEADER, "0 2 3 1 1 1 1 0 0 0 0 1 0 3 1 1 1 1 0 0 0 0 1 0")
            .unwrap_err();
        assert_eq!(err, ParseError::DuplicateObjective(3));
    }

    #[test]
    fn empty_world_is_valid() {
        let world = parse_line(HEADER, "0 0").unwrap();
        assert!(world.me().is_none());
        assert_eq!(world.objectives().count(), 0);
    }
}
