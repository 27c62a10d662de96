//! The per-turn world snapshot.
//!
//! A [`World`] is produced by the [parser](crate::parser) once per turn and is read-only
//! afterwards. Back-references are ids; the lookup helpers below resolve them against the
//! snapshot's own tables.

use std::collections::BTreeMap;

use crate::entity::{Entity, Objective, ObjectiveId, Owner, OwnerId, Unit, UnitId};
use crate::geometry::{segment_intersects_circle, Position, COLLISION_MARGIN};

/// Values fixed at handshake time and kept for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameHeader {
    /// The local participant.
    pub my_id: OwnerId,
    /// Map width.
    pub width: u32,
    /// Map height.
    pub height: u32,
}

/// Identity of an entity within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// A unit, qualified by its owner.
    Unit {
        /// Owner of the unit.
        owner: OwnerId,
        /// Unit id within the owner.
        id: UnitId,
    },
    /// An objective.
    Objective(ObjectiveId),
}

/// A borrowed unit or objective.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// A unit.
    Unit(&'a Unit),
    /// An objective.
    Objective(&'a Objective),
}

impl EntityRef<'_> {
    /// Identity of the referenced entity.
    pub fn key(&self) -> EntityKey {
        match self {
            EntityRef::Unit(unit) => EntityKey::Unit {
                owner: unit.owner,
                id: unit.id,
            },
            EntityRef::Objective(objective) => EntityKey::Objective(objective.id),
        }
    }

    /// Whether this entity lies on `unit`'s straight path to `end`, collision margin included.
    pub fn blocks(&self, unit: &Unit, end: Position) -> bool {
        segment_intersects_circle(
            unit.position,
            end,
            self.position(),
            self.radius(),
            unit.radius + COLLISION_MARGIN,
        )
    }
}

impl Entity for EntityRef<'_> {
    fn position(&self) -> Position {
        match self {
            EntityRef::Unit(unit) => unit.position,
            EntityRef::Objective(objective) => objective.position,
        }
    }

    fn radius(&self) -> f64 {
        match self {
            EntityRef::Unit(unit) => unit.radius,
            EntityRef::Objective(objective) => objective.radius,
        }
    }
}

impl Unit {
    /// Identity of this unit.
    pub fn key(&self) -> EntityKey {
        EntityKey::Unit {
            owner: self.owner,
            id: self.id,
        }
    }
}

/// Units split by docking state.
#[derive(Debug, Clone, Default)]
pub struct UnitGroups<'a> {
    /// Every unit of the group.
    pub all: Vec<&'a Unit>,
    /// Units in any attached state (docking, docked, undocking).
    pub docked: Vec<&'a Unit>,
    /// Free units.
    pub undocked: Vec<&'a Unit>,
}

impl<'a> UnitGroups<'a> {
    fn from_units(units: impl Iterator<Item = &'a Unit>) -> Self {
        let mut groups = UnitGroups::default();
        for unit in units {
            groups.all.push(unit);
            if unit.docking.is_undocked() {
                groups.undocked.push(unit);
            } else {
                groups.docked.push(unit);
            }
        }
        groups
    }
}

/// Units split between the local participant and everyone else.
#[derive(Debug, Clone, Default)]
pub struct UnitPartition<'a> {
    /// Every unit on the map.
    pub all: Vec<&'a Unit>,
    /// Local units.
    pub mine: UnitGroups<'a>,
    /// Units of every other participant.
    pub enemies: UnitGroups<'a>,
}

/// Objectives split by control.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveGroups<'a> {
    /// Every objective.
    pub all: Vec<&'a Objective>,
    /// Controlled by the local participant.
    pub mine: Vec<&'a Objective>,
    /// Controlled by the local participant with a free slot.
    pub mine_dockable: Vec<&'a Objective>,
    /// Unclaimed.
    pub ownerless: Vec<&'a Objective>,
    /// Unclaimed, or local with a free slot.
    pub dockable: Vec<&'a Objective>,
    /// Controlled by another participant.
    pub enemies: Vec<&'a Objective>,
}

/// Everything known about the game during one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    header: GameHeader,
    owners: BTreeMap<OwnerId, Owner>,
    objectives: BTreeMap<ObjectiveId, Objective>,
}

impl World {
    /// An empty world, as known right after the handshake.
    pub fn new(header: GameHeader) -> Self {
        Self::from_tables(header, BTreeMap::new(), BTreeMap::new())
    }

    pub(crate) fn from_tables(
        header: GameHeader,
        owners: BTreeMap<OwnerId, Owner>,
        objectives: BTreeMap<ObjectiveId, Objective>,
    ) -> Self {
        Self {
            header,
            owners,
            objectives,
        }
    }

    /// Handshake values.
    pub fn header(&self) -> GameHeader {
        self.header
    }

    /// The local participant's id.
    pub fn my_id(&self) -> OwnerId {
        self.header.my_id
    }

    /// Map width.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Map height.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// The local participant, absent before the first state line.
    pub fn me(&self) -> Option<&Owner> {
        self.owners.get(&self.header.my_id)
    }

    /// Participant `id`.
    pub fn owner(&self, id: OwnerId) -> Option<&Owner> {
        self.owners.get(&id)
    }

    /// All participants, ordered by id.
    pub fn owners(&self) -> impl Iterator<Item = &Owner> {
        self.owners.values()
    }

    /// Objective `id`.
    pub fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.get(&id)
    }

    /// All objectives, ordered by id.
    pub fn objectives(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.values()
    }

    /// Unit `id` of participant `owner`.
    pub fn unit(&self, owner: OwnerId, id: UnitId) -> Option<&Unit> {
        self.owner(owner)?.unit(id)
    }

    /// Every unit on the map.
    pub fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.owners.values().flat_map(Owner::units)
    }

    /// Units of the local participant.
    pub fn my_units(&self) -> impl Iterator<Item = &Unit> {
        self.me().into_iter().flat_map(Owner::units)
    }

    /// Units of every other participant.
    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> {
        let my_id = self.header.my_id;
        self.owners
            .values()
            .filter(move |owner| owner.id != my_id)
            .flat_map(Owner::units)
    }

    /// The participant controlling `objective`.
    pub fn objective_owner(&self, objective: &Objective) -> Option<&Owner> {
        self.owner(objective.owner?)
    }

    /// Units docked to `objective`.
    pub fn docked_units<'a>(&'a self, objective: &'a Objective) -> impl Iterator<Item = &'a Unit> {
        let owner = self.objective_owner(objective);
        objective
            .docked
            .iter()
            .filter_map(move |id| owner?.unit(*id))
    }

    /// The objective `unit` is attached to.
    pub fn docked_objective(&self, unit: &Unit) -> Option<&Objective> {
        self.objective(unit.docking.objective()?)
    }

    /// Every entity: units first, then objectives.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.all_units()
            .map(EntityRef::Unit)
            .chain(self.objectives().map(EntityRef::Objective))
    }

    /// First entity whose boundary touches `target`'s, ignoring the entity keyed `ignore`.
    pub fn colliding_entity(
        &self,
        target: &dyn Entity,
        ignore: Option<EntityKey>,
    ) -> Option<EntityRef<'_>> {
        self.entities()
            .filter(|entity| Some(entity.key()) != ignore)
            .find(|entity| entity.collides_with(target))
    }

    /// Entities that can block `unit` on its way to `destination`.
    ///
    /// The unit itself and any entity whose body contains `destination` are never obstacles.
    pub fn path_obstacles(&self, unit: &Unit, destination: Position) -> Vec<EntityRef<'_>> {
        let key = unit.key();
        self.entities()
            .filter(|entity| entity.key() != key && !entity.contains(destination))
            .collect()
    }

    /// Entities crossed by `unit`'s straight path to `target`.
    pub fn obstacles_between(&self, unit: &Unit, target: Position) -> Vec<EntityRef<'_>> {
        self.path_obstacles(unit, target)
            .into_iter()
            .filter(|entity| entity.blocks(unit, target))
            .collect()
    }

    /// Entities sorted by increasing distance from `from`, skipping `ignore`.
    pub fn nearby_by_distance(
        &self,
        from: Position,
        ignore: Option<EntityKey>,
    ) -> Vec<(f64, EntityRef<'_>)> {
        let mut nearby = self
            .entities()
            .filter(|entity| Some(entity.key()) != ignore)
            .map(|entity| (entity.distance_to(from), entity))
            .collect::<Vec<_>>();
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0));
        nearby
    }

    /// Units grouped by side and docking state.
    pub fn partition_units(&self) -> UnitPartition<'_> {
        UnitPartition {
            all: self.all_units().collect(),
            mine: UnitGroups::from_units(self.my_units()),
            enemies: UnitGroups::from_units(self.enemy_units()),
        }
    }

    /// Objectives grouped by control.
    pub fn objective_groups(&self) -> ObjectiveGroups<'_> {
        let my_id = self.header.my_id;
        let mut groups = ObjectiveGroups::default();
        for objective in self.objectives() {
            groups.all.push(objective);
            match objective.owner {
                None => {
                    groups.ownerless.push(objective);
                    groups.dockable.push(objective);
                }
                Some(owner) if owner == my_id => {
                    groups.mine.push(objective);
                    if !objective.is_full() {
                        groups.mine_dockable.push(objective);
                        groups.dockable.push(objective);
                    }
                }
                Some(_) => groups.enemies.push(objective),
            }
        }
        groups
    }

    /// Mean position of `units`, normalized by the map size. The origin for an empty slice.
    pub fn centroid(&self, units: &[&Unit]) -> Position {
        if units.is_empty() {
            return Position::default();
        }
        let count = units.len() as f64;
        let (sx, sy) = units.iter().fold((0.0, 0.0), |(sx, sy), unit| {
            (sx + unit.position.x, sy + unit.position.y)
        });
        let mut centroid = Position::new(sx / count, sy / count);
        if self.header.width > 0 {
            centroid.x /= f64::from(self.header.width);
        }
        if self.header.height > 0 {
            centroid.y /= f64::from(self.header.height);
        }
        centroid
    }
}
