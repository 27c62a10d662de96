//! Turn orchestration: score objectives, assign free units, turn pairs into orders.

use tracing::{debug, info, info_span, instrument};

use crate::assignment::assign;
use crate::clock::TurnClock;
use crate::command::Command;
use crate::configuration::Configuration;
use crate::entity::{Entity, Objective, Unit, MIN_APPROACH_DISTANCE};
use crate::features::{objective_features, ObjectiveScorer};
use crate::game::Game;
use crate::navigation::Navigator;
use crate::transport::Transport;
use crate::world::World;

/// Plays a whole game with one scorer.
#[derive(Debug, Clone)]
pub struct Pilot<S> {
    config: Configuration,
    scorer: S,
    navigator: Navigator,
}

impl<S: ObjectiveScorer> Pilot<S> {
    /// A pilot using `scorer` for the target distribution.
    pub fn new(config: Configuration, scorer: S) -> Self {
        Self {
            config,
            scorer,
            navigator: Navigator::from_config(&config),
        }
    }

    /// Runs turns until the engine closes the stream.
    pub fn play<T: Transport>(&self, game: &mut Game<T>) -> anyhow::Result<()> {
        loop {
            game.update()?;
            if game.is_done() {
                break;
            }
            let _span = info_span!("turn", turn = game.turn()).entered();
            let commands = self.plan_turn(game.world());
            game.send(&commands)?;
        }
        info!(turns = game.turn(), "game over");
        Ok(())
    }

    /// Orders for one turn.
    ///
    /// Every unit that gets an objective receives exactly one order; units left out by a
    /// budget break receive none.
    #[instrument(skip_all)]
    pub fn plan_turn(&self, world: &World) -> Vec<Command> {
        let units = world.partition_units();
        let clock = TurnClock::for_fleet(&self.config, units.mine.all.len());
        let objectives = world.objective_groups();

        let features = objective_features(world);
        let distribution = self.scorer.score(&features);
        let pairs = assign(&units.mine.undocked, &objectives.all, &distribution, &clock);

        let navigation_clock = clock.with_limit(self.config.navigation_cutoff);
        let commands = pairs
            .into_iter()
            .map(|(unit, objective)| self.order(world, unit, objective, &navigation_clock))
            .collect::<Vec<_>>();
        debug!(
            orders = commands.len(),
            my_centroid = ?world.centroid(&units.mine.all),
            enemy_centroid = ?world.centroid(&units.enemies.all),
            elapsed = ?clock.elapsed(),
            "turn planned"
        );
        commands
    }

    fn order(
        &self,
        world: &World,
        unit: &Unit,
        objective: &Objective,
        clock: &TurnClock,
    ) -> Command {
        let friendly = objective.owner.map_or(true, |owner| owner == world.my_id());
        let destination = if friendly {
            if unit.can_dock(objective) {
                return unit.dock(objective);
            }
            objective.approach_point(unit.position, MIN_APPROACH_DISTANCE)
        } else {
            match weakest_docked(world, objective) {
                Some(target) => target.approach_point(unit.position, MIN_APPROACH_DISTANCE),
                None => objective.approach_point(unit.position, MIN_APPROACH_DISTANCE),
            }
        };
        self.navigator
            .navigate_or_thrust(unit, destination, world, clock)
            .command(unit)
    }
}

fn weakest_docked<'w>(world: &'w World, objective: &'w Objective) -> Option<&'w Unit> {
    world
        .docked_units(objective)
        .min_by_key(|unit| (unit.health, unit.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::UniformScorer;
    use crate::parser::parse_line;
    use crate::world::GameHeader;

    const HEADER: GameHeader = GameHeader {
        my_id: 0,
        width: 100,
        height: 100,
    };

    fn pilot() -> Pilot<UniformScorer> {
        Pilot::new(Configuration::new().with_log(false), UniformScorer)
    }

    #[test]
    fn far_unit_flies_to_the_objective() {
        let world = parse_line(
            HEADER,
            "2 0 1 0 10 10 255 0 0 0 0 0 1 0 1 0 90 90 1000 1 0 1000 0 0 2 0",
        )
        .unwrap();
        let commands = pilot().plan_turn(&world);
        assert_eq!(commands, vec![Command::thrust(0, 7.0, 45)]);
    }

    #[test]
    fn close_unit_docks() {
        let world = parse_line(
            HEADER,
            "1 0 1 3 20 12 255 0 0 0 0 0 1 2 20 20 1000 5 0 1000 0 0 2 0",
        )
        .unwrap();
        let commands = pilot().plan_turn(&world);
        assert_eq!(
            commands,
            vec![Command::Dock {
                unit: 3,
                objective: 2
            }]
        );
    }

    #[test]
    fn enemy_objective_targets_its_weakest_docked_unit() {
        // enemy units 0 (health 200) and 1 (health 50) docked to objective 0 at (50,50)
        let world = parse_line(
            HEADER,
            "2 0 1 0 10 50 255 0 0 0 0 0 \
             1 2 0 50 56 200 0 0 2 0 0 1 50 44 50 0 0 2 0 0 \
             1 0 50 50 1000 5 0 1000 1 1 3 2 0 1",
        )
        .unwrap();
        let objective = world.objective(0).unwrap();
        assert_eq!(weakest_docked(&world, objective).unwrap().id, 1);

        let commands = pilot().plan_turn(&world);
        assert_eq!(commands.len(), 1);
        let Command::Thrust { unit, speed, angle } = commands[0] else {
            panic!("expected thrust, got {:?}", commands[0]);
        };
        assert_eq!(unit, 0);
        assert_eq!(speed, 7);
        // heading for (50,44) from (10,50) is slightly below the x axis
        assert!(angle > 350, "{angle}");
    }

    #[test]
    fn docked_units_get_no_orders() {
        let world = parse_line(
            HEADER,
            "1 0 1 0 20 10 255 0 0 2 2 0 1 2 20 20 1000 5 0 1000 1 0 2 1 0",
        )
        .unwrap();
        assert!(pilot().plan_turn(&world).is_empty());
    }
}
