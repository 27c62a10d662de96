//! # Fleet Pilot
//!
//! A client for a turn-based space strategy engine that speaks a line protocol: one state line
//! in, one order line out, every turn.
//!
//! It provides:
//! - The turn-synchronized session (`Game`) over standard streams or a TCP intermediary
//! - A strict state parser producing a cross-referenced world snapshot (`World`)
//! - Plane geometry and collision checks
//! - A deadline-aware navigation planner (`Navigator`)
//! - A deadline-aware greedy assignment of units to objectives (`assign`)
//! - Per-objective features and the `ObjectiveScorer` boundary that turns them into a target
//!   distribution
//!
//! Everything runs on one thread. The only blocking point is the transport read; every other
//! stage is pure computation on the turn's snapshot, bounded by a shared [`TurnClock`].
//!
//! # Documentation Overview
//!
//! - For the handshake, turn and end-of-stream states, see the [`game`] module.
//! - For the wire format of states, see the [`parser`] module; for orders, [`command`].
//! - For tuning deadlines and search limits, see
//!   [`Configuration`](crate::configuration::Configuration).
//! - To plug another objective policy, implement
//!   [`ObjectiveScorer`](crate::features::ObjectiveScorer).
//!
//! # Usage Example
//!
//! ```no_run
//! use fleet_pilot::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Configuration::from_env();
//!     let mut game = Game::connect(StreamTransport::stdio(), "MyPilot")?;
//!
//!     let pilot = Pilot::new(config, UniformScorer);
//!     pilot.play(&mut game)
//! }
//! ```
//!
//! # Custom Policy
//!
//! The turn loop can also be driven by hand:
//!
//! ```no_run
//! use fleet_pilot::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut game = Game::connect(StreamTransport::stdio(), "Rusher")?;
//!     let navigator = Navigator::from_config(&Configuration::new());
//!
//!     loop {
//!         game.update()?;
//!         if game.is_done() {
//!             return Ok(());
//!         }
//!         let world = game.world();
//!         let clock = TurnClock::start(std::time::Duration::from_millis(1500));
//!         let target = world.objectives().next().map(|objective| objective.position);
//!
//!         let mut commands = Vec::new();
//!         if let Some(target) = target {
//!             for unit in world.my_units().filter(|unit| unit.docking.is_undocked()) {
//!                 let motion = navigator.navigate_or_thrust(unit, target, world, &clock);
//!                 commands.push(motion.command(unit));
//!             }
//!         }
//!         game.send(&commands)?;
//!     }
//! }
//! ```
#![warn(missing_docs)]

pub use anyhow;

pub mod assignment;
pub mod clock;
pub mod command;
pub mod configuration;
pub mod entity;
pub mod features;
pub mod game;
pub mod geometry;
pub mod logger;
pub mod navigation;
pub mod parser;
pub mod pilot;
pub mod transport;
pub mod world;

pub use clock::TurnClock;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use fleet_pilot::prelude::*;
/// ```
pub mod prelude {
    pub use crate::assignment::assign;
    pub use crate::clock::TurnClock;
    pub use crate::command::Command;
    pub use crate::configuration::Configuration;
    pub use crate::entity::{DockingState, Entity, Objective, Owner, Unit};
    pub use crate::features::{objective_features, FeatureMatrix, ObjectiveScorer, UniformScorer};
    pub use crate::game::Game;
    pub use crate::geometry::Position;
    pub use crate::navigation::{Motion, Navigator};
    pub use crate::pilot::Pilot;
    pub use crate::transport::{SocketTransport, StreamTransport, Transport};
    pub use crate::world::World;
}
