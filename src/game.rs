//! Handshake and turn loop over a [`Transport`].
//!
//! A [`Game`] moves through three phases:
//!
//! - **handshake** ([`Game::connect`]): reads the self id and map size, parses the first state
//!   line and keeps it as the initial snapshot;
//! - **turn** ([`Game::update`] then [`Game::send`]): the first update announces the bot name,
//!   every update reads and parses one state line;
//! - **closed**: an empty read ends the game, the last world stays available.

use std::fmt::Display;

use anyhow::{bail, Context};
use tracing::{debug, info, instrument};

use crate::command::serialize;
use crate::entity::OwnerId;
use crate::parser::parse_line;
use crate::transport::Transport;
use crate::world::{GameHeader, World};

/// A game session bound to one transport.
#[derive(Debug)]
pub struct Game<T> {
    transport: T,
    name: String,
    world: World,
    initial_world: World,
    announce_name: bool,
    sent_this_turn: bool,
    done: bool,
    turn: u64,
}

impl<T: Transport> Game<T> {
    /// Performs the handshake.
    ///
    /// The name is not sent here: it goes out as the output of the first [`Game::update`].
    #[instrument(skip(transport))]
    pub fn connect(mut transport: T, name: &str) -> anyhow::Result<Self> {
        let my_id = transport
            .read_line()
            .context("handshake: reading self id")?
            .trim()
            .parse::<OwnerId>()
            .context("handshake: invalid self id")?;
        let size_line = transport
            .read_line()
            .context("handshake: reading map size")?;
        let (width, height) = parse_size(&size_line)?;

        let header = GameHeader {
            my_id,
            width,
            height,
        };
        let mut game = Self {
            transport,
            name: name.to_owned(),
            world: World::new(header),
            initial_world: World::new(header),
            announce_name: false,
            sent_this_turn: true,
            done: false,
            turn: 0,
        };
        game.update().context("handshake: reading initial state")?;
        game.initial_world = game.world.clone();
        game.announce_name = true;
        game.sent_this_turn = true;
        game.turn = 0;

        game.log_handshake();
        Ok(game)
    }

    /// Logs the handshake summary: own id, map size and initial objective count.
    ///
    /// Called again by binaries that install their subscriber only once the id is known.
    pub fn log_handshake(&self) {
        let header = self.initial_world.header();
        info!(
            my_id = header.my_id,
            width = header.width,
            height = header.height,
            objectives = self.initial_world.objectives().count(),
            "handshake complete"
        );
    }

    /// Reads the next state line and returns the world it describes.
    ///
    /// Sends the bot name first if this is the first turn. When the engine has closed the
    /// stream, the game becomes done and the previous world is returned unchanged.
    pub fn update(&mut self) -> anyhow::Result<&World> {
        if self.done {
            return Ok(&self.world);
        }
        if self.announce_name {
            self.transport
                .write_line(&self.name)
                .context("announcing bot name")?;
            self.announce_name = false;
        }

        let line = self.transport.read_line()?;
        if line.trim().is_empty() {
            info!(turn = self.turn, "engine closed the stream");
            self.done = true;
            return Ok(&self.world);
        }

        self.world = parse_line(self.world.header(), &line)
            .with_context(|| format!("parsing state of turn {}", self.turn + 1))?;
        self.turn += 1;
        self.sent_this_turn = false;
        debug!(turn = self.turn, "state received");
        Ok(&self.world)
    }

    /// Sends this turn's orders as one line.
    ///
    /// Does nothing once the game is done. Sending twice in the same turn is an error.
    pub fn send<C: Display>(&mut self, commands: &[C]) -> anyhow::Result<()> {
        if self.done {
            return Ok(());
        }
        if self.sent_this_turn {
            bail!("orders already sent for turn {}", self.turn);
        }
        self.transport
            .write_line(&serialize(commands))
            .with_context(|| format!("sending orders of turn {}", self.turn))?;
        self.sent_this_turn = true;
        debug!(turn = self.turn, count = commands.len(), "orders sent");
        Ok(())
    }

    /// True once the engine closed the stream.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The latest world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world as it was at the end of the handshake.
    pub fn initial_world(&self) -> &World {
        &self.initial_world
    }

    /// Own participant id.
    pub fn my_id(&self) -> OwnerId {
        self.world.my_id()
    }

    /// Number of state lines parsed since the handshake.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn parse_size(line: &str) -> anyhow::Result<(u32, u32)> {
    let mut tokens = line.split_whitespace();
    let mut next = |field: &str| -> anyhow::Result<u32> {
        tokens
            .next()
            .with_context(|| format!("handshake: missing map {field}"))?
            .parse::<u32>()
            .with_context(|| format!("handshake: invalid map {field}"))
    };
    let width = next("width")?;
    let height = next("height")?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::command::Command;
    use crate::transport::StreamTransport;

    const STATE: &str = "1 0 1 0 10 10 255 0 0 0 0 0 1 0 90 90 1000 1 0 1000 0 0 2 0";

    fn session(input: &str) -> Game<StreamTransport<Cursor<String>, Vec<u8>>> {
        let transport = StreamTransport::new(Cursor::new(input.to_owned()), Vec::new());
        Game::connect(transport, "Pilot").unwrap()
    }

    fn output(game: &Game<StreamTransport<Cursor<String>, Vec<u8>>>) -> String {
        String::from_utf8(game.transport().writer().clone()).unwrap()
    }

    #[test]
    fn handshake_reads_header_and_initial_state() {
        let game = session(&format!("0\n100 80\n{STATE}\n"));
        assert_eq!(game.my_id(), 0);
        assert_eq!(game.world().width(), 100);
        assert_eq!(game.world().height(), 80);
        assert_eq!(game.initial_world(), game.world());
        assert_eq!(game.turn(), 0);
        assert!(output(&game).is_empty());
    }

    #[test]
    fn first_update_announces_the_name() {
        let mut game = session(&format!("0\n100 80\n{STATE}\n{STATE}\n"));
        game.update().unwrap();
        assert_eq!(game.turn(), 1);
        game.send(&[Command::thrust(0, 7.0, 45)]).unwrap();
        assert_eq!(output(&game), "Pilot\nt 0 7 45\n");
    }

    #[test]
    fn second_send_in_a_turn_fails() {
        let mut game = session(&format!("0\n100 80\n{STATE}\n{STATE}\n"));
        game.update().unwrap();
        game.send::<Command>(&[]).unwrap();
        assert!(game.send::<Command>(&[]).is_err());
    }

    #[test]
    fn empty_line_closes_the_game() {
        let mut game = session(&format!("0\n100 80\n{STATE}\n{STATE}\n\n"));
        game.update().unwrap();
        game.send::<Command>(&[]).unwrap();
        let world = game.update().unwrap().clone();
        assert!(game.is_done());
        assert_eq!(&world, game.initial_world());
        game.send(&[Command::Undock { unit: 0 }]).unwrap();
        assert_eq!(output(&game), "Pilot\n\n");
    }

    #[test]
    fn bad_handshake_is_an_error() {
        let transport = StreamTransport::new(Cursor::new("x\n".to_owned()), Vec::new());
        assert!(Game::connect(transport, "Pilot").is_err());
        let transport = StreamTransport::new(Cursor::new("0\n100\n".to_owned()), Vec::new());
        assert!(Game::connect(transport, "Pilot").is_err());
    }
}
