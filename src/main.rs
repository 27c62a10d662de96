use std::env;
use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use fleet_pilot::logger::init_logger;
use fleet_pilot::prelude::*;

const BOT_NAME: &str = "FleetPilot";

/// `fleet-pilot [port]`: standard streams by default, a local TCP intermediary when a port is
/// given.
fn main() -> anyhow::Result<()> {
    let config = Configuration::from_env();

    let port = env::args()
        .nth(1)
        .map(|arg| arg.parse::<u16>().with_context(|| format!("invalid port '{arg}'")))
        .transpose()?;

    match port {
        Some(port) => {
            let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
            run(SocketTransport::connect(addr)?, config)
        }
        None => run(StreamTransport::stdio(), config),
    }
}

fn run<T: Transport>(transport: T, config: Configuration) -> anyhow::Result<()> {
    let mut game = Game::connect(transport, BOT_NAME)?;
    // the file name needs the id received during the handshake, so events logged while
    // connecting are dropped; the handshake summary is repeated once the file exists
    if config.log() {
        init_logger(game.my_id(), BOT_NAME)?;
        game.log_handshake();
    }
    Pilot::new(config, UniformScorer).play(&mut game)
}
