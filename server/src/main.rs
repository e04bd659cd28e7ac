// Parade, the card game. Hosts a table for terminal clients on TCP, joins one, or plays a solo
// game against AI players.
// Try: parade host --humans 2 --ai 1, then parade join --address 127.0.0.1:5000 twice.

use std::process::ExitCode;

mod client;
mod config;
mod deck;
mod engine;
mod error;
mod events;
mod parade;
mod player;
mod scoring;
mod session;
mod strategy;
mod table;
mod tcp_bridge;
mod types;
mod wager;

use crate::config::{Cli, Command, GameConfig, HostConfig, SoloConfig};
use crate::deck::Deck;
use crate::engine::{seating, TurnEngine};
use crate::error::ParadeError;
use crate::session::Session;
use crate::table::{ConsoleTable, Sink};

use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match Cli::parse().into_command() {
        Ok(command) => run(command).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(command: Command) -> Result<(), ParadeError> {
    match command {
        Command::Host(config) => host(config).await,
        Command::Solo(config) => solo(config).await,
        Command::Join(config) => client::run(config).await,
    }
}

async fn host(config: HostConfig) -> Result<(), ParadeError> {
    let bridge = tcp_bridge::connect_bridge(&config.host, config.port).await?;
    if bridge.port != config.port {
        info!("Port {} was taken; using {} instead.", config.port, bridge.port);
    }

    let mut session = Session::new(bridge);
    info!("Players can join on port {}.", session.port());
    let lobby = session
        .run_lobby(config.game.humans, &config.game.reserved_names())
        .await;
    if let Err(e) = lobby {
        session.abort(&e);
        session.closed().await;
        return Err(e.into());
    }

    let mut engine = new_engine(session.player_names(), &config.game);
    let played = table::play(&mut engine, &mut session, config.game.turn_timeout).await;
    match played {
        Ok(()) => session.finish(),
        Err(e) => {
            session.abort(&e);
            session.closed().await;
            return Err(e.into());
        }
    }
    session.closed().await;

    report(&engine)
}

async fn solo(config: SoloConfig) -> Result<(), ParadeError> {
    let mut engine = new_engine(vec![config.username], &config.game);
    let mut console = ConsoleTable::new(tokio::io::stdin(), std::io::stdout());

    table::play(&mut engine, &mut console, config.game.turn_timeout).await?;
    console.broadcast("Game ended.");

    report(&engine)
}

fn new_engine(humans: Vec<String>, config: &GameConfig) -> TurnEngine {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let seats = seating(humans, config.ai);
    info!(
        "Starting a game for {} players{}.",
        seats.len(),
        if config.wagers { " with wagers" } else { "" }
    );
    TurnEngine::new(seats, Deck::shuffled(&mut rng), config.wagers)
}

// Logs the result of a finished game as one JSON object.
fn report(engine: &TurnEngine) -> Result<(), ParadeError> {
    if let Some(outcome) = engine.outcome() {
        info!("Outcome: {}", serde_json::to_string(outcome)?);
    }
    Ok(())
}
