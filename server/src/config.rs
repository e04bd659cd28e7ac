// Command line parsing. Arguments are read once at startup and validated into an explicit config
// value that is handed to the session and engine.

use std::time::Duration;

use crate::engine::MAX_PLAYERS;
use crate::error::ConfigError;
use crate::player::automated_name;

use clap::{Args, Parser, Subcommand};

pub const MIN_PLAYERS: usize = 2;
pub const DEFAULT_PORT: u16 = 5000;

// Wagers are only settled between humans, so a lone human could never win or lose one.
pub const MIN_WAGER_HUMANS: usize = 2;

#[derive(Debug, Parser)]
#[command(name = "parade")]
#[command(about = "The Parade card game: host a table, join one, or play solo")]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Host a game for players joining over TCP
    Host(HostArgs),
    /// Play alone against AI players in this terminal
    Solo(SoloArgs),
    /// Join a hosted game
    Join(JoinArgs),
}

#[derive(Debug, Args)]
pub struct HostArgs {
    /// Number of human players to wait for
    #[arg(long, default_value_t = 2)]
    pub humans: usize,

    /// Number of AI players, seated after the humans
    #[arg(long, default_value_t = 0)]
    pub ai: usize,

    /// Play the blackjack side bet alongside the parade
    #[arg(long)]
    pub blackjack: bool,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on; the next free port is used if it is taken
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seed for a reproducible deck
    #[arg(long)]
    pub seed: Option<u64>,

    /// Seconds a player may take to answer before the game is abandoned
    #[arg(long)]
    pub turn_timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SoloArgs {
    /// Your name at the table
    #[arg(long, short)]
    pub username: String,

    /// Number of AI opponents
    #[arg(long, default_value_t = 1)]
    pub ai: usize,

    /// Seed for a reproducible deck
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct JoinArgs {
    /// Address of the hosting server
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub address: String,

    /// Name to ask for; prompted on stdin when missing or taken
    #[arg(long, short)]
    pub username: Option<String>,
}

// What every game needs, whichever way its humans are connected.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub humans: usize,
    pub ai: usize,
    pub wagers: bool,
    pub seed: Option<u64>,
    pub turn_timeout: Option<Duration>,
}

impl GameConfig {
    // Names the AI players of this game will use. Humans may not take them.
    pub fn reserved_names(&self) -> Vec<String> {
        (1..=self.ai).map(automated_name).collect()
    }
}

#[derive(Debug, PartialEq)]
pub struct HostConfig {
    pub game: GameConfig,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, PartialEq)]
pub struct SoloConfig {
    pub game: GameConfig,
    pub username: String,
}

#[derive(Debug, PartialEq)]
pub struct JoinConfig {
    pub address: String,
    pub username: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Host(HostConfig),
    Solo(SoloConfig),
    Join(JoinConfig),
}

impl Cli {
    pub fn into_command(self) -> Result<Command, ConfigError> {
        match self.mode {
            Mode::Host(args) => {
                if args.humans == 0 {
                    return Err(ConfigError::NoHumans);
                }
                let game = GameConfig {
                    humans: args.humans,
                    ai: args.ai,
                    wagers: args.blackjack,
                    seed: args.seed,
                    turn_timeout: timeout(args.turn_timeout)?,
                };
                check_player_count(&game)?;
                if game.wagers && game.humans < MIN_WAGER_HUMANS {
                    return Err(ConfigError::WagersNeedHumans {
                        min: MIN_WAGER_HUMANS,
                        got: game.humans,
                    });
                }

                Ok(Command::Host(HostConfig {
                    game,
                    host: args.host,
                    port: args.port,
                }))
            }

            Mode::Solo(args) => {
                let max = MAX_PLAYERS - 1;
                if !(1..=max).contains(&args.ai) {
                    return Err(ConfigError::SoloOpponents { max, got: args.ai });
                }
                let game = GameConfig {
                    humans: 1,
                    ai: args.ai,
                    wagers: false,
                    seed: args.seed,
                    turn_timeout: None,
                };
                let username = check_username(&args.username, &game.reserved_names())?;

                Ok(Command::Solo(SoloConfig { game, username }))
            }

            Mode::Join(args) => Ok(Command::Join(JoinConfig {
                address: args.address,
                username: args.username,
            })),
        }
    }
}

fn check_player_count(game: &GameConfig) -> Result<(), ConfigError> {
    let got = game.humans + game.ai;
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&got) {
        return Err(ConfigError::PlayerCount {
            min: MIN_PLAYERS,
            max: MAX_PLAYERS,
            got,
        });
    }
    Ok(())
}

fn timeout(seconds: Option<u64>) -> Result<Option<Duration>, ConfigError> {
    match seconds {
        Some(0) => Err(ConfigError::ZeroTimeout),
        other => Ok(other.map(Duration::from_secs)),
    }
}

// Returns the trimmed name, if it is usable.
pub fn check_username(name: &str, reserved: &[String]) -> Result<String, ConfigError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyUsername);
    }
    if reserved.iter().any(|r| r == name) {
        return Err(ConfigError::ReservedUsername(name.to_string()));
    }
    Ok(name.to_string())
}
