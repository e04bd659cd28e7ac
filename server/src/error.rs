// Error types. Input errors are recovered by asking again; everything else ends the session.

use thiserror::Error;

// A human's answer that cannot be applied. The engine's state is unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid choice! Please enter a number between 1 and {max}.")]
    OutOfRange { max: usize },
    #[error("Invalid choice! Please choose a different card.")]
    SameCard,
    #[error("Please enter a wager between ${minimum} and ${maximum}.")]
    WagerOutOfRange { minimum: u32, maximum: u32 },
    #[error("No choice is expected right now.")]
    NotExpected,
}

// Failures of a multi-party session. All of them are fatal to the whole game.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{name} has disconnected")]
    Disconnected { name: String },
    #[error("{name} sent {line:?} where a number was expected")]
    Protocol { name: String, line: String },
    #[error("{name} took too long to answer")]
    TimedOut { name: String },
    #[error("the connection bridge has shut down")]
    BridgeClosed,
}

impl SessionError {
    // The line broadcast to remaining players when the session is torn down.
    pub fn notice(&self) -> String {
        match self {
            SessionError::Disconnected { name }
            | SessionError::Protocol { name, .. }
            | SessionError::TimedOut { name } => {
                format!("{} has disconnected. Game ends!", name)
            }
            SessionError::BridgeClosed => "The server has stopped. Game ends!".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no free port between {first} and {last}")]
    NoFreePort { first: u16, last: u16 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a game needs between {min} and {max} players, got {got}")]
    PlayerCount { min: usize, max: usize, got: usize },
    #[error("a hosted game needs at least one human player")]
    NoHumans,
    #[error("the blackjack side bet needs at least {min} human players, got {got}")]
    WagersNeedHumans { min: usize, got: usize },
    #[error("a solo game needs between 1 and {max} AI players, got {got}")]
    SoloOpponents { max: usize, got: usize },
    #[error("usernames cannot be empty")]
    EmptyUsername,
    #[error("{0} is reserved for an AI player")]
    ReservedUsername(String),
    #[error("the turn timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Error)]
pub enum ParadeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("session aborted: {0}")]
    Session(#[from] SessionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection error: {0}")]
    Line(#[from] tokio_util::codec::LinesCodecError),
    #[error("could not encode the outcome: {0}")]
    Serialize(#[from] serde_json::Error),
}
