// Where the engine's output goes and where human answers come from. A network session and the
// local console are both tables; `play` drives a game on either.

use std::io::Write;
use std::time::Duration;

use crate::engine::TurnEngine;
use crate::error::SessionError;

use futures_util::StreamExt;
use log::{debug, info};
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};

// Sent on a line of its own: the receiving terminal should clear the screen.
pub const CLEAR_CONSOLE: &str = "CLEAR_CONSOLE";

const CLEAR_SEQUENCE: &str = "\x1B[2J\x1B[1;1H";

// Receives everything the engine has to say. Players are addressed by name.
pub trait Sink {
    fn broadcast(&mut self, line: &str);
    fn tell(&mut self, player: &str, line: &str);
    fn clear(&mut self);
}

pub trait Table: Sink {
    // Waits for the named human's next answer. Gives up after `timeout`, if one is set.
    async fn await_choice(
        &mut self,
        player: &str,
        timeout: Option<Duration>,
    ) -> Result<i64, SessionError>;
}

// Runs the engine until the game is over, relaying every human decision through `table`. An
// answer the engine rejects is reported to its sender, who is asked again.
pub async fn play<T: Table>(
    engine: &mut TurnEngine,
    table: &mut T,
    timeout: Option<Duration>,
) -> Result<(), SessionError> {
    while let Some(request) = engine.next_request(table) {
        let name = engine.players()[request.seat].name.clone();
        for line in engine.prompt(&request) {
            table.tell(&name, &line);
        }

        let answer = table.await_choice(&name, timeout).await?;
        if let Err(e) = engine.submit(answer, table) {
            debug!("Rejected answer {} from {}: {}", answer, name, e);
            table.tell(&name, &e.to_string());
        }
    }

    info!("Game over after {} rounds", engine.round());
    Ok(())
}

// A single local human playing through a terminal.
pub struct ConsoleTable<R, W> {
    lines: FramedRead<R, LinesCodec>,
    out: W,
}

impl<R: AsyncRead + Unpin, W: Write> ConsoleTable<R, W> {
    pub fn new(input: R, out: W) -> Self {
        ConsoleTable {
            lines: FramedRead::new(input, LinesCodec::new()),
            out,
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            debug!("Couldn't write to the console: {}", e);
        }
    }

    async fn next_number(&mut self, player: &str) -> Result<i64, SessionError> {
        loop {
            let Some(Ok(line)) = self.lines.next().await else {
                info!("Console input closed.");
                return Err(SessionError::Disconnected {
                    name: player.to_string(),
                });
            };

            match line.trim().parse() {
                Ok(n) => return Ok(n),
                Err(_) => self.write("Please enter a number."),
            }
        }
    }
}

impl<R: AsyncRead + Unpin, W: Write> Sink for ConsoleTable<R, W> {
    fn broadcast(&mut self, line: &str) {
        self.write(line);
    }

    // Only one person is reading.
    fn tell(&mut self, _player: &str, line: &str) {
        self.write(line);
    }

    fn clear(&mut self) {
        if let Err(e) = write!(self.out, "{}", CLEAR_SEQUENCE).and_then(|_| self.out.flush()) {
            debug!("Couldn't clear the console: {}", e);
        }
    }
}

impl<R: AsyncRead + Unpin, W: Write> Table for ConsoleTable<R, W> {
    async fn await_choice(
        &mut self,
        player: &str,
        timeout: Option<Duration>,
    ) -> Result<i64, SessionError> {
        let Some(limit) = timeout else {
            return self.next_number(player).await;
        };

        tokio::time::timeout(limit, self.next_number(player))
            .await
            .map_err(|_| SessionError::TimedOut {
                name: player.to_string(),
            })?
    }
}

// Records everything said at a table, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Transcript {
    // (recipient, line); `None` for broadcasts.
    pub lines: Vec<(Option<String>, String)>,
    pub clears: usize,
}

#[cfg(test)]
impl Transcript {
    pub fn saw(&self, line: &str) -> bool {
        self.lines.iter().any(|(to, l)| to.is_none() && l == line)
    }

    pub fn told(&self, player: &str, line: &str) -> bool {
        self.lines
            .iter()
            .any(|(to, l)| to.as_deref() == Some(player) && l == line)
    }
}

#[cfg(test)]
impl Sink for Transcript {
    fn broadcast(&mut self, line: &str) {
        self.lines.push((None, line.to_string()));
    }

    fn tell(&mut self, player: &str, line: &str) {
        self.lines.push((Some(player.to_string()), line.to_string()));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
