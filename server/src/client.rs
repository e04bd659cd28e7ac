// The terminal client for a hosted game: registers a username, prints whatever the server says
// and forwards the numbers typed by the player.

use std::io;

use crate::config::JoinConfig;
use crate::error::ParadeError;
use crate::table::CLEAR_CONSOLE;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_stream::wrappers::LinesStream;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

// The server sends a line containing this once the game is over.
const GAME_ENDED: &str = "Game ended";

pub async fn run(config: JoinConfig) -> Result<(), ParadeError> {
    let stream = TcpStream::connect(&config.address).await?;
    info!("Connected to {}.", config.address);

    let (read, write) = stream.into_split();
    let mut server = FramedRead::new(read, LinesCodec::new());
    let mut out = FramedWrite::new(write, LinesCodec::new());
    let mut stdin = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    let Some(username) = handshake(&mut server, &mut out, &mut stdin, config.username).await?
    else {
        return Ok(());
    };

    loop {
        tokio::select! {
            line = server.next() => {
                let Some(line) = line.transpose()? else {
                    info!("The server closed the connection.");
                    return Ok(());
                };
                show(&line);
                if line.contains(GAME_ENDED) {
                    return Ok(());
                }
            }

            typed = stdin.next() => {
                let Some(Ok(typed)) = typed else {
                    debug!("Input closed.");
                    return leave(&mut out, &username).await;
                };
                let typed = typed.trim();
                if typed.parse::<i64>().is_ok() {
                    out.send(typed.to_string()).await?;
                } else if !typed.is_empty() {
                    println!("Please enter a number.");
                }
            }

            _ = tokio::signal::ctrl_c() => {
                return leave(&mut out, &username).await;
            }
        }
    }
}

// Asks the server for a username until one is accepted, then prints the server's first reply.
// Names come from `preferred` first, then from `names`. Returns `None` if either side closes
// before a name is accepted.
pub async fn handshake<S, W, N>(
    server: &mut S,
    out: &mut W,
    names: &mut N,
    mut preferred: Option<String>,
) -> Result<Option<String>, ParadeError>
where
    S: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    W: Sink<String, Error = LinesCodecError> + Unpin,
    N: Stream<Item = io::Result<String>> + Unpin,
{
    loop {
        let name = match preferred.take() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                println!("Enter your username:");
                let Some(typed) = names.next().await.transpose()? else {
                    return Ok(None);
                };
                let typed = typed.trim().to_string();
                if typed.is_empty() {
                    continue;
                }
                typed
            }
        };

        out.send(name.clone()).await?;
        let Some(reply) = server.next().await.transpose()? else {
            return Ok(None);
        };

        if reply == format!("{} is taken!", name) {
            println!("{}", reply);
            continue;
        }

        show(&reply);
        return Ok(Some(name));
    }
}

async fn leave<W>(out: &mut W, username: &str) -> Result<(), ParadeError>
where
    W: Sink<String, Error = LinesCodecError> + Unpin,
{
    info!("Leaving the game.");
    out.send(format!("{} DISCONNECTED", username)).await?;
    Ok(())
}

fn show(line: &str) {
    if line == CLEAR_CONSOLE {
        print!("\x1B[2J\x1B[1;1H");
    } else {
        println!("{}", line);
    }
}
