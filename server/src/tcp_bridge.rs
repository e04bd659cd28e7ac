// Provides functions that transmit lines of text to and from TCP connections. Allows the session
// to communicate with remote terminals via abstract channels.

use crate::error::BridgeError;
use crate::events;

use futures_util::SinkExt;
use futures_util::StreamExt;
use log::{debug, error, info};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use unique_id::random::RandomGenerator;
use unique_id::Generator;

// How many consecutive ports are tried before giving up.
pub const PORT_ATTEMPTS: u16 = 100;

// Longest line accepted from a client. Longer lines are dropped.
const MAX_LINE_LENGTH: usize = 1024;

// The receiving end of every connection, plus handles to stop the tasks behind it.
pub struct Bridge {
    pub events: events::ClientEventReceiver,
    // The port actually bound, which may be above the one asked for.
    pub port: u16,
    accepting: CancellationToken,
    connections: CancellationToken,
    writers: TaskTracker,
}

impl Bridge {
    // Closes the listening socket. Live connections are unaffected.
    pub fn stop_accepting(&self) {
        self.accepting.cancel();
    }

    // Stops listening and stops reading from every connection. Connections close as soon as their
    // reply channels are dropped and their pending lines are written.
    pub fn shutdown(&self) {
        self.accepting.cancel();
        self.connections.cancel();
    }

    // Resolves once every connection has written its last line. Only meaningful after the
    // session has dropped its reply channels.
    pub async fn flushed(&self) {
        self.writers.close();
        self.writers.wait().await;
    }
}

// Binds `host` at `port`, or at the next free port above it, and starts accepting connections.
// Each connection is announced with a "connect" event carrying its reply channel.
pub async fn connect_bridge(host: &str, port: u16) -> Result<Bridge, BridgeError> {
    debug_assert!(!host.is_empty());

    let listener = bind_from(host, port).await?;
    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(_) => port,
    };
    info!("Listening on {}:{}.", host, port);

    let (tx, rx) = mpsc::unbounded_channel();
    let accepting = CancellationToken::new();
    let connections = CancellationToken::new();
    let writers = TaskTracker::new();

    let stop = accepting.clone();
    let readers = connections.clone();
    let tracker = writers.clone();
    tokio::spawn(async move {
        loop {
            let accepted = tokio::select! {
                _ = stop.cancelled() => {
                    info!("No longer accepting connections.");
                    return;
                }
                accepted = listener.accept() => accepted,
            };

            // Establish the TCP connection.
            let (stream, client_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Couldn't accept TCP connection: {}", e);
                    continue;
                }
            };

            // Guaranteed to be unique amongst all threads.
            let client_id = RandomGenerator::default().next_id().to_string();
            info!("[client {}] connected from {}.", client_id, client_addr);

            init_client_socket(stream, client_id, tx.clone(), readers.clone(), &tracker);
        }
    });

    Ok(Bridge {
        events: rx,
        port,
        accepting,
        connections,
        writers,
    })
}

async fn bind_from(host: &str, first: u16) -> Result<TcpListener, BridgeError> {
    let mut last = first;
    for offset in 0..PORT_ATTEMPTS {
        let Some(port) = first.checked_add(offset) else {
            break;
        };
        last = port;

        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => info!("Port {} is unavailable ({}), trying the next one.", port, e),
        }
    }

    Err(BridgeError::NoFreePort { first, last })
}

// Spawns two non-blocking tasks:
//   1) A task that forwards lines from the client as events for the session, and
//   2) A task that writes lines from the session back to the client.
//
// Before doing anything else, the former task sends a "connect" event whose payload the session
// uses to reach the latter task.
fn init_client_socket(
    stream: TcpStream,
    client_id: events::ClientId,
    event_tx: events::ClientEventSender,
    stop: CancellationToken,
    writers: &TaskTracker,
) {
    let (read, write) = stream.into_split();
    let mut read = FramedRead::new(read, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let mut write = FramedWrite::new(write, LinesCodec::new());

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let reader_id = client_id.clone();
    tokio::spawn(async move {
        let client_id = reader_id;

        // If we can't get replies back, abort immediately.
        let connect = events::ClientEvent {
            id: client_id.clone(),
            payload: events::ClientEventPayload::Connect(line_tx),
        };
        if event_tx.send(connect).is_err() {
            error!("Couldn't send reply channel for [client {}].", client_id);
            return;
        }

        loop {
            let next = tokio::select! {
                _ = stop.cancelled() => {
                    debug!("Stopped reading from [client {}].", client_id);
                    return;
                }
                next = read.next() => next,
            };

            let payload = match next {
                Some(Ok(line)) => events::ClientEventPayload::Line(line),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    error!("Overlong line sent from [client {}].", client_id);
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) => {
                    info!("Connection to [client {}] failed: {}", client_id, e);
                    events::ClientEventPayload::Disconnect
                }
                None => {
                    info!("Connection closed by [client {}].", client_id);
                    events::ClientEventPayload::Disconnect
                }
            };

            let done = matches!(payload, events::ClientEventPayload::Disconnect);
            let event = events::ClientEvent {
                id: client_id.clone(),
                payload,
            };
            if event_tx.send(event).is_err() {
                debug!("Channel to [client {}] closed by the session.", client_id);
                return;
            }
            if done {
                return;
            }
        }
    });

    // Runs until the session drops the reply channel, then closes our half of the socket.
    writers.spawn(async move {
        while let Some(line) = line_rx.recv().await {
            if let Err(e) = write.send(line).await {
                error!("Failed to send line to [client {}]: {}", client_id, e);
                return;
            }
        }

        debug!("Channel to [client {}] closed by the session.", client_id);
        if let Err(e) = SinkExt::<String>::close(&mut write).await {
            debug!("Couldn't shut down [client {}]: {}", client_id, e);
        }
    });
}
