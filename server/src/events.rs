// Types used to communicate between clients and the session. Stored in their own module to
// separate them conceptually from the TCP bridge that ferries them from remote terminals.

use std::collections::HashMap;

use log::debug;
use tokio::sync::mpsc;

// Unique ID used to identify a connection from the session.
pub type ClientId = String;

// A connection's first message is its reply channel; after that come its lines, and finally a
// disconnect notice when the socket closes.
#[derive(Debug)]
pub enum ClientEventPayload {
    Connect(LineSender),
    Line(String),
    Disconnect,
}

// The data sent from a client to the session.
#[derive(Debug)]
pub struct ClientEvent {
    pub id: ClientId,
    pub payload: ClientEventPayload,
}

// An async iterator over messages that clients might send.
pub type ClientEventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

pub type ClientEventSender = mpsc::UnboundedSender<ClientEvent>;

// An async transmitter used to send lines to a client. Dropping it closes the connection once
// pending lines are written.
pub type LineSender = mpsc::UnboundedSender<String>;

// The reply channels of every live connection.
#[derive(Debug, Default)]
pub struct ClientMap {
    senders: HashMap<ClientId, LineSender>,
}

impl ClientMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, id: &ClientId, tx: LineSender) {
        self.senders.insert(id.clone(), tx);
    }

    // Forgets the client; their connection closes once its queue drains.
    pub fn remove_client(&mut self, id: &ClientId) {
        self.senders.remove(id);
    }

    pub fn send(&self, id: &ClientId, line: &str) {
        let Some(tx) = self.senders.get(id) else {
            debug!("No channel for [client {}].", id);
            return;
        };

        if tx.send(line.to_string()).is_err() {
            debug!("Channel to [client {}] already closed.", id);
        }
    }

    pub fn close_all(&mut self) {
        self.senders.clear();
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.senders.keys().cloned().collect()
    }
}
