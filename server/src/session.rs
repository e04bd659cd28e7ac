// The top-level instance of a networked Parade game. Owns every connection, registers usernames
// in the lobby, and relays the engine's requests to the right player during the game.

use std::time::Duration;

use crate::error::SessionError;
use crate::events;
use crate::events::ClientEventPayload::{Connect, Disconnect, Line};
use crate::table::{Sink, Table, CLEAR_CONSOLE};
use crate::tcp_bridge::Bridge;

use log::{debug, error, info};

// Follows the player's name in the courtesy line a client sends before hanging up.
const DISCONNECT_NOTICE: &str = "DISCONNECTED";

const CLOSE_GRACE: Duration = Duration::from_secs(5);

pub struct Session {
    bridge: Bridge,
    clients: events::ClientMap,

    // The client IDs and usernames of registered players, in seating order. There can be clients
    // who aren't players, for example while they are still picking a free name.
    players: Vec<(events::ClientId, String)>,
}

impl Session {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            clients: events::ClientMap::new(),
            players: Vec::new(),
        }
    }

    pub fn port(&self) -> u16 {
        self.bridge.port
    }

    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|(_, name)| name.clone()).collect()
    }

    // Accepts connections until `seats` players have registered a username. The first line a
    // client sends is its username; names already in use or in `reserved` are refused and the
    // client may try again.
    pub async fn run_lobby(
        &mut self,
        seats: usize,
        reserved: &[String],
    ) -> Result<(), SessionError> {
        info!("Waiting for {} players on port {}.", seats, self.bridge.port);

        while self.players.len() < seats {
            let Some(events::ClientEvent { id, payload }) = self.bridge.events.recv().await else {
                return Err(SessionError::BridgeClosed);
            };

            match payload {
                // New response channel received.
                Connect(tx) => {
                    self.clients.add_client(&id, tx);
                    debug!("[client {}] connected to the lobby.", id);
                }

                Disconnect => self.drop_client(&id)?,

                // Registered players have nothing to say until the game starts.
                Line(line) if self.player_index(&id).is_some() => {
                    if self.is_disconnect_notice(&id, &line) {
                        self.drop_client(&id)?;
                    }
                }

                Line(line) => {
                    let name = line.trim();
                    if name.is_empty() {
                        continue;
                    }

                    if self.is_taken(name) || reserved.iter().any(|r| r == name) {
                        info!("[client {}] asked for taken name {}.", id, name);
                        self.clients.send(&id, &format!("{} is taken!", name));
                        continue;
                    }

                    info!("[client {}] joined as {}.", id, name);
                    self.players.push((id, name.to_string()));
                    self.broadcast(&format!("{} joined the game!", name));
                    if self.players.len() < seats {
                        self.broadcast("waiting for more players to join...");
                    }
                }
            }
        }

        self.bridge.stop_accepting();
        self.broadcast("All players have joined!");
        self.clear();

        // Anyone still choosing a name is too late.
        for id in self.clients.ids() {
            if self.player_index(&id).is_none() {
                self.clients.send(&id, "The game is full.");
                self.clients.remove_client(&id);
            }
        }

        info!("Lobby full: {}", self.player_names().join(", "));
        Ok(())
    }

    // Ends the game for everyone after a fatal error.
    pub fn abort(&mut self, reason: &SessionError) {
        error!("Aborting session: {}", reason);
        self.broadcast(&reason.notice());
        self.finish();
    }

    // Says goodbye and closes every connection once its pending lines are written.
    pub fn finish(&mut self) {
        self.broadcast("Game ended.");
        self.clients.close_all();
        self.bridge.shutdown();
        info!("Session closed.");
    }

    // Waits, for a bounded time, until the goodbye lines have reached every connection.
    pub async fn closed(&self) {
        if tokio::time::timeout(CLOSE_GRACE, self.bridge.flushed())
            .await
            .is_err()
        {
            error!("Gave up waiting for connections to close.");
        }
    }

    fn player_index(&self, id: &events::ClientId) -> Option<usize> {
        self.players.iter().position(|(i, _)| i == id)
    }

    fn client_of(&self, name: &str) -> Option<&events::ClientId> {
        self.players
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id)
    }

    fn is_taken(&self, name: &str) -> bool {
        self.client_of(name).is_some()
    }

    // True only for "<name> DISCONNECTED" from the registered player `name`.
    fn is_disconnect_notice(&self, id: &events::ClientId, line: &str) -> bool {
        match self.player_index(id) {
            Some(i) => line.trim() == format!("{} {}", self.players[i].1, DISCONNECT_NOTICE),
            None => false,
        }
    }

    // Forgets a departing client. Fatal if they had already registered.
    fn drop_client(&mut self, id: &events::ClientId) -> Result<(), SessionError> {
        self.clients.remove_client(id);
        match self.player_index(id) {
            Some(i) => {
                info!("Player [client {}] disconnected.", id);
                Err(SessionError::Disconnected {
                    name: self.players[i].1.clone(),
                })
            }
            None => {
                debug!("[client {}] left before registering.", id);
                Ok(())
            }
        }
    }

    async fn next_answer(&mut self, player: &str) -> Result<i64, SessionError> {
        loop {
            let Some(events::ClientEvent { id, payload }) = self.bridge.events.recv().await else {
                return Err(SessionError::BridgeClosed);
            };

            match payload {
                Connect(tx) => {
                    if tx.send("The game has already started.".to_string()).is_err() {
                        debug!("[client {}] left straight away.", id);
                    }
                }

                Disconnect => self.drop_client(&id)?,

                Line(line) => {
                    let Some(i) = self.player_index(&id) else {
                        debug!("Ignoring line from unregistered [client {}].", id);
                        continue;
                    };
                    let name = self.players[i].1.clone();

                    if self.is_disconnect_notice(&id, &line) {
                        self.drop_client(&id)?;
                    }

                    if name != player {
                        self.clients.send(&id, "It's not your turn yet.");
                        continue;
                    }

                    return line
                        .trim()
                        .parse()
                        .map_err(|_| SessionError::Protocol { name, line });
                }
            }
        }
    }
}

impl Sink for Session {
    fn broadcast(&mut self, line: &str) {
        for (id, _) in &self.players {
            self.clients.send(id, line);
        }
    }

    fn tell(&mut self, player: &str, line: &str) {
        match self.client_of(player) {
            Some(id) => self.clients.send(id, line),
            None => debug!("No connection for {}.", player),
        }
    }

    fn clear(&mut self) {
        self.broadcast(CLEAR_CONSOLE);
    }
}

impl Table for Session {
    // A non-numeric answer, or any player leaving, ends the wait with an error.
    async fn await_choice(
        &mut self,
        player: &str,
        timeout: Option<Duration>,
    ) -> Result<i64, SessionError> {
        let Some(limit) = timeout else {
            return self.next_answer(player).await;
        };

        tokio::time::timeout(limit, self.next_answer(player))
            .await
            .map_err(|_| SessionError::TimedOut {
                name: player.to_string(),
            })?
    }
}
