//! Everything guarded by the server's single lock.

use crate::agent::{PacmanAgent, Step};
use crate::client_manager::{Client, ClientManager};
use crate::config::ServerConfig;
use log::{debug, info};
use shared::{encode_frame, EntityType, GameState, Maze, Packet, PlayerAction, ProtocolError, Rules};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SharedState = Arc<Mutex<ServerState>>;

/// Locks the shared state, recovering it if a thread panicked while holding it.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of registering a connection.
#[derive(Debug, Clone)]
pub struct Registration {
    pub client: Client,
    /// Set when this registration started the Pac-Man mover; the mover keeps
    /// running while this generation is current.
    pub pacman_generation: Option<u64>,
}

#[derive(Debug)]
pub struct ServerState {
    pub game: GameState,
    pub agent: PacmanAgent,
    pub clients: ClientManager,
    rules: Rules,
    pacman_active: bool,
    pacman_generation: u64,
}

impl ServerState {
    /// Builds a waiting match on the classic maze with an empty registry.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            game: GameState::with_rules(Maze::classic(), config.rules),
            agent: PacmanAgent::new(config.agent),
            clients: ClientManager::new(),
            rules: config.rules,
            pacman_active: false,
            pacman_generation: 0,
        }
    }

    /// Same as [`ServerState::new`], wrapped for sharing between threads.
    pub fn shared(config: &ServerConfig) -> SharedState {
        Arc::new(Mutex::new(Self::new(config)))
    }

    /// Registers a connection and assigns it a ghost when one is free.
    ///
    /// The first ghost assignment starts the match. While no Pac-Man mover is
    /// active, the registration also hands out a new mover generation that the
    /// caller must run with [`ServerState::is_pacman_mover_current`] as its
    /// loop condition.
    pub fn register(&mut self, addr: SocketAddr) -> Registration {
        let client = self.clients.add_client(addr);
        if client.is_spectator() {
            return Registration {
                client,
                pacman_generation: None,
            };
        }

        if self.game.start() {
            info!("Match started");
        }
        let pacman_generation = if self.pacman_active {
            None
        } else {
            self.pacman_active = true;
            self.pacman_generation += 1;
            Some(self.pacman_generation)
        };

        Registration {
            client,
            pacman_generation,
        }
    }

    /// Releases a connection. Once no ghost is controlled any more the Pac-Man
    /// mover is stopped, and a finished match is replaced by a fresh one.
    pub fn unregister(&mut self, client_id: u32) -> Option<Client> {
        let client = self.clients.remove_client(&client_id)?;
        if !client.is_spectator() && self.clients.is_pool_full() {
            self.pacman_active = false;
            if self.game.is_finished() {
                self.new_match();
            }
        }
        Some(client)
    }

    /// Gives up a mover generation whose thread never started, so the next
    /// ghost registration hands out a fresh one.
    pub fn release_pacman_mover(&mut self, generation: u64) {
        if self.is_pacman_mover_current(generation) {
            self.pacman_active = false;
        }
    }

    /// Whether the mover running `generation` should keep going.
    pub fn is_pacman_mover_current(&self, generation: u64) -> bool {
        self.pacman_active && self.pacman_generation == generation
    }

    /// Moves a ghost one cell and settles collisions right away.
    ///
    /// Returns `false` when the destination is not walkable; the ghost then
    /// stays where it is.
    pub fn step_ghost(&mut self, ghost: EntityType, action: PlayerAction) -> bool {
        let moved = self.game.move_ghost(ghost, action);
        if moved {
            self.game.settle();
        }
        moved
    }

    /// Lets the agent move Pac-Man one cell, then settles collisions.
    ///
    /// `None` when the match is not running or Pac-Man is boxed in.
    pub fn step_pacman(&mut self) -> Option<Step> {
        let step = self.agent.update(&mut self.game)?;
        self.game.settle();
        Some(step)
    }

    /// Advances the match by one tick: frightened timer, collisions, victory.
    pub fn tick(&mut self) {
        let was_running = self.game.is_running();
        self.game.update();
        if was_running && self.game.is_finished() {
            info!(
                "Match over: {:?}, winner {:?}",
                self.game.status, self.game.winner
            );
        }
    }

    /// Encodes the current state as a ready-to-send frame.
    pub fn snapshot_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_frame(Some(&Packet::Snapshot(self.game.clone())))
    }

    fn new_match(&mut self) {
        debug!("Replacing finished match with a fresh one");
        self.game = GameState::with_rules(Maze::classic(), self.rules);
        self.agent.reset();
    }
}
