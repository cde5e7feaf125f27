//! Server network layer: TCP accept loop and the per-connection threads.
//!
//! Each connection owns a handler thread that receives actions, a sender thread
//! streaming snapshots and, for ghost players, a mover thread applying the
//! latest requested direction. One Pac-Man mover and one game ticker serve the
//! whole server. All of them share [`SharedState`].

use crate::config::ServerConfig;
use crate::game::{lock_state, ServerState, SharedState};
use crate::session::Session;
use log::{debug, error, info, warn};
use shared::{
    read_packet, write_frame, write_packet, EntityType, Packet, ProtocolError, Received,
};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Pause after a failed `accept`.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP game server.
///
/// Owns the listening socket and the shared game state. [`Server::run`] blocks
/// the calling thread; use a [`ShutdownHandle`] taken beforehand to stop it.
pub struct Server {
    listener: TcpListener,
    state: SharedState,
    config: Arc<ServerConfig>,
    running: Arc<AtomicBool>,
}

impl Server {
    /// Binds the listening socket and builds a fresh game.
    ///
    /// No thread is started until [`Server::run`].
    pub fn bind<A: ToSocketAddrs>(addr: A, config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            state: ServerState::shared(&config),
            config: Arc::new(config),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the state every server thread works on.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Handle that stops a running server from another thread.
    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            addr: self.local_addr()?,
            state: self.state(),
            running: Arc::clone(&self.running),
        })
    }

    /// Starts the game ticker and accepts connections until shut down.
    ///
    /// Every accepted connection gets its own handler thread. Returns once a
    /// [`ShutdownHandle`] fires and the ticker has stopped.
    pub fn run(self) -> io::Result<()> {
        let ticker = spawn_ticker(
            self.state(),
            Arc::clone(&self.config),
            Arc::clone(&self.running),
        )?;
        info!("Server started successfully");

        for stream in self.listener.incoming() {
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    thread::sleep(ACCEPT_BACKOFF);
                    continue;
                }
            };

            let state = self.state();
            let config = Arc::clone(&self.config);
            let spawned = thread::Builder::new()
                .name("client-handler".into())
                .spawn(move || handle_client(stream, state, config));
            if let Err(e) = spawned {
                error!("Failed to spawn client handler: {}", e);
            }
        }

        if ticker.join().is_err() {
            error!("Game ticker panicked");
        }
        info!("Server stopped");
        Ok(())
    }
}

/// Stops a [`Server`] started with [`Server::run`].
///
/// Every session is asked to wind down; handlers leave within one read timeout
/// and the Pac-Man mover retires with the last ghost.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    addr: SocketAddr,
    state: SharedState,
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        {
            let state = lock_state(&self.state);
            info!(
                "Shutting down with {} ghost players connected",
                state.clients.ghost_players()
            );
            state.clients.stop_all();
        }
        // Wakes the accept loop so it sees the cleared flag.
        if let Err(e) = TcpStream::connect(self.addr) {
            debug!("Accept loop wake-up failed: {}", e);
        }
    }
}

fn spawn_ticker(
    state: SharedState,
    config: Arc<ServerConfig>,
    running: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("game-ticker".into())
        .spawn(move || {
            while running.load(Ordering::Acquire) {
                thread::sleep(config.tick_interval);
                lock_state(&state).tick();
            }
        })
}

fn handle_client(stream: TcpStream, state: SharedState, config: Arc<ServerConfig>) {
    let addr = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Dropping connection without peer address: {}", e);
            return;
        }
    };

    let registration = lock_state(&state).register(addr);
    let client = registration.client;
    let session = Arc::clone(&client.session);

    // The mover must exist before setup can fail. It retires itself once its
    // generation is stale.
    if let Some(generation) = registration.pacman_generation {
        if let Err(e) = spawn_pacman_mover(Arc::clone(&state), Arc::clone(&config), generation) {
            error!("Failed to spawn Pac-Man mover: {}", e);
            lock_state(&state).release_pacman_mover(generation);
        }
    }

    let workers = match start_session(&stream, &state, &config, client.ghost, &session) {
        Ok(workers) => workers,
        Err(e) => {
            warn!("Client {} failed during setup: {}", client.id, e);
            teardown(&stream, &state, client.id, &session, Vec::new());
            return;
        }
    };

    receive_loop(&stream, client.id, client.ghost, &session);
    teardown(&stream, &state, client.id, &session, workers);
}

/// Sends the assignment and starts the sender and, for ghosts, the mover.
fn start_session(
    stream: &TcpStream,
    state: &SharedState,
    config: &Arc<ServerConfig>,
    ghost: Option<EntityType>,
    session: &Arc<Session>,
) -> Result<Vec<JoinHandle<()>>, ProtocolError> {
    stream.set_read_timeout(Some(config.read_timeout))?;
    stream.set_nodelay(true)?;

    let mut writer = stream.try_clone()?;
    write_packet(&mut writer, &Packet::assignment(ghost))?;

    let mut workers = vec![spawn_sender(
        writer,
        Arc::clone(state),
        Arc::clone(config),
        Arc::clone(session),
    )?];
    if let Some(ghost) = ghost {
        workers.push(spawn_ghost_mover(
            ghost,
            Arc::clone(state),
            Arc::clone(config),
            Arc::clone(session),
        )?);
    }
    Ok(workers)
}

fn spawn_sender(
    mut writer: TcpStream,
    state: SharedState,
    config: Arc<ServerConfig>,
    session: Arc<Session>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("snapshot-sender".into())
        .spawn(move || {
            while session.is_running() {
                let frame = lock_state(&state).snapshot_frame();
                let sent = frame.and_then(|frame| write_frame(&mut writer, &frame));
                if let Err(e) = sent {
                    warn!("Stopping snapshot stream: {}", e);
                    session.stop();
                    break;
                }
                thread::sleep(config.broadcast_interval);
            }
        })
}

fn spawn_ghost_mover(
    ghost: EntityType,
    state: SharedState,
    config: Arc<ServerConfig>,
    session: Arc<Session>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-mover", ghost))
        .spawn(move || {
            while session.is_running() {
                if let Some(action) = session.requested() {
                    let moved = lock_state(&state).step_ghost(ghost, action);
                    if !moved && session.clear_if(action) {
                        debug!("{} blocked moving {:?}", ghost, action);
                    }
                }
                thread::sleep(config.ghost_move_interval);
            }
        })
}

fn spawn_pacman_mover(
    state: SharedState,
    config: Arc<ServerConfig>,
    generation: u64,
) -> io::Result<JoinHandle<()>> {
    info!("Starting Pac-Man mover (generation {})", generation);
    thread::Builder::new()
        .name("pacman-mover".into())
        .spawn(move || loop {
            thread::sleep(config.pacman_move_interval);
            let mut guard = lock_state(&state);
            if !guard.is_pacman_mover_current(generation) {
                info!("Pac-Man mover (generation {}) stopped", generation);
                break;
            }
            guard.step_pacman();
        })
}

fn receive_loop(
    stream: &TcpStream,
    client_id: u32,
    ghost: Option<EntityType>,
    session: &Session,
) {
    let mut reader = stream;
    while session.is_running() {
        match read_packet(&mut reader) {
            Ok(Received::Packet(Packet::Action(action))) => match ghost {
                Some(ghost) => {
                    debug!("{} requested {:?}", ghost, action);
                    session.set_requested(action);
                }
                None => debug!("Ignoring input from spectator {}", client_id),
            },
            Ok(Received::Packet(other)) => {
                warn!(
                    "Client {}: {}",
                    client_id,
                    ProtocolError::UnexpectedPacket(other.kind())
                );
            }
            Ok(Received::Empty) | Ok(Received::Idle) => {}
            Ok(Received::Closed) => {
                debug!("Client {} closed the connection", client_id);
                break;
            }
            Err(e) => {
                warn!("Client {}: {}", client_id, e);
                break;
            }
        }
    }
}

fn teardown(
    stream: &TcpStream,
    state: &SharedState,
    client_id: u32,
    session: &Session,
    workers: Vec<JoinHandle<()>>,
) {
    session.stop();
    lock_state(state).unregister(client_id);
    if let Err(e) = stream.shutdown(Shutdown::Both) {
        debug!("Socket of client {} already closed: {}", client_id, e);
    }
    for worker in workers {
        if worker.join().is_err() {
            error!("A worker of client {} panicked", client_id);
        }
    }
}
