//! # Maze Chase Server
//!
//! Authoritative server for a networked maze-chase game. Up to four TCP clients
//! each steer one ghost; the server drives Pac-Man itself and streams the full
//! game state to every connection, spectators included.
//!
//! ## Threads
//!
//! One OS thread per responsibility, all sharing a single
//! [`game::SharedState`] mutex:
//! - **Accept loop**: blocks on `accept` and spawns a handler per connection
//! - **Handler**: sends the ghost assignment, then reads actions with a bounded
//!   read timeout until the peer leaves
//! - **Sender**: writes a snapshot frame every broadcast interval
//! - **Ghost mover**: applies the last requested direction every move interval
//! - **Pac-Man mover**: one per server, runs while any ghost is controlled
//! - **Game ticker**: advances the frightened timer and settles collisions
//!
//! ## Module Organization
//!
//! - `agent`, `heatmap`, `pathfinding`: the Pac-Man decision engine
//! - `client_manager`, `session`: connection registry and per-client context
//! - `game`: state behind the lock and the operations the threads perform
//! - `network`: sockets and thread lifecycles
//! - `config`: timing, scoring and agent settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:5000", ServerConfig::default())?;
//!     server.run()?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod client_manager;
pub mod config;
pub mod game;
pub mod heatmap;
pub mod network;
pub mod pathfinding;
pub mod session;
