//! # Maze Chase Client Library
//!
//! Headless client for the maze-chase server. It connects over TCP, receives
//! its ghost assignment, follows the snapshot stream and steers its ghost with
//! a simple bot. Drawing the maze is left to whatever front end consumes the
//! snapshots.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - Connection setup and protocol version check
//! - Sending actions, receiving snapshots
//!
//! ### Bot Module (`bot`)
//! - `Wander`: random walk that keeps its heading until blocked
//! - `Chase`: greedy pursuit of Pac-Man, retreat while frightened
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::bot::{Bot, Strategy};
//! use client::network::Connection;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = Connection::connect("127.0.0.1:5000", Duration::from_secs(1))?;
//!     let Some(ghost) = connection.ghost() else {
//!         return Ok(());
//!     };
//!     let mut bot = Bot::new(ghost, Strategy::Chase, None);
//!     while let Some(state) = connection.recv_snapshot()? {
//!         if let Some(action) = bot.decide(&state) {
//!             connection.send_action(action)?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod network;
