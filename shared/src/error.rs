//! Error types of the shared crate.

use crate::maze::{EntityType, Position};
use thiserror::Error;

/// Reasons a text layout cannot be turned into a maze.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {found:?} at ({x}, {y})")]
    UnknownTile { x: usize, y: usize, found: char },

    #[error("spawn of {entity} at {position} is not walkable")]
    InvalidSpawn { entity: EntityType, position: Position },
}

/// Errors raised while framing, encoding or decoding packets.
///
/// Every variant means the stream can no longer be trusted; callers tear the
/// session down instead of trying to resynchronize.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Connection interrupted after {read} of 4 header bytes")]
    TruncatedHeader { read: usize },

    #[error("Connection interrupted after {read} of {expected} payload bytes")]
    TruncatedPayload { expected: usize, read: usize },

    #[error("Frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(u32),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocol(u32),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Unexpected packet: {0}")]
    UnexpectedPacket(&'static str),
}
