//! Types shared by the maze-chase server and its clients: the maze model, the
//! authoritative game state and the framed wire protocol.

pub mod error;
pub mod game_state;
pub mod maze;
pub mod protocol;

pub use error::{LayoutError, ProtocolError};
pub use game_state::{GameState, GameStatus, Rules};
pub use maze::{Cell, EntityType, ItemType, Maze, Position, TileType, MAZE_HEIGHT, MAZE_WIDTH};
pub use protocol::{
    encode_frame, read_packet, write_frame, write_packet, Packet, PlayerAction, Received,
    PROTOCOL_VERSION,
};
