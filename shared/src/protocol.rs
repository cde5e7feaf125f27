//! Wire protocol: `[u32 big-endian length][bincode payload]`.
//!
//! A zero-length frame is legal and carries no packet. Readers never hand out a
//! partially received packet: a frame is either complete, or the read reports
//! why nothing was produced.

use crate::error::ProtocolError;
use crate::game_state::GameState;
use crate::maze::EntityType;
use bincode::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

pub const PROTOCOL_VERSION: u32 = 1;
pub const HEADER_LEN: usize = 4;
pub const MAX_FRAME_LEN: u32 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    Up,
    Down,
    Left,
    Right,
}

impl PlayerAction {
    pub const ALL: [PlayerAction; 4] = [
        PlayerAction::Up,
        PlayerAction::Down,
        PlayerAction::Left,
        PlayerAction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            PlayerAction::Up => (0, -1),
            PlayerAction::Down => (0, 1),
            PlayerAction::Left => (-1, 0),
            PlayerAction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            PlayerAction::Up => PlayerAction::Down,
            PlayerAction::Down => PlayerAction::Up,
            PlayerAction::Left => PlayerAction::Right,
            PlayerAction::Right => PlayerAction::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    /// First message on every connection. `ghost` is `None` for spectators.
    Assignment {
        protocol_version: u32,
        ghost: Option<EntityType>,
    },
    Action(PlayerAction),
    Snapshot(GameState),
}

impl Packet {
    pub fn assignment(ghost: Option<EntityType>) -> Self {
        Packet::Assignment {
            protocol_version: PROTOCOL_VERSION,
            ghost,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Assignment { .. } => "assignment",
            Packet::Action(_) => "action",
            Packet::Snapshot(_) => "snapshot",
        }
    }
}

/// Outcome of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Packet(Packet),
    /// A well-formed zero-length frame.
    Empty,
    /// The read timeout elapsed before any byte of a new frame arrived.
    Idle,
    /// The peer closed the connection between frames.
    Closed,
}

/// Encodes a packet (or an empty frame for `None`) with its length header.
pub fn encode_frame(packet: Option<&Packet>) -> Result<Vec<u8>, ProtocolError> {
    let payload = match packet {
        Some(packet) => serialize(packet)?,
        None => Vec::new(),
    };
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::FrameTooLarge(u32::MAX))?;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<(), ProtocolError> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}

pub fn write_packet<W: Write>(writer: &mut W, packet: &Packet) -> Result<(), ProtocolError> {
    let frame = encode_frame(Some(packet))?;
    write_frame(writer, &frame)
}

pub fn read_packet<R: Read>(reader: &mut R) -> Result<Received, ProtocolError> {
    let mut header = [0u8; HEADER_LEN];
    match fill(reader, &mut header)? {
        Fill::Complete => {}
        Fill::Eof(0) => return Ok(Received::Closed),
        Fill::TimedOut(0) => return Ok(Received::Idle),
        Fill::Eof(read) | Fill::TimedOut(read) => {
            return Err(ProtocolError::TruncatedHeader { read })
        }
    }

    let len = u32::from_be_bytes(header);
    if len == 0 {
        return Ok(Received::Empty);
    }
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let expected = len as usize;
    let mut payload = vec![0u8; expected];
    match fill(reader, &mut payload)? {
        Fill::Complete => Ok(Received::Packet(deserialize(&payload)?)),
        Fill::Eof(read) | Fill::TimedOut(read) => {
            Err(ProtocolError::TruncatedPayload { expected, read })
        }
    }
}

enum Fill {
    Complete,
    Eof(usize),
    TimedOut(usize),
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<Fill> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(Fill::Eof(filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Ok(Fill::TimedOut(filled))
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Fill::Complete)
}
