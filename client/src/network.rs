//! Client side of the TCP protocol.

use log::{debug, info};
use shared::{
    read_packet, write_packet, EntityType, GameState, Packet, PlayerAction, ProtocolError,
    Received, PROTOCOL_VERSION,
};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// An open session with the server.
pub struct Connection {
    stream: TcpStream,
    ghost: Option<EntityType>,
}

impl Connection {
    /// Connects and waits for the ghost assignment.
    ///
    /// Fails with [`ProtocolError::UnsupportedProtocol`] when the server speaks
    /// another protocol version.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        read_timeout: Duration,
    ) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(read_timeout))?;
        stream.set_nodelay(true)?;

        let mut reader = &stream;
        let ghost = loop {
            match read_packet(&mut reader)? {
                Received::Packet(Packet::Assignment {
                    protocol_version,
                    ghost,
                }) => {
                    if protocol_version != PROTOCOL_VERSION {
                        return Err(ProtocolError::UnsupportedProtocol(protocol_version));
                    }
                    break ghost;
                }
                Received::Packet(other) => {
                    return Err(ProtocolError::UnexpectedPacket(other.kind()))
                }
                Received::Empty | Received::Idle => continue,
                Received::Closed => return Err(ProtocolError::ConnectionClosed),
            }
        };

        match ghost {
            Some(ghost) => info!("Connected as {}", ghost),
            None => info!("Connected as spectator"),
        }
        Ok(Self { stream, ghost })
    }

    /// Ghost controlled by this connection, `None` for spectators.
    pub fn ghost(&self) -> Option<EntityType> {
        self.ghost
    }

    pub fn send_action(&mut self, action: PlayerAction) -> Result<(), ProtocolError> {
        debug!("Sending {:?}", action);
        write_packet(&mut self.stream, &Packet::Action(action))
    }

    /// Waits up to the read timeout for the next snapshot.
    pub fn recv_snapshot(&mut self) -> Result<Option<GameState>, ProtocolError> {
        let mut reader = &self.stream;
        match read_packet(&mut reader)? {
            Received::Packet(Packet::Snapshot(state)) => Ok(Some(state)),
            Received::Packet(other) => Err(ProtocolError::UnexpectedPacket(other.kind())),
            Received::Empty | Received::Idle => Ok(None),
            Received::Closed => Err(ProtocolError::ConnectionClosed),
        }
    }

    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("Shutdown after close: {}", e);
        }
    }
}
