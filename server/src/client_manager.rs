//! Connected-client registry and the ghost identity pool.
//!
//! Every accepted connection is registered here. Connections that arrive while
//! a ghost is free take the ghost at the front of the pool; the rest watch the
//! match as spectators. A departing client returns its ghost to the back of the
//! pool, so identities are reused in the order they were freed.

use crate::session::Session;
use log::info;
use shared::EntityType;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;

/// Order in which ghosts are handed out to a fresh server.
pub const GHOST_ASSIGNMENT_ORDER: [EntityType; 4] = [
    EntityType::Blinky,
    EntityType::Inky,
    EntityType::Pinky,
    EntityType::Clyde,
];

/// A registered connection.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: u32,
    pub addr: SocketAddr,
    /// `None` for spectators
    pub ghost: Option<EntityType>,
    pub session: Arc<Session>,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, ghost: Option<EntityType>) -> Self {
        Self {
            id,
            addr,
            ghost,
            session: Arc::new(Session::new()),
        }
    }

    pub fn is_spectator(&self) -> bool {
        self.ghost.is_none()
    }
}

#[derive(Debug)]
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    available_ghosts: VecDeque<EntityType>,
    next_client_id: u32,
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            available_ghosts: VecDeque::from(GHOST_ASSIGNMENT_ORDER),
            next_client_id: 1,
        }
    }

    /// Registers a connection, assigning the next free ghost if any.
    ///
    /// Never refuses a client: once the pool is empty newcomers are spectators.
    pub fn add_client(&mut self, addr: SocketAddr) -> Client {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let ghost = self.available_ghosts.pop_front();
        let client = Client::new(client_id, addr, ghost);
        match ghost {
            Some(ghost) => info!("Client {} connected from {} as {}", client_id, addr, ghost),
            None => info!("Client {} connected from {} as spectator", client_id, addr),
        }

        self.clients.insert(client_id, client.clone());
        client
    }

    /// Unregisters a connection and returns its ghost to the back of the pool.
    pub fn remove_client(&mut self, client_id: &u32) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        if let Some(ghost) = client.ghost {
            self.available_ghosts.push_back(ghost);
        }
        info!("Client {} disconnected", client.id);
        Some(client)
    }

    /// Looks up a registered client by id.
    pub fn get(&self, client_id: &u32) -> Option<&Client> {
        self.clients.get(client_id)
    }

    /// Ghosts waiting for a player, front first.
    pub fn available_ghosts(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.available_ghosts.iter().copied()
    }

    /// True once no connection controls a ghost.
    pub fn is_pool_full(&self) -> bool {
        self.available_ghosts.len() == GHOST_ASSIGNMENT_ORDER.len()
    }

    /// Number of connections currently steering a ghost.
    pub fn ghost_players(&self) -> usize {
        self.clients.values().filter(|client| !client.is_spectator()).count()
    }

    /// Asks every session to wind down.
    pub fn stop_all(&self) {
        for client in self.clients.values() {
            client.session.stop();
        }
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new(1, test_addr(), Some(EntityType::Blinky));

        assert_eq!(client.id, 1);
        assert_eq!(client.addr, test_addr());
        assert!(!client.is_spectator());
        assert!(client.session.is_running());
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new();
        assert!(manager.is_empty());
        assert!(manager.is_pool_full());
        assert_eq!(
            manager.available_ghosts().collect::<Vec<_>>(),
            GHOST_ASSIGNMENT_ORDER
        );
    }

    #[test]
    fn test_ghosts_assigned_in_order() {
        let mut manager = ClientManager::new();
        let ghosts: Vec<Option<EntityType>> = (0..4)
            .map(|_| manager.add_client(test_addr()).ghost)
            .collect();

        assert_eq!(
            ghosts,
            vec![
                Some(EntityType::Blinky),
                Some(EntityType::Inky),
                Some(EntityType::Pinky),
                Some(EntityType::Clyde),
            ]
        );
        assert_eq!(manager.ghost_players(), 4);
        assert!(!manager.is_pool_full());
    }

    #[test]
    fn test_fifth_client_is_spectator() {
        let mut manager = ClientManager::new();
        for _ in 0..4 {
            manager.add_client(test_addr());
        }

        let spectator = manager.add_client(test_addr2());
        assert!(spectator.is_spectator());
        assert_eq!(spectator.id, 5);
        assert_eq!(manager.len(), 5);
        assert_eq!(manager.ghost_players(), 4);
    }

    #[test]
    fn test_released_ghost_goes_to_back_of_pool() {
        let mut manager = ClientManager::new();
        let blinky = manager.add_client(test_addr());
        let inky = manager.add_client(test_addr());

        manager.remove_client(&blinky.id);
        assert_eq!(
            manager.available_ghosts().collect::<Vec<_>>(),
            vec![EntityType::Pinky, EntityType::Clyde, EntityType::Blinky]
        );

        manager.remove_client(&inky.id);
        assert!(manager.is_pool_full());

        let next = manager.add_client(test_addr2());
        assert_eq!(next.ghost, Some(EntityType::Pinky));
    }

    #[test]
    fn test_remove_spectator_leaves_pool_alone() {
        let mut manager = ClientManager::new();
        for _ in 0..4 {
            manager.add_client(test_addr());
        }
        let spectator = manager.add_client(test_addr2());

        let removed = manager.remove_client(&spectator.id).unwrap();
        assert!(removed.is_spectator());
        assert_eq!(manager.available_ghosts().count(), 0);
    }

    #[test]
    fn test_remove_nonexistent_client() {
        let mut manager = ClientManager::new();
        assert!(manager.remove_client(&999).is_none());
        assert!(manager.is_pool_full());
    }

    #[test]
    fn test_stop_all_sessions() {
        let mut manager = ClientManager::new();
        let first = manager.add_client(test_addr());
        let second = manager.add_client(test_addr2());

        manager.stop_all();
        assert!(!first.session.is_running());
        assert!(!second.session.is_running());
        assert!(manager.get(&first.id).is_some());
    }
}
