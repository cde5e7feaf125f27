//! Runtime settings of the server.

use crate::agent::AgentConfig;
use shared::Rules;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Bound on every blocking socket read.
    pub read_timeout: Duration,
    /// Period of `GameState::update`.
    pub tick_interval: Duration,
    /// Period of the per-client snapshot stream.
    pub broadcast_interval: Duration,
    pub ghost_move_interval: Duration,
    pub pacman_move_interval: Duration,
    pub rules: Rules,
    pub agent: AgentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(1),
            tick_interval: Duration::from_millis(50),
            broadcast_interval: Duration::from_millis(50),
            ghost_move_interval: Duration::from_millis(200),
            pacman_move_interval: Duration::from_millis(200),
            rules: Rules::default(),
            agent: AgentConfig::default(),
        }
    }
}
