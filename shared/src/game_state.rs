//! Authoritative match state: collisions, scoring and victory.

use crate::maze::{EntityType, Maze, Position};
use crate::protocol::PlayerAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PACMAN_LIVES: u32 = 3;
pub const DEFAULT_FRIGHTENED_DURATION: u32 = 300;
pub const DEFAULT_EAT_PACMAN_REWARD: i32 = 200;
pub const DEFAULT_EAT_GHOST_PENALTY: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    WaitingPlayers,
    Running,
    PacmanVictory,
    GhostsVictory,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::PacmanVictory | GameStatus::GhostsVictory)
    }
}

/// Scoring constants of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    pub pacman_lives: u32,
    /// Ticks of frightened mode granted by a power pellet.
    pub frightened_duration: u32,
    pub eat_pacman_reward: i32,
    pub eat_ghost_penalty: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            pacman_lives: DEFAULT_PACMAN_LIVES,
            frightened_duration: DEFAULT_FRIGHTENED_DURATION,
            eat_pacman_reward: DEFAULT_EAT_PACMAN_REWARD,
            eat_ghost_penalty: DEFAULT_EAT_GHOST_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub maze: Maze,
    pub status: GameStatus,
    pub frightened_timer: u32,
    pub pacman_lives: u32,
    pub scores: BTreeMap<EntityType, i32>,
    pub winner: Option<EntityType>,
    pub rules: Rules,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::with_rules(Maze::classic(), Rules::default())
    }

    pub fn with_rules(maze: Maze, rules: Rules) -> Self {
        Self {
            maze,
            status: GameStatus::WaitingPlayers,
            frightened_timer: 0,
            pacman_lives: rules.pacman_lives,
            scores: EntityType::GHOSTS.iter().map(|ghost| (*ghost, 0)).collect(),
            winner: None,
            rules,
        }
    }

    /// Moves the match from waiting to running. Returns whether it did.
    pub fn start(&mut self) -> bool {
        if self.status != GameStatus::WaitingPlayers {
            return false;
        }
        self.status = GameStatus::Running;
        true
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn activate_frightened_mode(&mut self) {
        self.frightened_timer = self.rules.frightened_duration;
    }

    pub fn is_frightened_mode(&self) -> bool {
        self.frightened_timer > 0
    }

    pub fn decrease_frightened_timer(&mut self) {
        self.frightened_timer = self.frightened_timer.saturating_sub(1);
    }

    pub fn decrease_pacman_life(&mut self) {
        self.pacman_lives = self.pacman_lives.saturating_sub(1);
    }

    /// Adds `points` to a ghost's score. Anything but a ghost is ignored.
    pub fn add_score(&mut self, ghost: EntityType, points: i32) -> bool {
        match self.scores.get_mut(&ghost) {
            Some(score) => {
                *score += points;
                true
            }
            None => false,
        }
    }

    pub fn score(&self, ghost: EntityType) -> Option<i32> {
        self.scores.get(&ghost).copied()
    }

    /// Advances a ghost one cell. `false` when the destination is not walkable.
    pub fn move_ghost(&mut self, ghost: EntityType, action: PlayerAction) -> bool {
        if !ghost.is_ghost() {
            return false;
        }
        let Some(current) = self.maze.entity_position(ghost) else {
            return false;
        };
        let (dx, dy) = action.delta();
        if !self.maze.is_valid_position(current.x + dx, current.y + dy) {
            return false;
        }
        self.maze.move_entity(ghost, dx, dy);
        true
    }

    /// One simulation tick. Does nothing unless the match is running.
    pub fn update(&mut self) {
        if !self.is_running() {
            return;
        }
        self.decrease_frightened_timer();
        self.resolve_collisions();
        self.check_victory_condition();
    }

    /// Resolves collisions and victory right after a move, leaving the timer alone.
    pub fn settle(&mut self) {
        if !self.is_running() {
            return;
        }
        self.resolve_collisions();
        self.check_victory_condition();
    }

    /// Resolves ghost and Pac-Man overlaps in identity order. Pac-Man's cell is
    /// taken once up front, so a respawned Pac-Man cannot be bitten twice.
    pub fn resolve_collisions(&mut self) {
        if self.is_finished() {
            return;
        }
        let Some(pacman) = self.pacman_position() else {
            return;
        };
        for ghost in EntityType::GHOSTS {
            if self.maze.entity_position(ghost) != Some(pacman) {
                continue;
            }

            if self.is_frightened_mode() {
                self.maze.reset_entity(ghost);
                self.add_score(ghost, -self.rules.eat_ghost_penalty);
                continue;
            }

            self.add_score(ghost, self.rules.eat_pacman_reward);
            self.decrease_pacman_life();
            if self.pacman_lives > 0 {
                self.maze.reset_entity(EntityType::Pacman);
            } else {
                let winner = self.leading_ghost();
                self.finish(GameStatus::GhostsVictory, winner);
            }
            return;
        }
    }

    pub fn check_victory_condition(&mut self) {
        if !self.is_running() {
            return;
        }
        if !self.maze.has_remaining_pac_dots() {
            self.finish(GameStatus::PacmanVictory, Some(EntityType::Pacman));
        } else if self.pacman_lives == 0 {
            let winner = self.leading_ghost();
            self.finish(GameStatus::GhostsVictory, winner);
        }
    }

    /// Ghost holding the highest score; ties go to the lowest identity value.
    pub fn leading_ghost(&self) -> Option<EntityType> {
        let mut best: Option<(EntityType, i32)> = None;
        for ghost in EntityType::GHOSTS {
            let Some(score) = self.score(ghost) else {
                continue;
            };
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((ghost, score));
            }
        }
        best.map(|(ghost, _)| ghost)
    }

    pub fn pacman_position(&self) -> Option<Position> {
        self.maze.entity_position(EntityType::Pacman)
    }

    fn finish(&mut self, status: GameStatus, winner: Option<EntityType>) {
        if !self.is_running() {
            return;
        }
        self.status = status;
        self.winner = winner;
    }
}
