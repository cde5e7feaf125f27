//! Autonomous Pac-Man driver.
//!
//! Every call to [`PacmanAgent::update`] picks at most one single-cell move, in
//! this priority order:
//! 1. escape an oscillation between two cells,
//! 2. hunt the nearest in-play ghost while frightened mode is active,
//! 3. flee, grab a power pellet or eat dots depending on how close the nearest
//!    ghost is,
//! 4. step to the least dangerous neighbour.

use crate::heatmap::Heatmap;
use crate::pathfinding::{astar, StepCost};
use log::debug;
use shared::{EntityType, GameState, ItemType, Maze, Position};
use std::collections::{BTreeSet, VecDeque};

/// Tuning knobs of the agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    /// Ghosts within this Manhattan distance are dangerous.
    pub danger_radius: i32,
    /// Extra distance within which the agent prefers power pellets.
    pub caution_margin: i32,
    /// A pellet is worth chasing under threat when it is closer than the
    /// threatening ghost by more than this many cells.
    pub pellet_margin: i32,
    pub risk_surcharge: f64,
    /// Number of updates between two heatmap refreshes.
    pub heatmap_interval: u32,
    pub history_len: usize,
    /// Consecutive collapsed-history updates tolerated before forcing a move.
    pub stuck_threshold: u32,
    /// Trailing history entries avoided by the forced move.
    pub recent_exclusion: usize,
    /// Half side of the square searched for a flee target.
    pub flee_radius: i32,
    pub flee_distance_weight: f64,
    pub dot_heat_weight: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            danger_radius: 4,
            caution_margin: 2,
            pellet_margin: 1,
            risk_surcharge: 1.5,
            heatmap_interval: 3,
            history_len: 5,
            stuck_threshold: 3,
            recent_exclusion: 3,
            flee_radius: 6,
            flee_distance_weight: 0.5,
            dot_heat_weight: 0.3,
        }
    }
}

/// Why the agent chose its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unstick,
    Hunt,
    Flee,
    Pellet,
    Dot,
    Fallback,
}

/// A move the agent applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: Position,
    pub to: Position,
    pub mode: Mode,
    pub collected: Option<ItemType>,
}

#[derive(Debug, Clone)]
pub struct PacmanAgent {
    config: AgentConfig,
    heatmap: Heatmap,
    updates: u64,
    last_position: Option<Position>,
    history: VecDeque<Position>,
    stuck_counter: u32,
}

impl Default for PacmanAgent {
    fn default() -> Self {
        Self::new(AgentConfig::default())
    }
}

impl PacmanAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len + 1),
            config,
            heatmap: Heatmap::new(),
            updates: 0,
            last_position: None,
            stuck_counter: 0,
        }
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    /// Forgets everything learned during the previous match.
    pub fn reset(&mut self) {
        self.heatmap.clear();
        self.updates = 0;
        self.last_position = None;
        self.history.clear();
        self.stuck_counter = 0;
    }

    /// Computes and applies at most one move for Pac-Man.
    ///
    /// Returns `None` when the match is not running, Pac-Man is missing or no
    /// neighbour is walkable. Collisions are left to the caller.
    pub fn update(&mut self, state: &mut GameState) -> Option<Step> {
        if !state.is_running() {
            return None;
        }
        let from = state.pacman_position()?;

        if self.updates % u64::from(self.config.heatmap_interval.max(1)) == 0 {
            self.heatmap
                .refresh(&state.maze, self.config.danger_radius);
        }
        self.updates += 1;

        if self.detect_loop(from) {
            let target = self.unstick_target(&state.maze, from);
            self.history.clear();
            self.stuck_counter = 0;
            return self.apply(state, from, target?, Mode::Unstick);
        }

        let planned = if state.is_frightened_mode() {
            self.plan_hunt(&state.maze, from)
        } else {
            self.plan_normal(&state.maze, from)
        };
        let (to, mode) = match planned {
            Some(choice) => choice,
            None => (self.fallback_target(&state.maze, from)?, Mode::Fallback),
        };
        self.apply(state, from, to, mode)
    }

    fn detect_loop(&mut self, position: Position) -> bool {
        self.history.push_back(position);
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }

        if self.history.len() >= self.config.history_len {
            let distinct: BTreeSet<&Position> = self.history.iter().collect();
            if distinct.len() <= 2 {
                self.stuck_counter += 1;
                return self.stuck_counter > self.config.stuck_threshold;
            }
        }
        self.stuck_counter = 0;
        false
    }

    fn unstick_target(&self, maze: &Maze, from: Position) -> Option<Position> {
        let neighbors = maze.walkable_neighbors(from);
        let skip = self.history.len().saturating_sub(self.config.recent_exclusion);
        let recent: Vec<Position> = self.history.iter().skip(skip).copied().collect();

        let fresh = neighbors
            .iter()
            .filter(|next| !recent.contains(*next))
            .min_by_key(|next| self.heatmap.get(**next));
        fresh
            .or_else(|| neighbors.iter().min_by_key(|next| self.heatmap.get(**next)))
            .copied()
    }

    fn plan_hunt(&self, maze: &Maze, from: Position) -> Option<(Position, Mode)> {
        if let Some((_, ghost, _)) = nearest_ghost(maze, from) {
            if let Some(step) = self.first_step(maze, from, ghost, StepCost::Distance) {
                return Some((step, Mode::Hunt));
            }
        }

        let dot = nearest_item(maze, from, ItemType::PacDot, |_| 0.0)?;
        self.first_step(maze, from, dot, StepCost::Distance)
            .map(|step| (step, Mode::Dot))
    }

    fn plan_normal(&self, maze: &Maze, from: Position) -> Option<(Position, Mode)> {
        let risk = StepCost::Risk {
            surcharge: self.config.risk_surcharge,
        };
        let threat = nearest_ghost(maze, from).map(|(_, _, distance)| distance);
        let pellet = nearest_item(maze, from, ItemType::PowerPellet, |_| 0.0);

        match threat {
            Some(distance) if distance <= self.config.danger_radius => {
                if let Some(pellet) = pellet {
                    if pellet.manhattan(from) < distance - self.config.pellet_margin {
                        if let Some(step) = self.first_step(maze, from, pellet, risk) {
                            return Some((step, Mode::Pellet));
                        }
                    }
                }
                let (refuge, _) = self.flee_target(maze, from)?;
                self.first_step(maze, from, refuge, risk)
                    .map(|step| (step, Mode::Flee))
            }
            Some(distance)
                if distance <= self.config.danger_radius + self.config.caution_margin =>
            {
                if let Some(pellet) = pellet {
                    if let Some(step) = self.first_step(maze, from, pellet, risk) {
                        return Some((step, Mode::Pellet));
                    }
                }
                self.seek_dot(maze, from, risk)
            }
            _ => self.seek_dot(maze, from, risk),
        }
    }

    fn seek_dot(&self, maze: &Maze, from: Position, risk: StepCost) -> Option<(Position, Mode)> {
        let weight = self.config.dot_heat_weight;
        let dot = nearest_item(maze, from, ItemType::PacDot, |position| {
            weight * f64::from(self.heatmap.get(position))
        })?;
        self.first_step(maze, from, dot, risk)
            .map(|step| (step, Mode::Dot))
    }

    /// Walkable cell in the square around `from` minimising
    /// `heat + flee_distance_weight * distance`, with its score.
    fn flee_target(&self, maze: &Maze, from: Position) -> Option<(Position, f64)> {
        let radius = self.config.flee_radius;
        let mut best: Option<(Position, f64)> = None;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let candidate = from.offset(dx, dy);
                if !maze.is_walkable(candidate) {
                    continue;
                }
                let score = f64::from(self.heatmap.get(candidate))
                    + self.config.flee_distance_weight * f64::from(candidate.manhattan(from));
                if best.map_or(true, |(_, top)| score < top) {
                    best = Some((candidate, score));
                }
            }
        }
        best
    }

    fn fallback_target(&self, maze: &Maze, from: Position) -> Option<Position> {
        maze.walkable_neighbors(from)
            .into_iter()
            .min_by_key(|next| (self.heatmap.get(*next), Some(*next) == self.last_position))
    }

    fn first_step(
        &self,
        maze: &Maze,
        from: Position,
        goal: Position,
        cost: StepCost,
    ) -> Option<Position> {
        astar(maze, &self.heatmap, from, goal, cost)?.first().copied()
    }

    fn apply(
        &mut self,
        state: &mut GameState,
        from: Position,
        to: Position,
        mode: Mode,
    ) -> Option<Step> {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx.abs() + dy.abs() != 1 || !state.maze.is_walkable(to) {
            return None;
        }

        let collected = state.maze.move_entity(EntityType::Pacman, dx, dy);
        if collected == Some(ItemType::PowerPellet) {
            state.activate_frightened_mode();
            debug!("Pac-Man ate a power pellet at {}", to);
        }
        self.last_position = Some(from);

        debug!("Pac-Man {:?}: {} -> {}", mode, from, to);
        Some(Step {
            from,
            to,
            mode,
            collected,
        })
    }
}

/// Closest in-play ghost by Manhattan distance; ties go to identity order.
fn nearest_ghost(maze: &Maze, from: Position) -> Option<(EntityType, Position, i32)> {
    maze.in_play_ghosts()
        .into_iter()
        .map(|(ghost, position)| (ghost, position, position.manhattan(from)))
        .min_by_key(|(_, _, distance)| *distance)
}

/// Item of `kind` minimising `distance + penalty(position)`, scanning row-major.
/// The cell under Pac-Man is skipped since standing still cannot collect it.
fn nearest_item(
    maze: &Maze,
    from: Position,
    kind: ItemType,
    penalty: impl Fn(Position) -> f64,
) -> Option<Position> {
    maze.items()
        .filter(|(position, item)| *item == kind && *position != from)
        .map(|(position, _)| (position, f64::from(position.manhattan(from)) + penalty(position)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::collections::BTreeMap;

    /// Running match on a custom board. Ghosts share `ghost_spawn`, so they
    /// only count as in play once moved.
    fn board(rows: &[&str], pacman: Position, ghost_spawn: Position) -> GameState {
        let mut spawns = BTreeMap::from([(EntityType::Pacman, pacman)]);
        for ghost in EntityType::GHOSTS {
            spawns.insert(ghost, ghost_spawn);
        }
        let maze = Maze::from_layout(rows, spawns).unwrap();
        let mut state = GameState::with_rules(maze, Default::default());
        assert!(state.start());
        state
    }

    fn corridor(row: &str, pacman: i32, ghost_spawn: i32) -> GameState {
        let wall = "#".repeat(row.len());
        board(
            &[wall.as_str(), row, wall.as_str()],
            Position::new(pacman, 1),
            Position::new(ghost_spawn, 1),
        )
    }

    #[test]
    fn test_idle_unless_running() {
        let mut state = GameState::new();
        let mut agent = PacmanAgent::default();
        let before = state.pacman_position();

        assert_eq!(agent.update(&mut state), None);
        assert_eq!(state.pacman_position(), before);
    }

    #[test]
    fn test_dead_end_leaves_pacman_in_place() {
        let mut state = board(
            &["#####", "# # #", "#####"],
            Position::new(1, 1),
            Position::new(3, 1),
        );
        let mut agent = PacmanAgent::default();

        assert_eq!(agent.update(&mut state), None);
        assert_eq!(state.pacman_position(), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_classic_opening_eats_nearest_dot() {
        let mut state = GameState::new();
        state.start();
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Dot);
        assert_eq!(step.to, Position::new(13, 23));
        assert_eq!(step.collected, Some(ItemType::PacDot));
        assert_eq!(state.maze.remaining_pac_dots(), 295);
    }

    #[test]
    fn test_safe_mode_prefers_dots_over_pellets() {
        let mut state = corridor("#o    .     #", 5, 10);
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Dot);
        assert_eq!(step.to, Position::new(6, 1));
    }

    #[test]
    fn test_moderate_danger_heads_for_pellet() {
        let mut state = corridor("#o    .     #", 5, 10);
        state.maze.place_entity(EntityType::Blinky, Position::new(11, 1));
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Pellet);
        assert_eq!(step.to, Position::new(4, 1));
    }

    #[test]
    fn test_close_pellet_beats_threat_and_frightens() {
        let mut state = corridor("#o      #", 2, 7);
        state.maze.place_entity(EntityType::Blinky, Position::new(6, 1));
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Pellet);
        assert_eq!(step.collected, Some(ItemType::PowerPellet));
        assert!(state.is_frightened_mode());
        assert_eq!(state.frightened_timer, state.rules.frightened_duration);
    }

    #[test]
    fn test_flees_from_adjacent_ghost() {
        let mut state = corridor("#       #", 4, 7);
        state.maze.place_entity(EntityType::Blinky, Position::new(5, 1));
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Flee);
        assert_eq!(step.to, Position::new(3, 1));
    }

    #[test]
    fn test_flee_target_score() {
        let mut state = corridor("#       #", 4, 7);
        state.maze.place_entity(EntityType::Blinky, Position::new(5, 1));
        let mut agent = PacmanAgent::default();
        agent.heatmap.refresh(&state.maze, agent.config.danger_radius);

        let (target, score) = agent.flee_target(&state.maze, Position::new(4, 1)).unwrap();
        assert_eq!(target, Position::new(1, 1));
        // Heat 1 at distance 4 from the ghost, plus 0.5 per cell travelled.
        assert_approx_eq!(score, 2.5);
    }

    #[test]
    fn test_hunts_nearest_ghost_when_frightened() {
        let mut state = corridor("#.        #", 3, 9);
        state.maze.place_entity(EntityType::Clyde, Position::new(8, 1));
        state.maze.place_entity(EntityType::Inky, Position::new(4, 1));
        state.activate_frightened_mode();
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Hunt);
        assert_eq!(step.to, Position::new(4, 1));
        assert_eq!(state.maze.entity_position(EntityType::Inky), Some(step.to));
    }

    #[test]
    fn test_hunt_without_ghosts_eats_dots() {
        let mut state = corridor("#.    .#", 3, 5);
        state.activate_frightened_mode();
        let mut agent = PacmanAgent::default();

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Dot);
        assert_eq!(step.to, Position::new(2, 1));
    }

    #[test]
    fn test_loop_detection_fires_after_threshold() {
        let mut agent = PacmanAgent::default();
        let a = Position::new(2, 1);
        let b = Position::new(3, 1);

        let fired: Vec<bool> = [a, b, a, b, a, b, a, b]
            .into_iter()
            .map(|p| agent.detect_loop(p))
            .collect();
        assert_eq!(fired, [false, false, false, false, false, false, false, true]);

        // A third distinct cell breaks the streak.
        agent.stuck_counter = 0;
        assert!(!agent.detect_loop(Position::new(4, 1)));
        assert_eq!(agent.stuck_counter, 0);
    }

    #[test]
    fn test_unstick_avoids_recent_cells() {
        let mut state = corridor("#     #", 3, 5);
        let mut agent = PacmanAgent::default();
        let (a, b) = (Position::new(2, 1), Position::new(3, 1));
        agent.history.extend([a, b, a, b]);
        agent.stuck_counter = 3;

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Unstick);
        assert_eq!(step.to, Position::new(4, 1));
        assert!(agent.history.is_empty());
        assert_eq!(agent.stuck_counter, 0);
    }

    #[test]
    fn test_fallback_avoids_backtracking() {
        let mut state = corridor("#     #", 3, 5);
        let mut agent = PacmanAgent::default();
        agent.last_position = Some(Position::new(2, 1));

        let step = agent.update(&mut state).unwrap();
        assert_eq!(step.mode, Mode::Fallback);
        assert_eq!(step.to, Position::new(4, 1));
    }

    #[test]
    fn test_heatmap_refresh_cadence() {
        let mut state = corridor("#        #", 1, 8);
        let mut agent = PacmanAgent::default();
        let ghost = Position::new(6, 1);

        agent.update(&mut state);
        state.maze.place_entity(EntityType::Blinky, ghost);

        agent.update(&mut state);
        assert_eq!(agent.heatmap().get(ghost), 0);
        agent.update(&mut state);
        assert_eq!(agent.heatmap().get(ghost), 0);
        agent.update(&mut state);
        assert_eq!(agent.heatmap().get(ghost), 25);
    }

    #[test]
    fn test_reset_forgets_match() {
        let mut state = corridor("#     #", 3, 5);
        let mut agent = PacmanAgent::default();
        agent.update(&mut state);
        agent.history.extend([Position::new(1, 1); 3]);
        agent.stuck_counter = 2;

        agent.reset();
        assert!(agent.history.is_empty());
        assert_eq!(agent.stuck_counter, 0);
        assert_eq!(agent.last_position, None);
        assert_eq!(agent.updates, 0);
    }
}
