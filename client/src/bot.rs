//! Headless ghost controllers.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{EntityType, GameState, PlayerAction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Keep going straight, pick a random open direction at walls.
    Wander,
    /// Greedily close in on Pac-Man, back off while frightened.
    Chase,
}

pub struct Bot {
    ghost: EntityType,
    strategy: Strategy,
    rng: StdRng,
    heading: Option<PlayerAction>,
}

impl Bot {
    pub fn new(ghost: EntityType, strategy: Strategy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ghost,
            strategy,
            rng,
            heading: None,
        }
    }

    /// Direction to request next, or `None` when nothing should be sent.
    pub fn decide(&mut self, state: &GameState) -> Option<PlayerAction> {
        let position = state.maze.entity_position(self.ghost)?;
        let open: Vec<PlayerAction> = PlayerAction::ALL
            .into_iter()
            .filter(|action| {
                let (dx, dy) = action.delta();
                state.maze.is_walkable(position.offset(dx, dy))
            })
            .collect();
        if open.is_empty() {
            return None;
        }

        let choice = match self.strategy {
            Strategy::Wander => self.wander(&open),
            Strategy::Chase => chase(state, position, &open),
        };
        self.heading = Some(choice);
        Some(choice)
    }

    fn wander(&mut self, open: &[PlayerAction]) -> PlayerAction {
        if let Some(heading) = self.heading.filter(|heading| open.contains(heading)) {
            return heading;
        }
        // Turning back is the last resort.
        let forward: Vec<PlayerAction> = open
            .iter()
            .copied()
            .filter(|action| Some(action.opposite()) != self.heading)
            .collect();
        let pool: &[PlayerAction] = if forward.is_empty() { open } else { &forward };
        *pool.choose(&mut self.rng).unwrap_or(&open[0])
    }
}

fn chase(state: &GameState, position: Position, open: &[PlayerAction]) -> PlayerAction {
    let Some(target) = state.pacman_position() else {
        return open[0];
    };
    let distance_after = |action: &PlayerAction| {
        let (dx, dy) = action.delta();
        position.offset(dx, dy).manhattan(target)
    };

    let best = if state.is_frightened_mode() {
        open.iter().copied().max_by_key(|action| {
            // Prefer the earliest direction among equals.
            (distance_after(action), std::cmp::Reverse(index_of(*action)))
        })
    } else {
        open.iter().copied().min_by_key(distance_after)
    };
    best.unwrap_or(open[0])
}

fn index_of(action: PlayerAction) -> usize {
    PlayerAction::ALL
        .iter()
        .position(|candidate| *candidate == action)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> GameState {
        let mut state = GameState::new();
        state.start();
        state
    }

    #[test]
    fn test_chase_closes_in() {
        let mut state = running();
        // Blinky on the corridor above the ghost house, Pac-Man to its left.
        state.maze.place_entity(EntityType::Blinky, Position::new(13, 11));
        state.maze.place_entity(EntityType::Pacman, Position::new(9, 11));

        let mut bot = Bot::new(EntityType::Blinky, Strategy::Chase, Some(1));
        assert_eq!(bot.decide(&state), Some(PlayerAction::Left));
    }

    #[test]
    fn test_chase_backs_off_when_frightened() {
        let mut state = running();
        state.maze.place_entity(EntityType::Blinky, Position::new(13, 11));
        state.maze.place_entity(EntityType::Pacman, Position::new(9, 11));
        state.activate_frightened_mode();

        let mut bot = Bot::new(EntityType::Blinky, Strategy::Chase, Some(1));
        let (dx, dy) = bot.decide(&state).unwrap().delta();
        let away = Position::new(13, 11).offset(dx, dy);
        assert!(away.manhattan(Position::new(9, 11)) > 4);
    }

    #[test]
    fn test_wander_only_picks_open_directions() {
        let state = running();
        let mut bot = Bot::new(EntityType::Inky, Strategy::Wander, Some(7));
        let position = state.maze.entity_position(EntityType::Inky).unwrap();

        for _ in 0..20 {
            let action = bot.decide(&state).unwrap();
            let (dx, dy) = action.delta();
            assert!(state.maze.is_walkable(position.offset(dx, dy)));
        }
    }

    #[test]
    fn test_wander_keeps_heading() {
        let state = running();
        let mut bot = Bot::new(EntityType::Pinky, Strategy::Wander, Some(3));
        let first = bot.decide(&state);
        for _ in 0..5 {
            assert_eq!(bot.decide(&state), first);
        }
    }

    #[test]
    fn test_seeded_bots_agree() {
        let state = running();
        let mut a = Bot::new(EntityType::Clyde, Strategy::Wander, Some(42));
        let mut b = Bot::new(EntityType::Clyde, Strategy::Wander, Some(42));
        assert_eq!(a.decide(&state), b.decide(&state));
    }
}
