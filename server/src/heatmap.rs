//! Danger heatmap derived from the positions of in-play ghosts.

use shared::{Maze, Position};

/// Dense per-cell danger scores. Walls and out-of-bounds coordinates read as 0.
#[derive(Debug, Clone, Default)]
pub struct Heatmap {
    width: usize,
    height: usize,
    values: Vec<u32>,
}

impl Heatmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes every walkable cell as the sum over in-play ghosts of
    /// `(radius - distance + 1)^2` for ghosts within `radius`.
    pub fn refresh(&mut self, maze: &Maze, radius: i32) {
        self.width = maze.width();
        self.height = maze.height();
        self.values.clear();
        self.values.resize(self.width * self.height, 0);

        let ghosts = maze.in_play_ghosts();
        if ghosts.is_empty() {
            return;
        }

        for position in maze.walkable_positions() {
            let danger: u32 = ghosts
                .iter()
                .map(|(_, ghost)| position.manhattan(*ghost))
                .filter(|distance| *distance <= radius)
                .map(|distance| {
                    let weight = (radius - distance + 1) as u32;
                    weight * weight
                })
                .sum();
            if let Some(index) = self.index(position) {
                self.values[index] = danger;
            }
        }
    }

    pub fn get(&self, position: Position) -> u32 {
        self.index(position)
            .and_then(|index| self.values.get(index).copied())
            .unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|value| *value = 0);
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as usize, position.y as usize);
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::EntityType;

    #[test]
    fn test_empty_until_ghosts_leave_spawn() {
        let maze = Maze::classic();
        let mut heatmap = Heatmap::new();
        heatmap.refresh(&maze, 4);

        let blinky = maze.entity_position(EntityType::Blinky).unwrap();
        assert_eq!(heatmap.get(blinky), 0);
        assert!(maze.walkable_positions().all(|p| heatmap.get(p) == 0));
    }

    #[test]
    fn test_danger_falls_off_with_distance() {
        let mut maze = Maze::classic();
        let ghost = Position::new(6, 5);
        maze.place_entity(EntityType::Blinky, ghost);

        let mut heatmap = Heatmap::new();
        heatmap.refresh(&maze, 4);

        assert_eq!(heatmap.get(ghost), 25);
        assert_eq!(heatmap.get(Position::new(7, 5)), 16);
        assert_eq!(heatmap.get(Position::new(8, 5)), 9);
        assert_eq!(heatmap.get(Position::new(10, 5)), 1);
        assert_eq!(heatmap.get(Position::new(11, 5)), 0);
    }

    #[test]
    fn test_danger_sums_over_ghosts() {
        let mut maze = Maze::classic();
        maze.place_entity(EntityType::Blinky, Position::new(6, 5));
        maze.place_entity(EntityType::Pinky, Position::new(8, 5));

        let mut heatmap = Heatmap::new();
        heatmap.refresh(&maze, 4);

        // Distance 1 from both ghosts.
        assert_eq!(heatmap.get(Position::new(7, 5)), 16 + 16);
    }

    #[test]
    fn test_walls_and_outside_read_zero() {
        let mut maze = Maze::classic();
        maze.place_entity(EntityType::Blinky, Position::new(1, 1));

        let mut heatmap = Heatmap::new();
        heatmap.refresh(&maze, 4);

        assert_eq!(heatmap.get(Position::new(0, 0)), 0);
        assert_eq!(heatmap.get(Position::new(-3, 1)), 0);
        assert_eq!(heatmap.get(Position::new(1, 100)), 0);

        heatmap.clear();
        assert_eq!(heatmap.get(Position::new(1, 1)), 0);
    }
}
