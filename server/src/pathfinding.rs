//! Weighted A* over the four-connected maze grid.

use crate::heatmap::Heatmap;
use shared::{Maze, Position};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// How much a step should care about danger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepCost {
    /// Every step costs 1.
    Distance,
    /// A step costs `1 + surcharge * heat(destination)`.
    Risk { surcharge: f64 },
}

impl StepCost {
    pub fn of(self, heatmap: &Heatmap, destination: Position) -> f64 {
        match self {
            StepCost::Distance => 1.0,
            StepCost::Risk { surcharge } => 1.0 + surcharge * f64::from(heatmap.get(destination)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f64,
    g: f64,
    h: i32,
    position: Position,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // Reversed so the max-heap pops the lowest f, then lowest h, then row-major.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.position.y.cmp(&self.position.y))
            .then_with(|| other.position.x.cmp(&self.position.x))
    }
}

/// Finds a path from `start` to `goal`. The returned steps exclude `start`, so
/// `Some(vec![])` means the goal is already reached.
pub fn astar(
    maze: &Maze,
    heatmap: &Heatmap,
    start: Position,
    goal: Position,
    cost: StepCost,
) -> Option<Vec<Position>> {
    if !maze.is_walkable(start) || !maze.is_walkable(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<Position, f64> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();

    g_score.insert(start, 0.0);
    let h = start.manhattan(goal);
    open.push(OpenNode {
        f: f64::from(h),
        g: 0.0,
        h,
        position: start,
    });

    while let Some(current) = open.pop() {
        let position = current.position;
        if position == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }

        let current_g = g_score.get(&position).copied().unwrap_or(f64::INFINITY);
        if current.g > current_g {
            // Stale heap entry superseded by a cheaper route.
            continue;
        }

        for next in maze.walkable_neighbors(position) {
            let tentative = current_g + cost.of(heatmap, next);
            if tentative < g_score.get(&next).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(next, position);
                g_score.insert(next, tentative);
                let h = next.manhattan(goal);
                open.push(OpenNode {
                    f: tentative + f64::from(h),
                    g: tentative,
                    h,
                    position: next,
                });
            }
        }
    }

    None
}

fn reconstruct_path(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(previous) = came_from.get(&current) {
        if *previous == start {
            break;
        }
        path.push(*previous);
        current = *previous;
    }
    path.reverse();
    path
}
