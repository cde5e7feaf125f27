//! Static maze terrain, collectibles and live entity coordinates.
//!
//! The maze is the only place where collectible state changes: a collectible is
//! detached from its cell exactly once, and only when Pac-Man steps onto it.

use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MAZE_WIDTH: usize = 28;
pub const MAZE_HEIGHT: usize = 31;

/// Classic board. `#` wall, `.` dot, `o` power pellet, `-` ghost-house door,
/// `=` tunnel carrying a dot, `t` empty tunnel, space empty.
pub const CLASSIC_LAYOUT: [&str; MAZE_HEIGHT] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.#####.##.#####.######",
    "######.#####.##.#####.######",
    "######.##..........##.######",
    "######.##.###--###.##.######",
    "######.##.#      #.##.######",
    "=.........#      #.........=",
    "######.##.#      #.##.######",
    "######.##.########.##.######",
    "######.##..........##.######",
    "######.##.########.##.######",
    "######.##.########.##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##................##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Empty,
    Wall,
    Door,
    Tunnel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    PacDot,
    PowerPellet,
}

/// Live entity identities. The declaration order doubles as the identity value
/// used for deterministic tie-breaking (lower wins).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EntityType {
    Pacman,
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl EntityType {
    pub const GHOSTS: [EntityType; 4] = [
        EntityType::Blinky,
        EntityType::Pinky,
        EntityType::Inky,
        EntityType::Clyde,
    ];

    pub fn is_ghost(self) -> bool {
        self != EntityType::Pacman
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityType::Pacman => "pacman",
            EntityType::Blinky => "blinky",
            EntityType::Pinky => "pinky",
            EntityType::Inky => "inky",
            EntityType::Clyde => "clyde",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Four-connected neighbours in up, down, left, right order.
    pub fn neighbors(self) -> [Position; 4] {
        [
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub tile: TileType,
    pub item: Option<ItemType>,
}

impl Cell {
    pub fn new(tile: TileType, item: Option<ItemType>) -> Self {
        Self { tile, item }
    }

    pub fn wall() -> Self {
        Self::new(TileType::Wall, None)
    }

    pub fn is_wall(&self) -> bool {
        self.tile == TileType::Wall
    }

    pub fn is_walkable(&self) -> bool {
        !self.is_wall()
    }

    pub fn has_pac_dot(&self) -> bool {
        self.item == Some(ItemType::PacDot)
    }

    pub fn has_power_pellet(&self) -> bool {
        self.item == Some(ItemType::PowerPellet)
    }

    /// Detaches the collectible, leaving the cell empty.
    pub fn consume_item(&mut self) -> Option<ItemType> {
        self.item.take()
    }
}

/// Terrain grid plus live and spawn coordinates of the five entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    cells: Vec<Vec<Cell>>,
    entities: BTreeMap<EntityType, Position>,
    spawns: BTreeMap<EntityType, Position>,
    doors: Vec<Position>,
    doors_open: bool,
}

impl Default for Maze {
    fn default() -> Self {
        Self::classic()
    }
}

impl Maze {
    pub fn classic_spawns() -> BTreeMap<EntityType, Position> {
        BTreeMap::from([
            (EntityType::Pacman, Position::new(14, 23)),
            (EntityType::Blinky, Position::new(12, 14)),
            (EntityType::Inky, Position::new(13, 14)),
            (EntityType::Pinky, Position::new(14, 14)),
            (EntityType::Clyde, Position::new(15, 14)),
        ])
    }

    pub fn classic() -> Self {
        match Self::from_layout(&CLASSIC_LAYOUT, Self::classic_spawns()) {
            Ok(maze) => maze,
            Err(e) => unreachable!("classic layout is malformed: {e}"),
        }
    }

    /// Builds a maze from ASCII rows. Every entity starts on its spawn.
    pub fn from_layout<S: AsRef<str>>(
        rows: &[S],
        spawns: BTreeMap<EntityType, Position>,
    ) -> Result<Self, LayoutError> {
        let width = rows.first().ok_or(LayoutError::Empty)?.as_ref().chars().count();
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut cells = Vec::with_capacity(rows.len());
        let mut doors = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    row: y,
                    expected: width,
                    found,
                });
            }

            let mut line = Vec::with_capacity(width);
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::wall(),
                    '.' => Cell::new(TileType::Empty, Some(ItemType::PacDot)),
                    'o' => Cell::new(TileType::Empty, Some(ItemType::PowerPellet)),
                    ' ' => Cell::new(TileType::Empty, None),
                    '-' => Cell::new(TileType::Door, None),
                    '=' => Cell::new(TileType::Tunnel, Some(ItemType::PacDot)),
                    't' => Cell::new(TileType::Tunnel, None),
                    found => return Err(LayoutError::UnknownTile { x, y, found }),
                };
                if cell.tile == TileType::Door {
                    doors.push(Position::new(x as i32, y as i32));
                }
                line.push(cell);
            }
            cells.push(line);
        }

        let mut maze = Self {
            cells,
            entities: spawns.clone(),
            spawns,
            doors,
            doors_open: true,
        };

        for (&entity, &position) in &maze.spawns {
            if !maze.is_valid_position(position.x, position.y) {
                return Err(LayoutError::InvalidSpawn { entity, position });
            }
        }

        Ok(maze)
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.cells.get(y as usize)?.get(x as usize)
    }

    fn get_cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.cells.get_mut(y as usize)?.get_mut(x as usize)
    }

    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        self.get_cell(x, y).is_some_and(Cell::is_walkable)
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.is_valid_position(position.x, position.y)
    }

    pub fn entity_position(&self, entity: EntityType) -> Option<Position> {
        self.entities.get(&entity).copied()
    }

    pub fn spawn_position(&self, entity: EntityType) -> Option<Position> {
        self.spawns.get(&entity).copied()
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityType, Position)> + '_ {
        self.entities.iter().map(|(entity, position)| (*entity, *position))
    }

    /// A ghost is in play once it has left its spawn coordinate.
    pub fn is_in_play(&self, ghost: EntityType) -> bool {
        if !ghost.is_ghost() {
            return false;
        }
        match (self.entity_position(ghost), self.spawn_position(ghost)) {
            (Some(current), Some(spawn)) => current != spawn,
            _ => false,
        }
    }

    pub fn in_play_ghosts(&self) -> Vec<(EntityType, Position)> {
        EntityType::GHOSTS
            .iter()
            .filter(|ghost| self.is_in_play(**ghost))
            .filter_map(|ghost| Some((*ghost, self.entity_position(*ghost)?)))
            .collect()
    }

    /// Moves `entity` by one step. Returns the collectible Pac-Man picked up, if any.
    pub fn move_entity(&mut self, entity: EntityType, dx: i32, dy: i32) -> Option<ItemType> {
        let target = self.entity_position(entity)?.offset(dx, dy);
        if !self.is_walkable(target) {
            return None;
        }

        let collected = if entity == EntityType::Pacman {
            self.get_cell_mut(target.x, target.y)
                .and_then(Cell::consume_item)
        } else {
            None
        };

        self.entities.insert(entity, target);
        collected
    }

    /// Places an entity directly, bypassing adjacency. Refuses invalid targets.
    pub fn place_entity(&mut self, entity: EntityType, position: Position) -> bool {
        if !self.entities.contains_key(&entity) || !self.is_walkable(position) {
            return false;
        }
        self.entities.insert(entity, position);
        true
    }

    pub fn reset_entity(&mut self, entity: EntityType) {
        if let Some(spawn) = self.spawn_position(entity) {
            self.entities.insert(entity, spawn);
        }
    }

    pub fn walkable_neighbors(&self, position: Position) -> Vec<Position> {
        position
            .neighbors()
            .into_iter()
            .filter(|next| self.is_walkable(*next))
            .collect()
    }

    pub fn has_remaining_pac_dots(&self) -> bool {
        self.cells.iter().flatten().any(Cell::has_pac_dot)
    }

    pub fn remaining_pac_dots(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.has_pac_dot()).count()
    }

    /// Every cell still carrying a collectible, in row-major order.
    pub fn items(&self) -> impl Iterator<Item = (Position, ItemType)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, cell)| {
                cell.item.map(|item| (Position::new(x as i32, y as i32), item))
            })
        })
    }

    /// Every walkable coordinate in row-major order.
    pub fn walkable_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, cell)| {
                cell.is_walkable().then(|| Position::new(x as i32, y as i32))
            })
        })
    }

    pub fn doors(&self) -> &[Position] {
        &self.doors
    }

    pub fn doors_open(&self) -> bool {
        self.doors_open
    }

    /// Opens or closes the ghost-house doors in place. Closing turns the door cells
    /// into walls and is refused while any entity stands on one.
    pub fn set_doors_open(&mut self, open: bool) -> bool {
        if open == self.doors_open {
            return true;
        }
        if !open
            && self
                .entities
                .values()
                .any(|position| self.doors.contains(position))
        {
            return false;
        }

        let tile = if open { TileType::Door } else { TileType::Wall };
        for door in self.doors.clone() {
            if let Some(cell) = self.get_cell_mut(door.x, door.y) {
                cell.tile = tile;
            }
        }
        self.doors_open = open;
        true
    }

    #[cfg(test)]
    pub(crate) fn set_item(&mut self, position: Position, item: Option<ItemType>) {
        if let Some(cell) = self.get_cell_mut(position.x, position.y) {
            cell.item = item;
        }
    }
}
