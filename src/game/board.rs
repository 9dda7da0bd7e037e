use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A cell on the board. `0 <= x, y < size`, origin in the top-left corner,
/// `y` growing downwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four sliding directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Direction of the straight line from `from` to `to`, or `None` when the
    /// two cells are equal or share neither a row nor a column.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        if from == to {
            return None;
        }
        if from.x == to.x {
            Some(if to.y < from.y { Self::Up } else { Self::Down })
        } else if from.y == to.y {
            Some(if to.x < from.x { Self::Left } else { Self::Right })
        } else {
            None
        }
    }
}

/// Immutable board geometry: size, wall sets, and the cells a target may be
/// placed on.
///
/// A vertical wall at `(x, y)` sits on the right edge of that cell and blocks
/// movement between `(x, y)` and `(x+1, y)` in both directions; a horizontal
/// wall sits on the bottom edge and blocks between `(x, y)` and `(x, y+1)`.
/// The perimeter is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub size: i32,
    pub vertical_walls: HashSet<Position>,
    pub horizontal_walls: HashSet<Position>,
    pub possible_targets: Vec<Position>,
}

impl Board {
    pub fn new(
        size: i32,
        vertical_walls: HashSet<Position>,
        horizontal_walls: HashSet<Position>,
        possible_targets: Vec<Position>,
    ) -> Self {
        Self {
            size,
            vertical_walls,
            horizontal_walls,
            possible_targets,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.size && pos.y >= 0 && pos.y < self.size
    }

    /// The four cells of the central hub. Robots and targets never sit here.
    pub fn center_cells(&self) -> [Position; 4] {
        let low = self.size / 2 - 1;
        let high = self.size / 2;
        [
            Position::new(low, low),
            Position::new(high, low),
            Position::new(low, high),
            Position::new(high, high),
        ]
    }

    pub fn is_center(&self, pos: Position) -> bool {
        self.center_cells().contains(&pos)
    }

    /// Whether a wall blocks the step out of `from` in `dir`.
    pub fn wall_blocks(&self, from: Position, dir: Direction) -> bool {
        match dir {
            Direction::Right => self.vertical_walls.contains(&from),
            Direction::Left => self
                .vertical_walls
                .contains(&Position::new(from.x - 1, from.y)),
            Direction::Down => self.horizontal_walls.contains(&from),
            Direction::Up => self
                .horizontal_walls
                .contains(&Position::new(from.x, from.y - 1)),
        }
    }

    /// Slide from `start` in `dir` until the next step would leave the board,
    /// cross a wall, or enter an occupied cell. Returns the resting cell;
    /// returns `start` itself when the very first step is blocked.
    pub fn slide<F>(&self, start: Position, dir: Direction, is_occupied: F) -> Position
    where
        F: Fn(Position) -> bool,
    {
        let (dx, dy) = dir.delta();
        let mut current = start;
        loop {
            let next = Position::new(current.x + dx, current.y + dy);
            if !self.contains(next) || self.wall_blocks(current, dir) || is_occupied(next) {
                return current;
            }
            current = next;
        }
    }
}
