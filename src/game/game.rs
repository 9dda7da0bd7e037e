use std::collections::{BTreeMap, HashSet};

use rand::RngExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{Board, Direction, Position};
use super::panels;

/// Robot identifier, `0..ROBOT_COUNT`.
pub type BotId = u8;

/// Number of robots on every board.
pub const ROBOT_COUNT: u8 = 4;

/// Which robot has to reach which cell. Immutable for the life of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub bot: BotId,
    pub position: Position,
}

/// A single move: the robot and the cell it comes to rest on after sliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub robot_id: BotId,
    pub x: i32,
    pub y: i32,
}

impl Move {
    pub const fn new(robot_id: BotId, x: i32, y: i32) -> Self {
        Self { robot_id, x, y }
    }

    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Why a submitted solution failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("move {index}: unknown robot {robot_id}")]
    UnknownRobot { index: usize, robot_id: BotId },
    #[error("move {index}: destination is not on a straight line from the robot")]
    NotInLine { index: usize },
    #[error("move {index}: the robot is blocked and cannot move")]
    NoOp { index: usize },
    #[error("move {index}: the robot slides to {actual}, not {expected}")]
    WrongStop {
        index: usize,
        expected: Position,
        actual: Position,
    },
    #[error("the target robot does not finish on the target cell")]
    TargetNotReached,
}

/// One game: a board, the current robot positions, and the target.
///
/// Start invariants: robot positions are injective, no robot sits on the
/// target cell or the hub, and the target is one of the board's possible
/// target cells outside the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub board: Board,
    pub robots: BTreeMap<BotId, Position>,
    pub target: Target,
}

impl Game {
    /// The deterministic built-in configuration, used by tests and the
    /// fixed-board switch on game start.
    pub fn fixed() -> Self {
        const VERTICAL: [(i32, i32); 7] =
            [(1, 0), (5, 13), (5, 15), (10, 2), (3, 3), (8, 11), (13, 6)];
        const HORIZONTAL: [(i32, i32); 6] =
            [(0, 12), (5, 12), (9, 5), (12, 10), (6, 3), (3, 7)];
        const TARGETS: [(i32, i32); 12] = [
            (5, 13),
            (2, 0),
            (0, 12),
            (10, 2),
            (3, 3),
            (9, 5),
            (12, 10),
            (8, 11),
            (13, 6),
            (6, 3),
            (3, 7),
            (5, 15),
        ];

        let mut vertical_walls: HashSet<Position> = VERTICAL
            .iter()
            .map(|&(x, y)| Position::new(x, y))
            .collect();
        let mut horizontal_walls: HashSet<Position> = HORIZONTAL
            .iter()
            .map(|&(x, y)| Position::new(x, y))
            .collect();
        panels::add_hub_walls(&mut vertical_walls, &mut horizontal_walls);

        let board = Board::new(
            panels::BOARD_SIZE,
            vertical_walls,
            horizontal_walls,
            TARGETS.iter().map(|&(x, y)| Position::new(x, y)).collect(),
        );

        let robots = BTreeMap::from([
            (0, Position::new(5, 6)),
            (1, Position::new(0, 5)),
            (2, Position::new(10, 3)),
            (3, Position::new(12, 9)),
        ]);

        Self {
            board,
            robots,
            target: Target {
                bot: 0,
                position: Position::new(5, 13),
            },
        }
    }

    /// A fully random game on a freshly composed board.
    pub fn random() -> Self {
        Self::randomized_on(panels::compose_board())
    }

    fn randomized_on(board: Board) -> Self {
        let mut rng = rand::rng();

        let candidates: Vec<Position> = board
            .possible_targets
            .iter()
            .copied()
            .filter(|cell| !board.is_center(*cell))
            .collect();
        let position = candidates
            .get(rng.random_range(0..candidates.len().max(1)))
            .copied()
            .unwrap_or_default();
        let target = Target {
            bot: rng.random_range(0..ROBOT_COUNT),
            position,
        };

        let mut robots = BTreeMap::new();
        for bot in 0..ROBOT_COUNT {
            loop {
                let cell = Position::new(
                    rng.random_range(0..board.size),
                    rng.random_range(0..board.size),
                );
                let taken = robots.values().any(|p| *p == cell)
                    || cell == target.position
                    || board.is_center(cell);
                if !taken {
                    robots.insert(bot, cell);
                    break;
                }
            }
        }

        Self {
            board,
            robots,
            target,
        }
    }

    /// The next game on the same board: the target is re-randomized (never the
    /// previous one, the hub, or an occupied cell) with a fresh robot, and the
    /// robots start from `final_positions` when a winning solution produced
    /// one, else from this game's positions.
    pub fn continuation(&self, final_positions: Option<&BTreeMap<BotId, Position>>) -> Self {
        let robots = final_positions.cloned().unwrap_or_else(|| self.robots.clone());
        let mut rng = rand::rng();

        let candidates: Vec<Position> = self
            .board
            .possible_targets
            .iter()
            .copied()
            .filter(|cell| {
                *cell != self.target.position
                    && !self.board.is_center(*cell)
                    && !robots.values().any(|p| p == cell)
            })
            .collect();
        let position = candidates
            .get(rng.random_range(0..candidates.len().max(1)))
            .copied()
            .unwrap_or(self.target.position);

        Self {
            board: self.board.clone(),
            robots,
            target: Target {
                bot: rng.random_range(0..ROBOT_COUNT),
                position,
            },
        }
    }

    /// Replay `moves` from this game's starting positions, checking every move
    /// against the sliding rule. On success, returns the final game state
    /// (same board and target, robots where the solution leaves them), which
    /// seeds continuation games.
    pub fn verify_solution(&self, moves: &[Move]) -> Result<Game, VerifyError> {
        let mut robots = self.robots.clone();

        for (index, mv) in moves.iter().enumerate() {
            let current = *robots
                .get(&mv.robot_id)
                .ok_or(VerifyError::UnknownRobot {
                    index,
                    robot_id: mv.robot_id,
                })?;
            let destination = mv.position();
            let direction = Direction::between(current, destination)
                .ok_or(VerifyError::NotInLine { index })?;

            let landing = self.board.slide(current, direction, |cell| {
                robots
                    .iter()
                    .any(|(id, pos)| *id != mv.robot_id && *pos == cell)
            });

            if landing == current {
                return Err(VerifyError::NoOp { index });
            }
            if landing != destination {
                return Err(VerifyError::WrongStop {
                    index,
                    expected: destination,
                    actual: landing,
                });
            }

            robots.insert(mv.robot_id, landing);
        }

        if robots.get(&self.target.bot) != Some(&self.target.position) {
            return Err(VerifyError::TargetNotReached);
        }

        Ok(Game {
            board: self.board.clone(),
            robots,
            target: self.target,
        })
    }
}
