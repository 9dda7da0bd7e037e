//! Random board composition.
//!
//! A full board is assembled from four 8x8 quadrant panels. Each panel is
//! authored for the top-left quadrant; composition shuffles the panels and
//! rotates each one clockwise into its quadrant, then adds the walls around
//! the central hub.

use std::collections::HashSet;

use rand::RngExt;

use super::board::{Board, Position};

pub const PANEL_SIZE: i32 = 8;
pub const BOARD_SIZE: i32 = 16;

/// Which edge of a panel cell a wall is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

struct PanelSpec {
    walls: &'static [(i32, i32, Side)],
    targets: &'static [(i32, i32)],
}

// Each target cell carries a two-wall elbow; the remaining walls are border
// spurs. Coordinates are panel-local. The inner corner cell (7, 7) maps onto
// the hub under every rotation and is kept clear.
static PANELS: [PanelSpec; 4] = [
    PanelSpec {
        walls: &[
            (1, 2, Side::Bottom),
            (1, 2, Side::Right),
            (5, 1, Side::Left),
            (5, 1, Side::Bottom),
            (3, 6, Side::Top),
            (3, 6, Side::Right),
            (6, 4, Side::Bottom),
            (6, 4, Side::Left),
            (2, 0, Side::Right),
            (0, 5, Side::Bottom),
        ],
        targets: &[(1, 2), (5, 1), (3, 6), (6, 4)],
    },
    PanelSpec {
        walls: &[
            (2, 1, Side::Top),
            (2, 1, Side::Left),
            (6, 2, Side::Right),
            (6, 2, Side::Top),
            (1, 5, Side::Left),
            (1, 5, Side::Bottom),
            (4, 4, Side::Right),
            (4, 4, Side::Bottom),
            (5, 0, Side::Right),
            (0, 3, Side::Bottom),
        ],
        targets: &[(2, 1), (6, 2), (1, 5), (4, 4)],
    },
    PanelSpec {
        walls: &[
            (1, 3, Side::Right),
            (1, 3, Side::Top),
            (6, 5, Side::Left),
            (6, 5, Side::Top),
            (3, 2, Side::Left),
            (3, 2, Side::Bottom),
            (5, 6, Side::Right),
            (5, 6, Side::Bottom),
            (4, 0, Side::Right),
            (0, 6, Side::Bottom),
        ],
        targets: &[(1, 3), (6, 5), (3, 2), (5, 6)],
    },
    PanelSpec {
        walls: &[
            (2, 4, Side::Left),
            (2, 4, Side::Top),
            (5, 2, Side::Right),
            (5, 2, Side::Bottom),
            (1, 6, Side::Right),
            (1, 6, Side::Top),
            (6, 6, Side::Left),
            (6, 6, Side::Bottom),
            (6, 0, Side::Right),
            (0, 2, Side::Bottom),
        ],
        targets: &[(2, 4), (5, 2), (1, 6), (6, 6)],
    },
];

/// Quadrant offsets in placement order: top-left, top-right, bottom-right,
/// bottom-left. Quadrant `k` applies `k` clockwise quarter turns, which maps
/// the panel's outer corner onto the board's outer corner.
const QUADRANT_OFFSETS: [(i32, i32); 4] = [(0, 0), (8, 0), (8, 8), (0, 8)];

fn rotate_cell(x: i32, y: i32, quarter_turns: usize) -> (i32, i32) {
    match quarter_turns % 4 {
        0 => (x, y),
        1 => (PANEL_SIZE - 1 - y, x),
        2 => (PANEL_SIZE - 1 - x, PANEL_SIZE - 1 - y),
        _ => (y, PANEL_SIZE - 1 - x),
    }
}

fn rotate_side(side: Side, quarter_turns: usize) -> Side {
    const CLOCKWISE: [Side; 4] = [Side::Right, Side::Bottom, Side::Left, Side::Top];
    let index = CLOCKWISE
        .iter()
        .position(|s| *s == side)
        .unwrap_or_default();
    CLOCKWISE[(index + quarter_turns) % 4]
}

/// Compose a full board from a random arrangement of the four panels.
pub fn compose_board() -> Board {
    let mut rng = rand::rng();

    let mut order = [0usize, 1, 2, 3];
    for i in (1..order.len()).rev() {
        let j = rng.random_range(0..=i);
        order.swap(i, j);
    }

    let mut vertical_walls = HashSet::new();
    let mut horizontal_walls = HashSet::new();
    let mut possible_targets = Vec::new();

    for (quadrant, &panel_index) in order.iter().enumerate() {
        let panel = &PANELS[panel_index % PANELS.len()];
        let (offset_x, offset_y) = QUADRANT_OFFSETS[quadrant % QUADRANT_OFFSETS.len()];

        for &(x, y, side) in panel.walls {
            let (rx, ry) = rotate_cell(x, y, quadrant);
            let cell = Position::new(rx + offset_x, ry + offset_y);
            // Normalize left/top edges onto the neighbour cell; walls that
            // normalize onto the perimeter are already implicit.
            match rotate_side(side, quadrant) {
                Side::Right => {
                    vertical_walls.insert(cell);
                }
                Side::Bottom => {
                    horizontal_walls.insert(cell);
                }
                Side::Left => {
                    if cell.x > 0 {
                        vertical_walls.insert(Position::new(cell.x - 1, cell.y));
                    }
                }
                Side::Top => {
                    if cell.y > 0 {
                        horizontal_walls.insert(Position::new(cell.x, cell.y - 1));
                    }
                }
            }
        }

        for &(x, y) in panel.targets {
            let (rx, ry) = rotate_cell(x, y, quadrant);
            possible_targets.push(Position::new(rx + offset_x, ry + offset_y));
        }
    }

    add_hub_walls(&mut vertical_walls, &mut horizontal_walls);

    Board::new(BOARD_SIZE, vertical_walls, horizontal_walls, possible_targets)
}

/// Wall off the four central hub cells of a 16x16 board.
pub fn add_hub_walls(vertical_walls: &mut HashSet<Position>, horizontal_walls: &mut HashSet<Position>) {
    for y in [7, 8] {
        vertical_walls.insert(Position::new(6, y));
        vertical_walls.insert(Position::new(8, y));
    }
    for x in [7, 8] {
        horizontal_walls.insert(Position::new(x, 6));
        horizontal_walls.insert(Position::new(x, 8));
    }
}
