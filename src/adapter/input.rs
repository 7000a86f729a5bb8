//! Player input understood by the adapters.

use serde::{Deserialize, Serialize};

/// A cardinal direction on a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit step as `(dx, dy)`, with `y` growing downwards.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Game-specific command routed through [`GameAdapter::handle_input`](super::GameAdapter::handle_input).
///
/// Each adapter accepts the variants that make sense for it and rejects
/// the rest by returning `false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameInput {
    /// Snake: queue the next heading.
    Steer { direction: Direction },
    /// 2048: slide every tile.
    Slide { direction: Direction },
    /// Pong: held paddle keys.
    Paddle { up: bool, down: bool },
    /// TicTacToe: mark a cell.
    Place { row: usize, col: usize },
    /// ConnectFour: drop a disc.
    Drop { column: usize },
    /// Memory: turn a card face up.
    Flip { card: usize },
}
