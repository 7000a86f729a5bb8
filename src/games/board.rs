//! Fixed-size board shared by the alternating-turn games.

use serde::{Deserialize, Serialize};

use crate::adapter::BoardOutcome;

/// Points awarded when a board game reaches its outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardScoring {
    pub first_player_win: u64,
    pub second_player_win: u64,
    pub draw: u64,
}

impl BoardScoring {
    /// Points for an outcome.
    #[must_use]
    pub fn points(&self, outcome: BoardOutcome) -> u64 {
        match outcome {
            BoardOutcome::FirstPlayer => self.first_player_win,
            BoardOutcome::SecondPlayer => self.second_player_win,
            BoardOutcome::Draw => self.draw,
        }
    }
}

impl Default for BoardScoring {
    fn default() -> Self {
        Self {
            first_player_win: 100,
            second_player_win: 60,
            draw: 40,
        }
    }
}

/// Row-major grid of optional marks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board<T> {
    rows: Vec<Vec<Option<T>>>,
}

/// The four line orientations: horizontal, vertical and both diagonals.
const LINES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

impl<T: Copy + PartialEq> Board<T> {
    /// Create an empty board.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![vec![None; cols]; rows],
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Does this board have exactly the given shape?
    #[must_use]
    pub fn has_shape(&self, rows: usize, cols: usize) -> bool {
        self.rows.len() == rows && self.rows.iter().all(|r| r.len() == cols)
    }

    /// Cell contents; `None` for empty or out-of-range cells.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.rows.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Is `(row, col)` on the board?
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.row_count() && col < self.col_count()
    }

    /// Place a mark. The caller checks range and occupancy.
    pub fn set(&mut self, row: usize, col: usize, mark: T) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = Some(mark);
        }
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Are all cells occupied?
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.rows.iter().flatten().all(Option::is_some)
    }

    /// Rows as nested vectors, top row first.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<T>>] {
        &self.rows
    }

    /// Longest run of equal marks through `(row, col)` along any line.
    ///
    /// Returns 0 for an empty cell.
    #[must_use]
    pub fn longest_line_through(&self, row: usize, col: usize) -> usize {
        let Some(mark) = self.get(row, col) else {
            return 0;
        };

        LINES
            .iter()
            .map(|&(dr, dc)| {
                1 + self.count_from(row, col, dr, dc, mark) + self.count_from(row, col, -dr, -dc, mark)
            })
            .max()
            .unwrap_or(1)
    }

    fn count_from(&self, row: usize, col: usize, dr: isize, dc: isize, mark: T) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while r >= 0 && c >= 0 && self.get(r as usize, c as usize) == Some(mark) {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}
