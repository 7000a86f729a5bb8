//! ConnectFour: discs drop to the lowest empty row of a 6×7 board; four in a
//! row wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::{
    decode, encode, BoardOutcome, CoreSnapshot, GameAdapter, GameInput, GameState, SessionCore,
    Snapshot, StatDetails,
};
use crate::core::Clock;

use super::board::{Board, BoardScoring};

/// Catalog identifier.
pub const GAME_ID: &str = "connect4";

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
const RUN: usize = 4;

/// Disc colour. Red moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disc {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "Y")]
    Yellow,
}

impl Disc {
    #[must_use]
    pub const fn other(self) -> Disc {
        match self {
            Disc::Red => Disc::Yellow,
            Disc::Yellow => Disc::Red,
        }
    }

    const fn as_winner(self) -> BoardOutcome {
        match self {
            Disc::Red => BoardOutcome::FirstPlayer,
            Disc::Yellow => BoardOutcome::SecondPlayer,
        }
    }
}

fn default_scoring() -> BoardScoring {
    BoardScoring {
        first_player_win: 140,
        second_player_win: 110,
        draw: 60,
    }
}

/// ConnectFour session.
#[derive(Debug)]
pub struct ConnectFourGame {
    session: SessionCore,
    scoring: BoardScoring,
    board: Board<Disc>,
    current: Disc,
    outcome: Option<BoardOutcome>,
    moves: u32,
}

impl ConnectFourGame {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: SessionCore::new(GAME_ID),
            scoring: default_scoring(),
            board: Board::new(ROWS, COLS),
            current: Disc::Red,
            outcome: None,
            moves: 0,
        }
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: BoardScoring) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    #[must_use]
    pub fn board(&self) -> &Board<Disc> {
        &self.board
    }

    #[must_use]
    pub fn current_player(&self) -> Disc {
        self.current
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BoardOutcome> {
        self.outcome
    }

    /// Drop a disc for the current player into `column`.
    ///
    /// Rejected without mutation when not `Playing`, already decided, the
    /// column is out of range or full.
    pub fn drop_disc(&mut self, column: usize) -> bool {
        if !self.session.is_playing() || self.outcome.is_some() || column >= COLS {
            return false;
        }
        let Some(row) = (0..ROWS).rev().find(|&r| self.board.get(r, column).is_none()) else {
            return false;
        };

        self.board.set(row, column, self.current);
        self.moves += 1;

        let outcome = if self.board.longest_line_through(row, column) >= RUN {
            Some(self.current.as_winner())
        } else if self.board.is_full() {
            Some(BoardOutcome::Draw)
        } else {
            None
        };

        match outcome {
            Some(outcome) => {
                self.outcome = Some(outcome);
                self.session.add_score(self.scoring.points(outcome));
                self.end();
            }
            None => self.current = self.current.other(),
        }
        true
    }
}

impl Default for ConnectFourGame {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConnectFourSnapshot {
    #[serde(flatten)]
    core: CoreSnapshot,
    board: Option<Board<Disc>>,
    current: Option<Disc>,
    winner: Option<BoardOutcome>,
    moves: Option<u32>,
}

impl GameAdapter for ConnectFourGame {
    fn session(&self) -> &SessionCore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionCore {
        &mut self.session
    }

    fn setup(&mut self) {
        self.board = Board::new(ROWS, COLS);
        self.current = Disc::Red;
        self.outcome = None;
        self.moves = 0;
    }

    fn details(&self) -> StatDetails {
        StatDetails::Board {
            winner: self.outcome,
            moves: self.moves,
        }
    }

    fn save_state(&self) -> Snapshot {
        encode(
            GAME_ID,
            &ConnectFourSnapshot {
                core: self.session.snapshot(),
                board: Some(self.board.clone()),
                current: Some(self.current),
                winner: self.outcome,
                moves: Some(self.moves),
            },
        )
    }

    fn load_state(&mut self, snapshot: &Snapshot) {
        if self.session.state() == GameState::Exit {
            return;
        }
        let Some(snap) = decode::<ConnectFourSnapshot>(GAME_ID, snapshot) else {
            return;
        };
        if snap.board.as_ref().is_some_and(|b| !b.has_shape(ROWS, COLS)) {
            tracing::warn!(game = GAME_ID, "ignoring snapshot: board is not 6x7");
            return;
        }

        // A saved board carries its outcome, including "undecided"
        if let Some(board) = snap.board {
            self.board = board;
            self.outcome = snap.winner;
        }
        if let Some(current) = snap.current {
            self.current = current;
        }
        if let Some(moves) = snap.moves {
            self.moves = moves;
        }
        self.session.restore(&snap.core);
    }

    fn handle_input(&mut self, input: GameInput) -> bool {
        match input {
            GameInput::Drop { column } => self.drop_disc(column),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionConfig;

    fn playing() -> ConnectFourGame {
        let mut game = ConnectFourGame::new();
        game.init(SessionConfig::default());
        game.start();
        game
    }

    #[test]
    fn test_discs_stack_from_the_bottom() {
        let mut game = playing();
        assert!(game.drop_disc(3));
        assert!(game.drop_disc(3));
        assert_eq!(game.board().get(5, 3), Some(Disc::Red));
        assert_eq!(game.board().get(4, 3), Some(Disc::Yellow));
    }

    #[test]
    fn test_vertical_win_for_first_player() {
        let mut game = playing();
        for col in [0, 1, 0, 1, 0, 1, 0] {
            assert!(game.drop_disc(col));
        }
        assert_eq!(game.outcome(), Some(BoardOutcome::FirstPlayer));
        assert_eq!(game.score(), 140);
        assert_eq!(game.state(), GameState::Finished);
        assert!(!game.drop_disc(2));
    }

    #[test]
    fn test_horizontal_win_for_second_player() {
        let mut game = playing();
        for col in [0, 1, 0, 2, 0, 3, 6, 4] {
            assert!(game.drop_disc(col));
        }
        assert_eq!(game.outcome(), Some(BoardOutcome::SecondPlayer));
        assert_eq!(game.score(), 110);
    }

    #[test]
    fn test_full_column_is_rejected() {
        let mut game = playing();
        for _ in 0..ROWS {
            assert!(game.drop_disc(2));
        }
        let board = game.board().clone();
        let current = game.current_player();

        assert!(!game.drop_disc(2));
        assert_eq!(*game.board(), board);
        assert_eq!(game.current_player(), current);
    }

    #[test]
    fn test_mid_game_save_restores_over_finished_game() {
        let mut source = playing();
        assert!(source.drop_disc(3));
        let saved = source.save_state();

        let mut game = playing();
        for col in [0, 1, 0, 1, 0, 1, 0] {
            game.drop_disc(col);
        }
        assert_eq!(game.outcome(), Some(BoardOutcome::FirstPlayer));

        game.load_state(&saved);
        assert_eq!(game.outcome(), None);
        assert_eq!(game.current_player(), Disc::Yellow);
        game.resume();

        assert!(game.drop_disc(3));
        assert_eq!(game.board().get(4, 3), Some(Disc::Yellow));
        assert_eq!(game.board().filled(), 2);
    }

    #[test]
    fn test_out_of_range_column() {
        let mut game = playing();
        assert!(!game.drop_disc(COLS));
        assert_eq!(game.board().filled(), 0);
    }
}
