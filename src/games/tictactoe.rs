//! TicTacToe: two players alternate on a 3×3 board, three in a row wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::{
    decode, encode, BoardOutcome, CoreSnapshot, GameAdapter, GameInput, GameState, SessionCore,
    Snapshot, StatDetails,
};
use crate::core::Clock;

use super::board::{Board, BoardScoring};

/// Catalog identifier.
pub const GAME_ID: &str = "tictactoe";

const SIDE: usize = 3;
const RUN: usize = 3;

/// A player's mark. `X` moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    #[must_use]
    pub const fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    const fn as_winner(self) -> BoardOutcome {
        match self {
            Mark::X => BoardOutcome::FirstPlayer,
            Mark::O => BoardOutcome::SecondPlayer,
        }
    }
}

/// TicTacToe session.
#[derive(Debug)]
pub struct TicTacToeGame {
    session: SessionCore,
    scoring: BoardScoring,
    board: Board<Mark>,
    current: Mark,
    outcome: Option<BoardOutcome>,
    moves: u32,
}

impl TicTacToeGame {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: SessionCore::new(GAME_ID),
            scoring: BoardScoring::default(),
            board: Board::new(SIDE, SIDE),
            current: Mark::X,
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
    pub fn board(&self) -> &Board<Mark> {
        &self.board
    }

    #[must_use]
    pub fn current_player(&self) -> Mark {
        self.current
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BoardOutcome> {
        self.outcome
    }

    /// Mark `(row, col)` for the current player.
    ///
    /// Rejected without mutation when not `Playing`, already decided, out of
    /// range or occupied.
    pub fn place(&mut self, row: usize, col: usize) -> bool {
        if !self.session.is_playing()
            || self.outcome.is_some()
            || !self.board.contains(row, col)
            || self.board.get(row, col).is_some()
        {
            return false;
        }

        self.board.set(row, col, self.current);
        self.moves += 1;

        let outcome = if self.board.longest_line_through(row, col) >= RUN {
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

impl Default for TicTacToeGame {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TicTacToeSnapshot {
    #[serde(flatten)]
    core: CoreSnapshot,
    board: Option<Board<Mark>>,
    current: Option<Mark>,
    winner: Option<BoardOutcome>,
    moves: Option<u32>,
}

impl GameAdapter for TicTacToeGame {
    fn session(&self) -> &SessionCore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionCore {
        &mut self.session
    }

    fn setup(&mut self) {
        self.board = Board::new(SIDE, SIDE);
        self.current = Mark::X;
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
            &TicTacToeSnapshot {
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
        let Some(snap) = decode::<TicTacToeSnapshot>(GAME_ID, snapshot) else {
            return;
        };
        if snap.board.as_ref().is_some_and(|b| !b.has_shape(SIDE, SIDE)) {
            tracing::warn!(game = GAME_ID, "ignoring snapshot: board is not 3x3");
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
            GameInput::Place { row, col } => self.place(row, col),
            _ => false,
        }
    }
}
