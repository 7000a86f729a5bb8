//! Session statistics reported by `stats()` and carried by `gameOver`.

use serde::{Deserialize, Serialize};

/// Outcome of a two-player board game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardOutcome {
    /// The player who moves first won.
    FirstPlayer,
    /// The player who moves second won.
    SecondPlayer,
    /// Board full without a winner.
    Draw,
}

/// Game-specific statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum StatDetails {
    Snake {
        length: usize,
        /// The body covers every cell.
        full_board: bool,
    },
    Pong {
        rallies: u32,
        points_won: u32,
    },
    #[serde(rename = "2048")]
    Game2048 {
        max_tile: u32,
        moves: u32,
    },
    Board {
        winner: Option<BoardOutcome>,
        moves: u32,
    },
    Memory {
        moves: u32,
        matches: u32,
        pairs: u32,
        /// Matches per move, in percent.
        accuracy: f64,
    },
}

/// Statistics snapshot of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    /// Current score.
    pub score: u64,

    /// Seconds of play since `start()`; frozen while not playing.
    pub time_elapsed: f64,

    /// Per-game fields.
    #[serde(flatten)]
    pub details: StatDetails,
}

impl GameStats {
    /// Did the session end in a win for the human player?
    ///
    /// Board games count a first-player win, Memory a cleared table and
    /// Snake a body that fills the grid. Pong and 2048 report `false`; their
    /// sessions end on a loss or a stalled board.
    #[must_use]
    pub fn is_win(&self) -> bool {
        match &self.details {
            StatDetails::Board { winner, .. } => *winner == Some(BoardOutcome::FirstPlayer),
            StatDetails::Memory { matches, pairs, .. } => *pairs > 0 && matches == pairs,
            StatDetails::Snake { full_board, .. } => *full_board,
            StatDetails::Pong { .. } | StatDetails::Game2048 { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_serialize_flat() {
        let stats = GameStats {
            score: 120,
            time_elapsed: 3.5,
            details: StatDetails::Snake {
                length: 7,
                full_board: false,
            },
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["score"], 120);
        assert_eq!(value["timeElapsed"], 3.5);
        assert_eq!(value["game"], "snake");
        assert_eq!(value["length"], 7);
        assert_eq!(value["full_board"], false);
        assert!(!stats.is_win());
    }

    #[test]
    fn test_board_win() {
        let stats = GameStats {
            score: 100,
            time_elapsed: 1.0,
            details: StatDetails::Board {
                winner: Some(BoardOutcome::FirstPlayer),
                moves: 5,
            },
        };
        assert!(stats.is_win());
    }
}
