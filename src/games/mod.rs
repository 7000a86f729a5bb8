//! The six built-in game engines and the catalog that constructs them.
//!
//! | id          | engine             | driven by          |
//! |-------------|--------------------|--------------------|
//! | `snake`     | [`SnakeGame`]      | ticks + steering   |
//! | `pong`      | [`PongGame`]       | ticks + paddle     |
//! | `2048`      | [`Game2048`]       | slides             |
//! | `tictactoe` | [`TicTacToeGame`]  | placements         |
//! | `connect4`  | [`ConnectFourGame`]| drops              |
//! | `memory`    | [`MemoryGame`]     | flips + reveal delay |

pub mod board;
pub mod catalog;
pub mod connect_four;
pub mod game2048;
pub mod memory;
pub mod pong;
pub mod snake;
pub mod tictactoe;

pub use board::{Board, BoardScoring};
pub use catalog::{GameCatalog, GameFactory};
pub use connect_four::{ConnectFourGame, Disc};
pub use game2048::Game2048;
pub use memory::{Card, MemoryConfig, MemoryGame};
pub use pong::{PaddleInput, PongConfig, PongGame, Vec2};
pub use snake::{Cell, SnakeConfig, SnakeGame};
pub use tictactoe::{Mark, TicTacToeGame};
