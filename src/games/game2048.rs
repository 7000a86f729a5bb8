//! 2048: slide and merge tiles on a 4×4 grid.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::{
    decode, encode, CoreSnapshot, Direction, GameAdapter, GameInput, GameState, SessionCore,
    Snapshot, StatDetails,
};
use crate::core::{Clock, GameRng, GameRngState};

/// Catalog identifier.
pub const GAME_ID: &str = "2048";

/// Grid side length.
pub const SIZE: usize = 4;

/// Probability that a spawned tile is a 2 rather than a 4.
const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// Tile values, row-major, `0` for empty.
pub type Grid = [[u32; SIZE]; SIZE];

/// 2048 session.
#[derive(Debug)]
pub struct Game2048 {
    session: SessionCore,
    rng: GameRng,
    grid: Grid,
    moves: u32,
}

impl Game2048 {
    /// New session with an entropy-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(GameRng::from_entropy())
    }

    /// New session with a fixed seed (reproducible spawns).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(GameRng::new(seed))
    }

    fn with_rng(rng: GameRng) -> Self {
        Self {
            session: SessionCore::new(GAME_ID),
            rng,
            grid: [[0; SIZE]; SIZE],
            moves: 0,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn max_tile(&self) -> u32 {
        self.grid.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Slide every tile towards `direction`.
    ///
    /// Returns `false` (grid untouched, nothing spawned) when no tile can
    /// move or merge, or when the session is not `Playing`.
    pub fn slide(&mut self, direction: Direction) -> bool {
        if !self.session.is_playing() {
            return false;
        }

        let mut grid = self.grid;
        let gained = slide_grid(&mut grid, direction);
        if grid == self.grid {
            return false;
        }

        self.grid = grid;
        self.moves += 1;
        for value in gained {
            self.session.add_score(u64::from(value));
        }

        self.spawn_tile();
        if !has_moves(&self.grid) {
            self.end();
        }
        true
    }

    /// Put a 2 (or sometimes a 4) on a uniformly random empty cell.
    fn spawn_tile(&mut self) {
        let empty: Vec<(usize, usize)> = (0..SIZE)
            .flat_map(|y| (0..SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| self.grid[y][x] == 0)
            .collect();

        if let Some(&(x, y)) = self.rng.choose(&empty) {
            self.grid[y][x] = if self.rng.gen_bool(SPAWN_TWO_PROBABILITY) {
                2
            } else {
                4
            };
        }
    }
}

impl Default for Game2048 {
    fn default() -> Self {
        Self::new()
    }
}

/// Slide `grid` in place and return the value of every merge, in order.
///
/// Tiles are processed starting from the edge they move towards. Each tile
/// steps until it hits the boundary or another tile; an equal tile that has
/// not already merged this move absorbs it.
pub fn slide_grid(grid: &mut Grid, direction: Direction) -> Vec<u32> {
    let mut merged = [[false; SIZE]; SIZE];
    let mut gained = Vec::new();
    let (dx, dy) = direction.delta();

    let forward: [usize; SIZE] = [0, 1, 2, 3];
    let backward: [usize; SIZE] = [3, 2, 1, 0];
    let xs = if direction == Direction::Right { backward } else { forward };
    let ys = if direction == Direction::Down { backward } else { forward };

    for &y in &ys {
        for &x in &xs {
            if grid[y][x] == 0 {
                continue;
            }

            let (mut cx, mut cy) = (x, y);
            loop {
                let nx = cx as i32 + dx;
                let ny = cy as i32 + dy;
                if !(0..SIZE as i32).contains(&nx) || !(0..SIZE as i32).contains(&ny) {
                    break;
                }
                let (nx, ny) = (nx as usize, ny as usize);

                if grid[ny][nx] == 0 {
                    grid[ny][nx] = grid[cy][cx];
                    grid[cy][cx] = 0;
                    cx = nx;
                    cy = ny;
                    continue;
                }

                if grid[ny][nx] == grid[cy][cx] && !merged[ny][nx] {
                    let value = grid[ny][nx].saturating_mul(2);
                    grid[ny][nx] = value;
                    grid[cy][cx] = 0;
                    merged[ny][nx] = true;
                    gained.push(value);
                }
                break;
            }
        }
    }

    gained
}

/// Can any direction change the grid?
#[must_use]
pub fn has_moves(grid: &Grid) -> bool {
    (0..SIZE).any(|y| {
        (0..SIZE).any(|x| {
            let v = grid[y][x];
            v == 0
                || (x + 1 < SIZE && grid[y][x + 1] == v)
                || (y + 1 < SIZE && grid[y + 1][x] == v)
        })
    })
}

// === Snapshot ===

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Game2048Snapshot {
    #[serde(flatten)]
    core: CoreSnapshot,
    grid: Option<Grid>,
    moves: Option<u32>,
    rng: Option<GameRngState>,
}

impl GameAdapter for Game2048 {
    fn session(&self) -> &SessionCore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionCore {
        &mut self.session
    }

    fn setup(&mut self) {
        self.grid = [[0; SIZE]; SIZE];
        self.moves = 0;
        self.spawn_tile();
        self.spawn_tile();
    }

    fn details(&self) -> StatDetails {
        StatDetails::Game2048 {
            max_tile: self.max_tile(),
            moves: self.moves,
        }
    }

    fn save_state(&self) -> Snapshot {
        encode(
            GAME_ID,
            &Game2048Snapshot {
                core: self.session.snapshot(),
                grid: Some(self.grid),
                moves: Some(self.moves),
                rng: Some(self.rng.state()),
            },
        )
    }

    fn load_state(&mut self, snapshot: &Snapshot) {
        if self.session.state() == GameState::Exit {
            return;
        }
        let Some(snap) = decode::<Game2048Snapshot>(GAME_ID, snapshot) else {
            return;
        };
        if let Some(grid) = &snap.grid {
            if grid.iter().flatten().any(|&v| v == 1 || (v != 0 && !v.is_power_of_two())) {
                tracing::warn!(game = GAME_ID, "ignoring snapshot: tile is not a power of two");
                return;
            }
        }

        if let Some(grid) = snap.grid {
            self.grid = grid;
        }
        if let Some(moves) = snap.moves {
            self.moves = moves;
        }
        if let Some(rng) = &snap.rng {
            self.rng = GameRng::from_state(rng);
        }
        self.session.restore(&snap.core);
    }

    fn handle_input(&mut self, input: GameInput) -> bool {
        match input {
            GameInput::Slide { direction } => self.slide(direction),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionConfig;

    fn playing_with(grid: Grid) -> Game2048 {
        let mut game = Game2048::with_seed(5);
        game.init(SessionConfig::default());
        game.start();
        game.grid = grid;
        game
    }

    #[test]
    fn test_setup_spawns_two_tiles() {
        let mut game = Game2048::with_seed(9);
        game.init(SessionConfig::default());
        let tiles: Vec<u32> = game.grid().iter().flatten().copied().filter(|&v| v > 0).collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|&v| v == 2 || v == 4));
    }

    #[test]
    fn test_merge_once_per_move() {
        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[0] = [2, 2, 4, 0];
        let gained = slide_grid(&mut grid, Direction::Left);
        assert_eq!(grid[0], [4, 4, 0, 0]);
        assert_eq!(gained, vec![4]);

        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[0] = [2, 2, 2, 2];
        let gained = slide_grid(&mut grid, Direction::Left);
        assert_eq!(grid[0], [4, 4, 0, 0]);
        assert_eq!(gained, vec![4, 4]);
    }

    #[test]
    fn test_slide_right_and_down() {
        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[1] = [2, 0, 0, 2];
        slide_grid(&mut grid, Direction::Right);
        assert_eq!(grid[1], [0, 0, 0, 4]);

        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[0][2] = 8;
        grid[2][2] = 8;
        slide_grid(&mut grid, Direction::Down);
        assert_eq!(grid[3][2], 16);
        assert_eq!(grid[0][2], 0);
    }

    #[test]
    fn test_move_scores_merges_and_spawns() {
        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[0] = [2, 2, 0, 0];
        let mut game = playing_with(grid);

        assert!(game.slide(Direction::Left));
        assert_eq!(game.score(), 4);
        assert_eq!(game.grid()[0][0], 4);
        let tiles = game.grid().iter().flatten().filter(|&&v| v > 0).count();
        assert_eq!(tiles, 2);
    }

    #[test]
    fn test_noop_move_leaves_grid_identical() {
        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[0] = [2, 4, 0, 0];
        let mut game = playing_with(grid);

        assert!(!game.slide(Direction::Left));
        assert_eq!(*game.grid(), grid);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_stalled_board_ends_session() {
        // The gap opens next to 32 and 64, so neither a 2 nor a 4 can merge
        let grid: Grid = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 64], [0, 8, 16, 32]];
        let mut game = playing_with(grid);

        assert!(game.slide(Direction::Left));
        assert_eq!(game.grid()[3][..3], [8, 16, 32]);
        assert!(!has_moves(game.grid()));
        assert_eq!(game.state(), GameState::Finished);
    }

    #[test]
    fn test_has_moves() {
        let full: Grid = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
        assert!(!has_moves(&full));

        let mut mergeable = full;
        mergeable[3][3] = 4;
        assert!(has_moves(&mergeable));
    }

    #[test]
    fn test_slide_rejected_while_paused() {
        let mut grid: Grid = [[0; SIZE]; SIZE];
        grid[0] = [2, 2, 0, 0];
        let mut game = playing_with(grid);
        game.pause();
        assert!(!game.slide(Direction::Left));
        assert_eq!(*game.grid(), grid);
    }
}
