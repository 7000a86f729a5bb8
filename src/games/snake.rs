//! Snake: a tick-driven body on a bounded grid.
//!
//! Each tick the head advances one cell in the current heading. Leaving the
//! grid or entering a body cell ends the session; eating food grows the body
//! by one and respawns food on a random empty cell. A full grid (no room for
//! food) also ends the session.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::adapter::{
    decode, encode, CoreSnapshot, Direction, GameAdapter, GameInput, GameState, SessionCore,
    Snapshot, StatDetails,
};
use crate::core::{Clock, GameRng, GameRngState, PerDifficulty};

/// Catalog identifier.
pub const GAME_ID: &str = "snake";

/// Largest grid side accepted from a snapshot.
const MAX_SIDE: i32 = 256;

/// Snake tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    pub width: i32,
    pub height: i32,
    pub initial_length: usize,
    /// Milliseconds per tick by difficulty.
    pub tick_ms: PerDifficulty<u64>,
    pub food_score: u64,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            initial_length: 3,
            tick_ms: PerDifficulty::new(160, 120, 90, 70),
            food_score: 10,
        }
    }
}

/// A grid cell, `y` growing downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Snake session.
#[derive(Debug)]
pub struct SnakeGame {
    session: SessionCore,
    config: SnakeConfig,
    rng: GameRng,
    width: i32,
    height: i32,
    /// Tail at the front, head at the back.
    body: VecDeque<Cell>,
    food: Option<Cell>,
    direction: Direction,
    next_direction: Direction,
}

impl SnakeGame {
    /// New session with an entropy-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(GameRng::from_entropy())
    }

    /// New session with a fixed seed (reproducible food placement).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(GameRng::new(seed))
    }

    fn with_rng(rng: GameRng) -> Self {
        let config = SnakeConfig::default();
        let interval = Duration::from_millis(config.tick_ms.medium);
        Self {
            session: SessionCore::new(GAME_ID).with_ticks(interval),
            width: config.width,
            height: config.height,
            config,
            rng,
            body: VecDeque::new(),
            food: None,
            direction: Direction::Right,
            next_direction: Direction::Right,
        }
    }

    /// Replace the tuning; takes effect at the next `init`.
    #[must_use]
    pub fn with_config(mut self, config: SnakeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    // === Queries ===

    /// Grid size as `(width, height)`.
    #[must_use]
    pub fn grid_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Body cells, tail first.
    #[must_use]
    pub fn body(&self) -> Vec<Cell> {
        self.body.iter().copied().collect()
    }

    #[must_use]
    pub fn head(&self) -> Option<Cell> {
        self.body.back().copied()
    }

    #[must_use]
    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    // === Commands ===

    /// Queue the heading for the next tick.
    ///
    /// The exact reverse of the current heading is rejected.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.session.state().is_over() || direction == self.direction.opposite() {
            return false;
        }
        self.next_direction = direction;
        true
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    fn tick(&mut self) {
        if !self.session.is_playing() {
            return;
        }

        // Several turns can be queued within one tick
        if self.next_direction != self.direction.opposite() {
            self.direction = self.next_direction;
        }

        let Some(head) = self.head() else {
            self.end();
            return;
        };
        let next = head.step(self.direction);

        if !self.in_bounds(next) || self.body.contains(&next) {
            tracing::debug!(game = GAME_ID, x = next.x, y = next.y, "collision");
            self.end();
            return;
        }

        self.body.push_back(next);

        if self.food == Some(next) {
            self.session.add_score(self.config.food_score);
            self.spawn_food();
            return;
        }

        self.body.pop_front();
    }

    /// Place food on a uniformly random empty cell, or end the session when
    /// the body fills the grid.
    fn spawn_food(&mut self) {
        let occupied: FxHashSet<Cell> = self.body.iter().copied().collect();
        let free: Vec<Cell> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Cell::new(x, y)))
            .filter(|cell| !occupied.contains(cell))
            .collect();

        match self.rng.choose(&free) {
            Some(&cell) => self.food = Some(cell),
            None => {
                self.food = None;
                self.end();
            }
        }
    }
}

impl Default for SnakeGame {
    fn default() -> Self {
        Self::new()
    }
}

// === Snapshot ===

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SnakeSnapshot {
    #[serde(flatten)]
    core: CoreSnapshot,
    width: Option<i32>,
    height: Option<i32>,
    snake: Option<Vec<Cell>>,
    food: Option<Cell>,
    direction: Option<Direction>,
    next_direction: Option<Direction>,
    tick_ms: Option<u64>,
    rng: Option<GameRngState>,
}

impl GameAdapter for SnakeGame {
    fn session(&self) -> &SessionCore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionCore {
        &mut self.session
    }

    fn setup(&mut self) {
        let difficulty = self.session.config().difficulty;
        let interval = Duration::from_millis(difficulty.select(&self.config.tick_ms));
        if let Some(ticks) = self.session.ticks_mut() {
            ticks.set_interval(interval);
        }

        self.width = self.config.width.clamp(2, MAX_SIDE);
        self.height = self.config.height.clamp(1, MAX_SIDE);
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;

        // Centre row, head at the middle column, body trailing to the left
        let length = self.config.initial_length.clamp(1, self.width as usize / 2 + 1);
        let y = self.height / 2;
        let head_x = self.width / 2;
        self.body = (0..length as i32)
            .rev()
            .map(|offset| Cell::new(head_x - offset, y))
            .collect();

        self.spawn_food();
    }

    fn details(&self) -> StatDetails {
        let cells = usize::try_from(self.width * self.height).unwrap_or(usize::MAX);
        StatDetails::Snake {
            length: self.body.len(),
            full_board: self.body.len() >= cells,
        }
    }

    fn save_state(&self) -> Snapshot {
        let snapshot = SnakeSnapshot {
            core: self.session.snapshot(),
            width: Some(self.width),
            height: Some(self.height),
            snake: Some(self.body()),
            food: self.food,
            direction: Some(self.direction),
            next_direction: Some(self.next_direction),
            tick_ms: self
                .session
                .ticks()
                .and_then(|t| u64::try_from(t.interval().as_millis()).ok()),
            rng: Some(self.rng.state()),
        };
        encode(GAME_ID, &snapshot)
    }

    fn load_state(&mut self, snapshot: &Snapshot) {
        if self.session.state() == GameState::Exit {
            return;
        }
        let Some(snap) = decode::<SnakeSnapshot>(GAME_ID, snapshot) else {
            return;
        };

        let width = snap.width.unwrap_or(self.width);
        let height = snap.height.unwrap_or(self.height);
        if !(1..=MAX_SIDE).contains(&width) || !(1..=MAX_SIDE).contains(&height) {
            tracing::warn!(game = GAME_ID, width, height, "ignoring snapshot: bad grid size");
            return;
        }
        let within = |c: &Cell| (0..width).contains(&c.x) && (0..height).contains(&c.y);
        // Cells the snapshot leaves out must still fit a resized grid
        let body_fits = match &snap.snake {
            Some(body) => !body.is_empty() && body.iter().all(within),
            None => self.body.iter().all(within),
        };
        if !body_fits {
            tracing::warn!(game = GAME_ID, "ignoring snapshot: body off the grid");
            return;
        }
        if !snap.food.as_ref().or(self.food.as_ref()).map_or(true, within) {
            tracing::warn!(game = GAME_ID, "ignoring snapshot: food off the grid");
            return;
        }

        self.width = width;
        self.height = height;
        if let Some(body) = snap.snake {
            self.body = body.into();
        }
        if snap.food.is_some() {
            self.food = snap.food;
        }
        if let Some(direction) = snap.direction {
            self.direction = direction;
        }
        if let Some(next) = snap.next_direction {
            self.next_direction = next;
        }
        if let (Some(ms), Some(ticks)) = (snap.tick_ms, self.session.ticks_mut()) {
            ticks.set_interval(Duration::from_millis(ms));
        }
        if let Some(rng) = &snap.rng {
            self.rng = GameRng::from_state(rng);
        }
        self.session.restore(&snap.core);
    }

    fn handle_input(&mut self, input: GameInput) -> bool {
        match input {
            GameInput::Steer { direction } => self.set_direction(direction),
            _ => false,
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        let due = self.session.ticks_mut().map_or(0, |t| t.advance(elapsed));
        for _ in 0..due {
            if !self.session.is_playing() {
                break;
            }
            self.tick();
        }
    }
}
