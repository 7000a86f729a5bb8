//! Pong: one player paddle against a pursuing opponent.
//!
//! The player's paddle is on the left and follows held `{up, down}` keys; the
//! opponent on the right chases the ball's vertical centre at a lower speed.
//! Returning the ball scores and counts a rally. The ball leaving the left
//! edge ends the session; leaving the right edge counts a point for the
//! player, re-serves and drops back to `Ready` until the host starts again.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::{
    decode, encode, CoreSnapshot, GameAdapter, GameInput, GameState, SessionCore, Snapshot,
    StatDetails,
};
use crate::core::{Clock, GameRng, GameRngState, PerDifficulty};

/// Catalog identifier.
pub const GAME_ID: &str = "pong";

/// Pong tuning. All distances in field units, speeds in units per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PongConfig {
    pub width: f64,
    pub height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Gap between each paddle and its side wall.
    pub paddle_margin: f64,
    pub paddle_speed: f64,
    pub opponent_speed: f64,
    pub serve_speed: f64,
    /// Serve angle is drawn from `±serve_cone × π`.
    pub serve_cone: f64,
    pub player_speedup: f64,
    pub opponent_speedup: f64,
    /// Ceiling on horizontal ball speed after rally speed-ups.
    pub max_ball_speed: f64,
    /// Vertical velocity per unit of contact offset from the paddle centre.
    pub deflection: f64,
    pub return_score: u64,
    /// Milliseconds per tick by difficulty.
    pub tick_ms: PerDifficulty<u64>,
    /// Longest step simulated by one tick, in seconds.
    pub max_step: f64,
}

impl Default for PongConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 360.0,
            paddle_width: 12.0,
            paddle_height: 80.0,
            paddle_margin: 24.0,
            paddle_speed: 260.0,
            opponent_speed: 220.0,
            serve_speed: 260.0,
            serve_cone: 0.3,
            player_speedup: 1.03,
            opponent_speedup: 1.02,
            max_ball_speed: 900.0,
            deflection: 6.0,
            return_score: 1,
            tick_ms: PerDifficulty::new(18, 16, 14, 12),
            max_step: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Held paddle keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddleInput {
    pub up: bool,
    pub down: bool,
}

/// Pong session.
#[derive(Debug)]
pub struct PongGame {
    session: SessionCore,
    config: PongConfig,
    rng: GameRng,
    input: PaddleInput,
    /// Top edge of each paddle.
    player_y: f64,
    opponent_y: f64,
    ball: Vec2,
    velocity: Vec2,
    rallies: u32,
    points_won: u32,
}

impl PongGame {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(GameRng::from_entropy())
    }

    /// New session with a fixed seed (reproducible serves).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(GameRng::new(seed))
    }

    fn with_rng(rng: GameRng) -> Self {
        let config = PongConfig::default();
        let interval = Duration::from_millis(config.tick_ms.medium);
        Self {
            session: SessionCore::new(GAME_ID).with_ticks(interval),
            config,
            rng,
            input: PaddleInput::default(),
            player_y: 0.0,
            opponent_y: 0.0,
            ball: Vec2::default(),
            velocity: Vec2::default(),
            rallies: 0,
            points_won: 0,
        }
    }

    /// Replace the tuning; takes effect at the next `init`.
    #[must_use]
    pub fn with_config(mut self, config: PongConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    // === Queries ===

    #[must_use]
    pub fn config(&self) -> &PongConfig {
        &self.config
    }

    #[must_use]
    pub fn ball(&self) -> Vec2 {
        self.ball
    }

    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Top edges of the player and opponent paddles.
    #[must_use]
    pub fn paddles(&self) -> (f64, f64) {
        (self.player_y, self.opponent_y)
    }

    #[must_use]
    pub fn rallies(&self) -> u32 {
        self.rallies
    }

    // === Commands ===

    /// Update the held paddle keys.
    pub fn set_input(&mut self, input: PaddleInput) -> bool {
        if self.session.state().is_over() {
            return false;
        }
        self.input = input;
        true
    }

    fn paddle_range(&self) -> f64 {
        (self.config.height - self.config.paddle_height).max(0.0)
    }

    /// Centre the paddles and ball, then serve in a random direction.
    fn serve(&mut self) {
        let c = &self.config;
        self.player_y = (c.height - c.paddle_height) / 2.0;
        self.opponent_y = self.player_y;
        self.ball = Vec2::new(c.width / 2.0, c.height / 2.0);

        let cone = self.config.serve_cone;
        let angle = (self.rng.gen_unit() * 2.0 * cone - cone) * PI;
        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let speed = self.config.serve_speed;
        self.velocity = Vec2::new(angle.cos() * speed * side, angle.sin() * speed);
    }

    fn step_seconds(&self) -> f64 {
        let interval = self
            .session
            .ticks()
            .map_or(0.0, |t| t.interval().as_secs_f64());
        interval.min(self.config.max_step)
    }

    fn tick(&mut self, dt: f64) {
        if !self.session.is_playing() {
            return;
        }
        let c = self.config.clone();
        let max_y = self.paddle_range();

        // Paddles
        if self.input.up {
            self.player_y -= c.paddle_speed * dt;
        }
        if self.input.down {
            self.player_y += c.paddle_speed * dt;
        }
        self.player_y = self.player_y.clamp(0.0, max_y);

        let target = self.ball.y - c.paddle_height / 2.0;
        let reach = c.opponent_speed * dt;
        self.opponent_y += (target - self.opponent_y).clamp(-reach, reach);
        self.opponent_y = self.opponent_y.clamp(0.0, max_y);

        // Ball and walls
        let prev_x = self.ball.x;
        self.ball.x += self.velocity.x * dt;
        self.ball.y += self.velocity.y * dt;
        if self.ball.y < 0.0 {
            self.ball.y = 0.0;
            self.velocity.y = -self.velocity.y;
        }
        if self.ball.y > c.height {
            self.ball.y = c.height;
            self.velocity.y = -self.velocity.y;
        }

        // Paddle contact, swept over the whole step so a fast ball cannot
        // skip a paddle between two ticks
        let left_x = c.paddle_margin;
        let right_x = c.width - c.paddle_margin - c.paddle_width;
        let touches = |top: f64, y: f64| y >= top && y <= top + c.paddle_height;
        let (lo, hi) = (prev_x.min(self.ball.x), prev_x.max(self.ball.x));

        if self.velocity.x < 0.0
            && hi >= left_x
            && lo <= left_x + c.paddle_width
            && touches(self.player_y, self.ball.y)
        {
            self.ball.x = left_x + c.paddle_width;
            self.velocity.x = (self.velocity.x.abs() * c.player_speedup).min(c.max_ball_speed);
            self.velocity.y = (self.ball.y - (self.player_y + c.paddle_height / 2.0)) * c.deflection;
            self.rallies += 1;
            self.session.add_score(c.return_score);
        }

        if self.velocity.x > 0.0
            && hi >= right_x
            && lo <= right_x + c.paddle_width
            && touches(self.opponent_y, self.ball.y)
        {
            self.ball.x = right_x;
            self.velocity.x = -(self.velocity.x.abs() * c.opponent_speedup).min(c.max_ball_speed);
            self.velocity.y =
                (self.ball.y - (self.opponent_y + c.paddle_height / 2.0)) * c.deflection;
        }

        // Out of play
        if self.ball.x < 0.0 {
            self.end();
            return;
        }
        if self.ball.x > c.width {
            self.points_won += 1;
            tracing::debug!(game = GAME_ID, points_won = self.points_won, "point won");
            self.serve();
            self.session.back_to_ready();
        }
    }
}

impl Default for PongGame {
    fn default() -> Self {
        Self::new()
    }
}

// === Snapshot ===

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PongSnapshot {
    #[serde(flatten)]
    core: CoreSnapshot,
    player_y: Option<f64>,
    ai_y: Option<f64>,
    ball: Option<Vec2>,
    ball_vel: Option<Vec2>,
    rallies: Option<u32>,
    points_won: Option<u32>,
    tick_ms: Option<u64>,
    rng: Option<GameRngState>,
}

impl GameAdapter for PongGame {
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
        self.input = PaddleInput::default();
        self.rallies = 0;
        self.points_won = 0;
        self.serve();
    }

    fn details(&self) -> StatDetails {
        StatDetails::Pong {
            rallies: self.rallies,
            points_won: self.points_won,
        }
    }

    fn save_state(&self) -> Snapshot {
        encode(
            GAME_ID,
            &PongSnapshot {
                core: self.session.snapshot(),
                player_y: Some(self.player_y),
                ai_y: Some(self.opponent_y),
                ball: Some(self.ball),
                ball_vel: Some(self.velocity),
                rallies: Some(self.rallies),
                points_won: Some(self.points_won),
                tick_ms: self
                    .session
                    .ticks()
                    .and_then(|t| u64::try_from(t.interval().as_millis()).ok()),
                rng: Some(self.rng.state()),
            },
        )
    }

    fn load_state(&mut self, snapshot: &Snapshot) {
        if self.session.state() == GameState::Exit {
            return;
        }
        let Some(snap) = decode::<PongSnapshot>(GAME_ID, snapshot) else {
            return;
        };
        let finite = [snap.player_y, snap.ai_y].iter().flatten().all(|v| v.is_finite())
            && [snap.ball, snap.ball_vel].iter().flatten().all(|v| v.is_finite());
        if !finite {
            tracing::warn!(game = GAME_ID, "ignoring snapshot: non-finite position");
            return;
        }

        let max_y = self.paddle_range();
        if let Some(y) = snap.player_y {
            self.player_y = y.clamp(0.0, max_y);
        }
        if let Some(y) = snap.ai_y {
            self.opponent_y = y.clamp(0.0, max_y);
        }
        if let Some(ball) = snap.ball {
            self.ball = ball;
        }
        if let Some(velocity) = snap.ball_vel {
            self.velocity = velocity;
        }
        if let Some(rallies) = snap.rallies {
            self.rallies = rallies;
        }
        if let Some(points) = snap.points_won {
            self.points_won = points;
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
            GameInput::Paddle { up, down } => self.set_input(PaddleInput { up, down }),
            _ => false,
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        let due = self.session.ticks_mut().map_or(0, |t| t.advance(elapsed));
        let dt = self.step_seconds();
        for _ in 0..due {
            if !self.session.is_playing() {
                break;
            }
            self.tick(dt);
        }
    }
}
