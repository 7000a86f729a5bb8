//! Memory match: flip two cards at a time looking for equal pairs.
//!
//! With two cards face up the move counter increments and resolution waits
//! for `reveal_delay` of play time. Matches stay face up and score
//! `match_points / moves`, so clearing the table in fewer moves pays more.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::adapter::{
    decode, encode, CoreSnapshot, Countdown, GameAdapter, GameInput, GameState, SessionCore,
    Snapshot, StatDetails,
};
use crate::core::{Clock, GameRng, GameRngState, PerDifficulty};

/// Catalog identifier.
pub const GAME_ID: &str = "memory";

/// Memory tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Pairs on the table by difficulty.
    pub pairs: PerDifficulty<u32>,
    /// Delay before two face-up cards are resolved.
    #[serde(with = "millis")]
    pub reveal_delay: Duration,
    /// Numerator of the per-match reward.
    pub match_points: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            pairs: PerDifficulty::new(6, 8, 12, 16),
            reveal_delay: Duration::from_millis(500),
            match_points: 1000,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// One card on the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: usize,
    /// Pair identifier; two cards share each value.
    pub value: u32,
    pub revealed: bool,
    pub matched: bool,
}

/// Memory session.
#[derive(Debug)]
pub struct MemoryGame {
    session: SessionCore,
    config: MemoryConfig,
    rng: GameRng,
    cards: Vec<Card>,
    face_up: SmallVec<[usize; 2]>,
    resolve: Countdown,
    pairs: u32,
    moves: u32,
    matches: u32,
}

impl MemoryGame {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(GameRng::from_entropy())
    }

    /// New session with a fixed seed (reproducible deal).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(GameRng::new(seed))
    }

    fn with_rng(rng: GameRng) -> Self {
        Self {
            session: SessionCore::new(GAME_ID),
            config: MemoryConfig::default(),
            rng,
            cards: Vec::new(),
            face_up: SmallVec::new(),
            resolve: Countdown::default(),
            pairs: 0,
            moves: 0,
            matches: 0,
        }
    }

    /// Replace the tuning; takes effect at the next `init`.
    #[must_use]
    pub fn with_config(mut self, config: MemoryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session = self.session.with_clock(clock);
        self
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub fn matches(&self) -> u32 {
        self.matches
    }

    /// Is a pair face up and waiting to be resolved?
    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.resolve.is_running()
    }

    /// Turn a card face up.
    ///
    /// Rejected while not `Playing`, while two cards await resolution, or
    /// when the card is unknown, already face up or matched.
    pub fn flip_card(&mut self, index: usize) -> bool {
        if !self.session.is_playing() || self.face_up.len() >= 2 {
            return false;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return false;
        };
        if card.revealed || card.matched {
            return false;
        }

        card.revealed = true;
        self.face_up.push(index);
        if self.face_up.len() == 2 {
            self.moves += 1;
            self.resolve.start(self.config.reveal_delay);
        }
        true
    }

    fn resolve_pair(&mut self) {
        let [first, second] = match self.face_up.as_slice() {
            &[a, b] => [a, b],
            _ => {
                self.face_up.clear();
                return;
            }
        };
        self.face_up.clear();

        let value = |i: usize| self.cards.get(i).map(|c| c.value);
        let (Some(x), Some(y)) = (value(first), value(second)) else {
            return;
        };
        let same = x == y;
        for index in [first, second] {
            if let Some(card) = self.cards.get_mut(index) {
                if same {
                    card.matched = true;
                } else {
                    card.revealed = false;
                }
            }
        }

        if same {
            self.matches += 1;
            let points = self.config.match_points / u64::from(self.moves.max(1));
            self.session.add_score(points);
            if self.matches >= self.pairs {
                self.end();
            }
        }
    }

    fn accuracy(&self) -> f64 {
        if self.moves == 0 {
            0.0
        } else {
            f64::from(self.matches) / f64::from(self.moves) * 100.0
        }
    }
}

impl Default for MemoryGame {
    fn default() -> Self {
        Self::new()
    }
}

// === Snapshot ===

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MemorySnapshot {
    #[serde(flatten)]
    core: CoreSnapshot,
    cards: Option<Vec<Card>>,
    revealed_cards: Option<Vec<usize>>,
    /// Milliseconds left before the face-up pair resolves.
    resolve_in_ms: Option<u64>,
    pairs: Option<u32>,
    moves: Option<u32>,
    matches: Option<u32>,
    rng: Option<GameRngState>,
}

impl MemorySnapshot {
    /// Cards are well formed, two per pair, and every face-up index is a
    /// revealed, unmatched card. Fields the snapshot omits are checked as
    /// they stand in `current`.
    fn is_consistent(&self, current: &MemoryGame) -> bool {
        let cards = self.cards.as_deref().unwrap_or(&current.cards);
        let face_up = self.revealed_cards.as_deref().unwrap_or(&current.face_up);
        let pairs = self.pairs.unwrap_or(current.pairs);
        let matches = self.matches.unwrap_or(current.matches);
        let cards_ok = cards.iter().enumerate().all(|(i, c)| c.id == i)
            && usize::try_from(pairs).is_ok_and(|p| p.checked_mul(2) == Some(cards.len()))
            && matches <= pairs;
        let face_up_ok = face_up.len() <= 2
            && face_up
                .iter()
                .all(|&i| cards.get(i).is_some_and(|c| c.revealed && !c.matched));
        cards_ok && face_up_ok
    }
}

impl GameAdapter for MemoryGame {
    fn session(&self) -> &SessionCore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionCore {
        &mut self.session
    }

    fn setup(&mut self) {
        let difficulty = self.session.config().difficulty;
        self.pairs = difficulty.select(&self.config.pairs).max(1);

        let mut values: Vec<u32> = (0..self.pairs).chain(0..self.pairs).collect();
        self.rng.shuffle(&mut values);
        self.cards = values
            .into_iter()
            .enumerate()
            .map(|(id, value)| Card {
                id,
                value,
                revealed: false,
                matched: false,
            })
            .collect();

        self.face_up.clear();
        self.resolve.cancel();
        self.moves = 0;
        self.matches = 0;
    }

    fn details(&self) -> StatDetails {
        StatDetails::Memory {
            moves: self.moves,
            matches: self.matches,
            pairs: self.pairs,
            accuracy: self.accuracy(),
        }
    }

    fn save_state(&self) -> Snapshot {
        encode(
            GAME_ID,
            &MemorySnapshot {
                core: self.session.snapshot(),
                cards: Some(self.cards.clone()),
                revealed_cards: Some(self.face_up.to_vec()),
                resolve_in_ms: self
                    .resolve
                    .remaining()
                    .and_then(|d| u64::try_from(d.as_millis()).ok()),
                pairs: Some(self.pairs),
                moves: Some(self.moves),
                matches: Some(self.matches),
                rng: Some(self.rng.state()),
            },
        )
    }

    fn load_state(&mut self, snapshot: &Snapshot) {
        if self.session.state() == GameState::Exit {
            return;
        }
        let Some(snap) = decode::<MemorySnapshot>(GAME_ID, snapshot) else {
            return;
        };
        if !snap.is_consistent(self) {
            tracing::warn!(game = GAME_ID, "ignoring snapshot: inconsistent cards");
            return;
        }

        if let Some(cards) = snap.cards {
            self.cards = cards;
        }
        if let Some(up) = snap.revealed_cards {
            self.face_up = up.into_iter().collect();
        }
        if let Some(pairs) = snap.pairs {
            self.pairs = pairs;
        }
        if let Some(moves) = snap.moves {
            self.moves = moves;
        }
        if let Some(matches) = snap.matches {
            self.matches = matches;
        }
        if let Some(rng) = &snap.rng {
            self.rng = GameRng::from_state(rng);
        }

        // A complete pair always resolves, immediately if no delay was saved
        self.resolve.cancel();
        if self.face_up.len() == 2 {
            let left = snap.resolve_in_ms.map_or(Duration::ZERO, Duration::from_millis);
            self.resolve.start(left);
        }
        self.session.restore(&snap.core);
    }

    fn handle_input(&mut self, input: GameInput) -> bool {
        match input {
            GameInput::Flip { card } => self.flip_card(card),
            _ => false,
        }
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.session.is_playing() && self.resolve.advance(elapsed) {
            self.resolve_pair();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Difficulty, SessionConfig};

    fn playing(difficulty: Difficulty) -> MemoryGame {
        let mut game = MemoryGame::with_seed(21);
        game.init(SessionConfig::new(difficulty));
        game.start();
        game
    }

    /// Indices of both cards of pair `value`.
    fn pair(game: &MemoryGame, value: u32) -> (usize, usize) {
        let mut it = game.cards().iter().filter(|c| c.value == value).map(|c| c.id);
        (it.next().unwrap(), it.next().unwrap())
    }

    fn mismatch(game: &MemoryGame) -> (usize, usize) {
        let a = pair(game, 0).0;
        let b = pair(game, 1).0;
        (a, b)
    }

    #[test]
    fn test_deal_size_follows_difficulty() {
        for (difficulty, pairs) in [
            (Difficulty::Easy, 6),
            (Difficulty::Medium, 8),
            (Difficulty::Hard, 12),
            (Difficulty::Expert, 16),
        ] {
            let game = playing(difficulty);
            assert_eq!(game.cards().len(), pairs * 2);
            for value in 0..pairs as u32 {
                assert_eq!(game.cards().iter().filter(|c| c.value == value).count(), 2);
            }
        }
    }

    #[test]
    fn test_match_scores_after_delay() {
        let mut game = playing(Difficulty::Easy);
        let (a, b) = pair(&game, 0);

        assert!(game.flip_card(a));
        assert!(game.flip_card(b));
        assert_eq!(game.moves(), 1);
        assert!(game.is_resolving());

        game.advance(Duration::from_millis(499));
        assert_eq!(game.matches(), 0);
        game.advance(Duration::from_millis(1));
        assert_eq!(game.matches(), 1);
        assert_eq!(game.score(), 1000);
        assert!(game.cards()[a].matched && game.cards()[b].matched);
    }

    #[test]
    fn test_mismatch_flips_back() {
        let mut game = playing(Difficulty::Easy);
        let (a, b) = mismatch(&game);

        game.flip_card(a);
        game.flip_card(b);
        game.advance(Duration::from_millis(500));

        assert!(!game.cards()[a].revealed && !game.cards()[b].revealed);
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn test_third_flip_rejected_while_resolving() {
        let mut game = playing(Difficulty::Easy);
        let (a, b) = mismatch(&game);
        let c = pair(&game, 2).0;

        game.flip_card(a);
        assert!(!game.flip_card(a));
        game.flip_card(b);
        assert!(!game.flip_card(c));
        assert!(!game.cards()[c].revealed);
    }

    #[test]
    fn test_reward_shrinks_with_moves() {
        let mut game = playing(Difficulty::Easy);
        let (a, b) = mismatch(&game);
        game.flip_card(a);
        game.flip_card(b);
        game.advance(Duration::from_millis(500));

        let (c, d) = pair(&game, 3);
        game.flip_card(c);
        game.flip_card(d);
        game.advance(Duration::from_millis(500));
        assert_eq!(game.score(), 500);
    }

    #[test]
    fn test_clearing_table_ends_session() {
        let mut game = playing(Difficulty::Easy);
        for value in 0..6 {
            let (a, b) = pair(&game, value);
            game.flip_card(a);
            game.flip_card(b);
            game.advance(Duration::from_millis(500));
        }
        assert_eq!(game.state(), GameState::Finished);
        assert!(game.stats().is_win());
        assert!(matches!(
            game.details(),
            StatDetails::Memory { accuracy, .. } if (accuracy - 100.0).abs() < 1e-9
        ));
    }

    #[test]
    fn test_no_resolution_while_paused() {
        let mut game = playing(Difficulty::Easy);
        let (a, b) = pair(&game, 0);
        game.flip_card(a);
        game.flip_card(b);
        game.pause();

        game.advance(Duration::from_secs(5));
        assert_eq!(game.matches(), 0);

        game.resume();
        game.advance(Duration::from_millis(500));
        assert_eq!(game.matches(), 1);
    }

    #[test]
    fn test_snapshot_pairs_must_match_cards() {
        let mut game = playing(Difficulty::Easy);
        let before = game.cards().to_vec();

        game.load_state(&serde_json::json!({ "pairs": 9 }));
        assert!(matches!(game.details(), StatDetails::Memory { pairs: 6, .. }));

        let mut short = game.save_state();
        short["cards"] = serde_json::to_value(&before[..10]).unwrap();
        game.load_state(&short);
        assert_eq!(game.cards(), &before[..]);

        game.load_state(&serde_json::json!({ "matches": 7 }));
        assert_eq!(game.matches(), 0);
    }
}
