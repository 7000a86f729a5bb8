//! Seeded randomness for game sessions.
//!
//! Food placement, tile spawns, card shuffles and serve angles all draw from
//! one [`GameRng`] per session. Its position is part of the session snapshot,
//! so a restored session continues with the same draws it would have made.
//!
//! ```
//! use arcade_hub::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! let saved = rng.state();
//! let first = rng.gen_unit();
//!
//! let mut replay = GameRng::from_state(&saved);
//! assert_eq!(replay.gen_unit(), first);
//! ```

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// ChaCha8 stream owned by a single session.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from the thread RNG. Catalog-built games start here.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Uniform in `[0, 1)`.
    pub fn gen_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// `true` with the given probability, clamped to `[0, 1]`.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Pick one element; `None` for an empty slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }

    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Seed plus stream position. Constant size however many draws were made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRngState {
    pub seed: u64,
    pub word_pos: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_shuffle() {
        let mut deck_a: Vec<u32> = (0..24).collect();
        let mut deck_b = deck_a.clone();

        GameRng::new(9).shuffle(&mut deck_a);
        GameRng::new(9).shuffle(&mut deck_b);
        assert_eq!(deck_a, deck_b);

        deck_b.sort_unstable();
        assert_eq!(deck_b, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn test_choose_from_free_cells() {
        let mut rng = GameRng::new(3);
        let free = [(0, 1), (2, 2), (3, 0)];
        for _ in 0..20 {
            assert!(free.contains(rng.choose(&free).unwrap()));
        }
        let none: [(u8, u8); 0] = [];
        assert!(rng.choose(&none).is_none());
    }

    #[test]
    fn test_unit_and_bool_bounds() {
        let mut rng = GameRng::new(7);
        for _ in 0..500 {
            assert!((0.0..1.0).contains(&rng.gen_unit()));
        }
        assert!(!rng.gen_bool(-1.0));
        assert!(rng.gen_bool(2.0));
    }

    #[test]
    fn test_restore_continues_mid_stream() {
        let mut rng = GameRng::new(42);
        for _ in 0..37 {
            rng.gen_unit();
        }

        let json = serde_json::to_value(rng.state()).unwrap();
        assert!(json.get("wordPos").is_some());
        let state: GameRngState = serde_json::from_value(json).unwrap();

        let mut restored = GameRng::from_state(&state);
        let expected: Vec<f64> = (0..5).map(|_| rng.gen_unit()).collect();
        let actual: Vec<f64> = (0..5).map(|_| restored.gen_unit()).collect();
        assert_eq!(expected, actual);
    }
}
