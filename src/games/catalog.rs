//! Registry of game constructors keyed by stable identifier.

use rustc_hash::FxHashMap;

use crate::adapter::GameAdapter;
use crate::core::{PlatformError, Result};

use super::{connect_four, game2048, memory, pong, snake, tictactoe};
use super::{ConnectFourGame, Game2048, MemoryGame, PongGame, SnakeGame, TicTacToeGame};

/// Builds a fresh adapter in `Init`.
pub type GameFactory = Box<dyn Fn() -> Box<dyn GameAdapter> + Send + Sync>;

/// Factory registry mapping a game identifier to a constructor.
///
/// ## Example
///
/// ```
/// use arcade_hub::games::GameCatalog;
/// use arcade_hub::adapter::GameState;
///
/// let catalog = GameCatalog::new();
/// assert!(catalog.contains("snake"));
///
/// let game = catalog.create("2048").unwrap();
/// assert_eq!(game.state(), GameState::Init);
/// assert!(catalog.create("chess").is_err());
/// ```
pub struct GameCatalog {
    factories: FxHashMap<String, GameFactory>,
    order: Vec<String>,
}

impl GameCatalog {
    /// Catalog with the six built-in games.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register(memory::GAME_ID, || Box::new(MemoryGame::new()));
        catalog.register(snake::GAME_ID, || Box::new(SnakeGame::new()));
        catalog.register(game2048::GAME_ID, || Box::new(Game2048::new()));
        catalog.register(pong::GAME_ID, || Box::new(PongGame::new()));
        catalog.register(tictactoe::GAME_ID, || Box::new(TicTacToeGame::new()));
        catalog.register(connect_four::GAME_ID, || Box::new(ConnectFourGame::new()));
        catalog
    }

    /// Catalog with no games.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Register (or replace) the constructor for `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn GameAdapter> + Send + Sync + 'static,
    {
        let id = id.into();
        if !self.factories.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.factories.insert(id, Box::new(factory));
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Construct a new adapter.
    ///
    /// # Errors
    ///
    /// `GameNotRegistered` for an unknown id.
    pub fn create(&self, id: &str) -> Result<Box<dyn GameAdapter>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| PlatformError::GameNotRegistered(id.to_string()))?;
        Ok(factory())
    }

    /// Registered identifiers in registration order.
    #[must_use]
    pub fn game_ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for GameCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameCatalog")
            .field("games", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids() {
        let catalog = GameCatalog::new();
        assert_eq!(
            catalog.game_ids(),
            vec!["memory", "snake", "2048", "pong", "tictactoe", "connect4"]
        );
        for id in catalog.game_ids() {
            assert_eq!(catalog.create(id).unwrap().game_id(), id);
        }
    }

    #[test]
    fn test_unknown_id() {
        let catalog = GameCatalog::new();
        assert!(matches!(
            catalog.create("chess"),
            Err(PlatformError::GameNotRegistered(id)) if id == "chess"
        ));
    }

    #[test]
    fn test_register_replaces_without_duplicating() {
        let mut catalog = GameCatalog::empty();
        catalog.register("snake", || Box::new(SnakeGame::with_seed(1)));
        catalog.register("snake", || Box::new(SnakeGame::with_seed(2)));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.game_ids(), vec!["snake"]);
    }
}
