//! Session snapshots.
//!
//! A snapshot is an opaque JSON value produced by `save_state` and accepted by
//! `load_state`. Every field is optional on the way in: an absent field keeps
//! the adapter's current value. Anything that does not decode (wrong shape,
//! wrong types, out-of-range boards) is rejected as a whole and the adapter
//! keeps its current state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::Difficulty;

use super::lifecycle::GameState;

/// Opaque serialized session state.
pub type Snapshot = serde_json::Value;

/// Fields common to every game's snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreSnapshot {
    pub state: Option<GameState>,
    pub score: Option<u64>,
    /// Milliseconds of play accumulated so far.
    pub played_ms: Option<u64>,
    pub difficulty: Option<Difficulty>,
}

/// Serialize a game snapshot.
pub fn encode<T: Serialize>(game_id: &str, snapshot: &T) -> Snapshot {
    match serde_json::to_value(snapshot) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(game = game_id, error = %err, "failed to encode snapshot");
            Snapshot::Null
        }
    }
}

/// Decode a game snapshot, failing closed.
///
/// Returns `None` (and logs a warning) when the value is not an object or a
/// present field has the wrong type.
pub fn decode<T: DeserializeOwned>(game_id: &str, snapshot: &Snapshot) -> Option<T> {
    if !snapshot.is_object() {
        tracing::warn!(game = game_id, "ignoring snapshot: not an object");
        return None;
    }

    match serde_json::from_value(snapshot.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!(game = game_id, error = %err, "ignoring malformed snapshot");
            None
        }
    }
}
