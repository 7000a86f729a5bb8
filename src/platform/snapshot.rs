//! The persistence record exchanged with outside storage.
//!
//! Input is untrusted: decoding never fails loudly, it returns `None` and
//! logs why. Fields absent from a record keep the in-memory value on import.

use serde::{Deserialize, Serialize};

use crate::gamification::ProgressPatch;

/// Wallet balances; absent fields keep their current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletBalances {
    pub soft_tokens: Option<u64>,
    pub hard_tokens: Option<u64>,
}

/// Wallet balances plus progress scalars of one user.
///
/// ```
/// use arcade_hub::platform::PlatformUserState;
///
/// let state = PlatformUserState::from_json(r#"{"wallet":{"softTokens":120}}"#).unwrap();
/// assert_eq!(state.wallet.soft_tokens, Some(120));
/// assert_eq!(state.wallet.hard_tokens, None);
///
/// assert!(PlatformUserState::from_json("not json").is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformUserState {
    pub wallet: WalletBalances,
    pub progress: ProgressPatch,
}

impl PlatformUserState {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Decode a JSON document, `None` if it is malformed.
    #[must_use]
    pub fn from_json(source: &str) -> Option<Self> {
        match serde_json::from_str(source) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(error = %err, "rejected user state json");
                None
            }
        }
    }

    /// Decode an already-parsed JSON value, `None` if it has the wrong shape.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(error = %err, "rejected user state value");
                None
            }
        }
    }

    /// Compact binary form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match bincode::serialize(self) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode user state");
                Vec::new()
            }
        }
    }

    /// Decode the binary form, `None` if it is malformed.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bincode::deserialize(bytes) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(error = %err, len = bytes.len(), "rejected user state bytes");
                None
            }
        }
    }
}
