//! Progress storage, one mutex per user.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::core::UserId;

use super::progress::UserProgress;

/// Shared handle to one user's progress.
pub type ProgressHandle = Arc<Mutex<UserProgress>>;

pub(crate) fn lock_progress(handle: &ProgressHandle) -> MutexGuard<'_, UserProgress> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keyed storage for progress records.
pub trait ProgressRepository: Send + Sync + fmt::Debug {
    /// Store a new record. Returns the existing handle if the user already
    /// has one.
    fn insert_if_absent(&self, progress: UserProgress) -> ProgressHandle;

    fn get(&self, user_id: &UserId) -> Option<ProgressHandle>;

    fn contains(&self, user_id: &UserId) -> bool {
        self.get(user_id).is_some()
    }

    fn user_ids(&self) -> Vec<UserId>;
}

/// Process-local progress storage.
#[derive(Default)]
pub struct InMemoryProgressRepository {
    records: RwLock<FxHashMap<UserId, ProgressHandle>>,
}

impl InMemoryProgressRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for InMemoryProgressRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.records.read().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("InMemoryProgressRepository")
            .field("users", &count)
            .finish()
    }
}

impl ProgressRepository for InMemoryProgressRepository {
    fn insert_if_absent(&self, progress: UserProgress) -> ProgressHandle {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .entry(progress.user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(progress)))
            .clone()
    }

    fn get(&self, user_id: &UserId) -> Option<ProgressHandle> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    fn user_ids(&self) -> Vec<UserId> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::ProgressionConfig;
    use chrono::Utc;

    #[test]
    fn test_insert_keeps_first_record() {
        let repo = InMemoryProgressRepository::new();
        let config = ProgressionConfig::default();
        let user = UserId::new("kim");

        let first = repo.insert_if_absent(UserProgress::new(user.clone(), &config, Utc::now()));
        lock_progress(&first).level = 7;

        let second = repo.insert_if_absent(UserProgress::new(user.clone(), &config, Utc::now()));
        assert_eq!(lock_progress(&second).level, 7);
        assert!(repo.contains(&user));
        assert!(!repo.contains(&UserId::new("lee")));
    }
}
