//! Cart loading state.
//!
//! Overlapping cart mutations are allowed. Each one holds a [`BusyGuard`]
//! while in flight, and the visitor's cart reads as busy until the last
//! guard is dropped, whether the mutation succeeded or failed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bazaar_core::UserId;

/// In-flight cart mutation counts per user.
#[derive(Debug, Clone, Default)]
pub struct BusyTracker {
    counts: Arc<Mutex<HashMap<UserId, usize>>>,
}

impl BusyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one mutation as started. It ends when the guard drops.
    #[must_use]
    pub fn begin(&self, user: UserId) -> BusyGuard {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        *counts.entry(user).or_insert(0) += 1;
        BusyGuard {
            tracker: self.clone(),
            user,
        }
    }

    #[must_use]
    pub fn is_busy(&self, user: UserId) -> bool {
        self.in_flight(user) > 0
    }

    #[must_use]
    pub fn in_flight(&self, user: UserId) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .copied()
            .unwrap_or(0)
    }

    fn end(&self, user: UserId) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = counts.get_mut(&user) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(&user);
            }
        }
    }
}

/// Held for the duration of one cart mutation.
#[derive(Debug)]
pub struct BusyGuard {
    tracker: BusyTracker,
    user: UserId,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.tracker.end(self.user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_until_last_guard_drops() {
        let tracker = BusyTracker::new();
        let user = UserId::new(1);

        let first = tracker.begin(user);
        let second = tracker.begin(user);
        assert_eq!(tracker.in_flight(user), 2);

        drop(first);
        assert!(tracker.is_busy(user));
        drop(second);
        assert!(!tracker.is_busy(user));
    }

    #[test]
    fn test_users_are_independent() {
        let tracker = BusyTracker::new();
        let _guard = tracker.begin(UserId::new(1));
        assert!(!tracker.is_busy(UserId::new(2)));
    }
}
