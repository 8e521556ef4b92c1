//! Round-robin rotation state.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};

/// Rotation index keyed by the identity of the candidate pool.
///
/// The index restarts whenever the pool (as a set of ids) changes.
#[derive(Debug, Default)]
pub struct RoundRobin {
    state: Mutex<RotationState>,
}

#[derive(Debug, Default)]
struct RotationState {
    pool: Option<u64>,
    next: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next pick in `pool`. `pool` must not be empty.
    pub fn next_index(&self, pool: &[&str]) -> usize {
        debug_assert!(!pool.is_empty());
        let key = pool_key(pool);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.pool != Some(key) {
            state.pool = Some(key);
            state.next = 0;
        }

        let index = state.next % pool.len();
        state.next = (index + 1) % pool.len();
        index
    }
}

/// Order-independent identity of a set of provider ids.
fn pool_key(pool: &[&str]) -> u64 {
    let mut ids = pool.to_vec();
    ids.sort_unstable();
    let mut hasher = DefaultHasher::new();
    ids.hash(&mut hasher);
    hasher.finish()
}
