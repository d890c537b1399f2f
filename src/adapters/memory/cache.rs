//! In-memory cache invalidator that records every eviction.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{user_cache_key, CacheInvalidator};

#[derive(Default)]
struct CacheState {
    keys: HashSet<String>,
    invalidations: Vec<String>,
}

/// Set of live keys plus a log of deleted keys.
#[derive(Default)]
pub struct RecordingCacheInvalidator {
    state: Mutex<CacheState>,
    failing: AtomicBool,
}

impl RecordingCacheInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretends a snapshot for `user_id` is cached.
    pub fn seed(&self, user_id: &UserId) {
        self.state().keys.insert(user_cache_key(user_id));
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state().keys.contains(key)
    }

    /// Keys deleted so far, in order.
    pub fn invalidations(&self) -> Vec<String> {
        self.state().invalidations.clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheInvalidator for RecordingCacheInvalidator {
    async fn invalidate_user(&self, user_id: &UserId) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(ErrorCode::CacheError, "Simulated cache failure"));
        }
        let key = user_cache_key(user_id);
        let mut state = self.state();
        state.keys.remove(&key);
        state.invalidations.push(key);
        Ok(())
    }
}
