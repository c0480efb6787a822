use sha2::{Digest, Sha256};
use shared::ClassificationResult;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Memoizes image classifications by upload hash so repeated uploads of the
/// same photo skip decoding. Oldest entries are evicted first.
pub struct ClassificationCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, ClassificationResult>,
    order: VecDeque<String>,
}

impl ClassificationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    pub fn cache_key(strategy: &str, image_hash: &str) -> String {
        format!("{}:{}", strategy, image_hash)
    }

    pub fn get(&self, key: &str) -> Option<ClassificationResult> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(key).copied()
    }

    pub fn insert(&self, key: String, result: ClassificationResult) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.entries.insert(key.clone(), result).is_some() {
            return;
        }
        state.order.push_back(key);
        while state.order.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.entries.remove(&evicted);
                log::debug!("Evicted cached classification {}", evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
