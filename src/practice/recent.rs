//! Per-theme memory of recently served sentences

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;

use super::Difficulty;

/// How many sentences are remembered per theme
pub const RECENT_CAPACITY: usize = 20;

/// Bounded ring of recently served sentences, keyed by theme
#[derive(Clone)]
pub struct RecentProblems {
    inner: Arc<DashMap<Difficulty, VecDeque<String>>>,
    capacity: usize,
}

impl RecentProblems {
    pub fn new() -> Self {
        Self::with_capacity(RECENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Remember a served sentence, evicting the oldest past capacity
    pub fn record(&self, difficulty: Difficulty, sentence: &str) {
        let mut ring = self.inner.entry(difficulty).or_default();
        ring.retain(|s| s != sentence);
        ring.push_back(sentence.to_string());
        while ring.len() > self.capacity {
            ring.pop_front();
        }
    }

    /// Snapshot, oldest first
    pub fn snapshot(&self, difficulty: Difficulty) -> Vec<String> {
        self.inner
            .get(&difficulty)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for RecentProblems {
    fn default() -> Self {
        Self::new()
    }
}
