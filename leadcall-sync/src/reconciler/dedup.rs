//! Set of call observations already turned into lead updates

use crate::types::ProcessedEventKey;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// How long processed keys are remembered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum DedupRetention {
    /// Grow for as long as the poller lives
    ProcessLifetime,
    /// Keep at most `max_keys`, forgetting the oldest first
    Bounded { max_keys: usize },
}

impl DedupRetention {
    pub fn from_max_keys(max_keys: Option<usize>) -> Self {
        match max_keys {
            Some(max_keys) => DedupRetention::Bounded { max_keys: max_keys.max(1) },
            None => DedupRetention::ProcessLifetime,
        }
    }
}

/// Insertion-ordered set of [`ProcessedEventKey`]s
///
/// Insertion order is only tracked under [`DedupRetention::Bounded`].
#[derive(Debug)]
pub struct SeenSet {
    keys: HashSet<ProcessedEventKey>,
    order: VecDeque<ProcessedEventKey>,
    retention: DedupRetention,
    evicted: u64,
}

impl SeenSet {
    pub fn new(retention: DedupRetention) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::new(),
            retention,
            evicted: 0,
        }
    }

    /// Record a key; returns false if it was already present
    pub fn insert(&mut self, key: ProcessedEventKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }

        if let DedupRetention::Bounded { max_keys } = self.retention {
            while self.keys.len() >= max_keys {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.keys.remove(&oldest);
                        self.evicted += 1;
                    }
                    None => break,
                }
            }
            self.order.push_back(key.clone());
        }

        self.keys.insert(key)
    }

    /// Forget a key so a later observation is processed again
    pub fn remove(&mut self, key: &ProcessedEventKey) -> bool {
        let removed = self.keys.remove(key);
        if removed && matches!(self.retention, DedupRetention::Bounded { .. }) {
            self.order.retain(|k| k != key);
        }
        removed
    }

    pub fn contains(&self, key: &ProcessedEventKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys dropped by bounded retention so far
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
