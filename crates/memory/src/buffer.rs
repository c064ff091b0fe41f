//! Retention strategies that only ever drop turns.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::context::{MemoryContext, Turn, render_turns};
use crate::token::TokenEstimator;

/// Keeps every turn.
#[derive(Debug, Clone, Default)]
pub struct BufferMemory {
    turns: Vec<Turn>,
}

impl BufferMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn load(&self) -> MemoryContext {
        MemoryContext {
            summary: None,
            turns: self.turns.clone(),
        }
    }
}

/// Keeps the last `k` turns.
#[derive(Debug, Clone)]
pub struct WindowMemory {
    k: usize,
    turns: VecDeque<Turn>,
}

impl WindowMemory {
    /// `k` is clamped to at least 1.
    pub fn new(k: usize) -> Self {
        let k = k.max(1);
        Self {
            k,
            turns: VecDeque::with_capacity(k + 1),
        }
    }

    pub fn window(&self) -> usize {
        self.k
    }

    pub fn save(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.k {
            self.turns.pop_front();
        }
    }

    pub fn load(&self) -> MemoryContext {
        MemoryContext {
            summary: None,
            turns: self.turns.iter().cloned().collect(),
        }
    }
}

/// Keeps turns while their estimated token count fits under a ceiling.
#[derive(Debug, Clone)]
pub struct TokenBufferMemory {
    max_token_limit: usize,
    estimator: Arc<dyn TokenEstimator>,
    turns: VecDeque<Turn>,
}

impl TokenBufferMemory {
    pub fn new(max_token_limit: usize, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            max_token_limit,
            estimator,
            turns: VecDeque::new(),
        }
    }

    pub fn max_token_limit(&self) -> usize {
        self.max_token_limit
    }

    pub fn save(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        let evicted =
            evict_over_limit(&mut self.turns, self.estimator.as_ref(), self.max_token_limit);
        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), kept = self.turns.len(), "Dropped oldest turns");
        }
    }

    pub fn load(&self) -> MemoryContext {
        MemoryContext {
            summary: None,
            turns: self.turns.iter().cloned().collect(),
        }
    }
}

/// Estimated token count of the rendered turns.
pub(crate) fn turns_tokens<'a>(
    estimator: &dyn TokenEstimator,
    turns: impl IntoIterator<Item = &'a Turn>,
) -> usize {
    estimator.estimate(&render_turns(turns))
}

/// Pop turns from the front until the rest fit under `limit`. The newest
/// turn is never popped. Returns the evicted turns, oldest first.
pub(crate) fn evict_over_limit(
    turns: &mut VecDeque<Turn>,
    estimator: &dyn TokenEstimator,
    limit: usize,
) -> Vec<Turn> {
    let mut evicted = Vec::new();
    while turns.len() > 1 && turns_tokens(estimator, turns.iter()) > limit {
        if let Some(oldest) = turns.pop_front() {
            evicted.push(oldest);
        }
    }
    evicted
}
