//! Token estimation utilities.
//!
//! Tokenization differs by model family, so the token-bounded strategies take
//! an estimator instead of hard-coding one. Both heuristics here are cheap
//! approximations; neither loads a real tokenizer.

use std::fmt::Debug;
use std::sync::Arc;

/// Estimates how many tokens a piece of text costs.
pub trait TokenEstimator: Debug + Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// 1 token ≈ 4 characters, rounded up. Close enough for BPE tokenizers
/// (GPT, Claude) on English text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimator;

impl TokenEstimator for CharEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// 1 token ≈ 3/4 of a word, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordEstimator;

impl TokenEstimator for WordEstimator {
    fn estimate(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        (words * 4).div_ceil(3)
    }
}

/// Pick an estimator for a model id.
pub fn estimator_for_model(model: &str) -> Arc<dyn TokenEstimator> {
    let model = model.to_ascii_lowercase();
    let bpe_family = ["gpt", "claude", "o1", "o3", "text-davinci"]
        .iter()
        .any(|family| model.contains(family));

    if bpe_family {
        Arc::new(CharEstimator)
    } else {
        Arc::new(WordEstimator)
    }
}
