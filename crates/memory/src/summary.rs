//! Token-bounded memory that summarizes instead of forgetting.
//!
//! Evicted turns are folded into a running summary with one model call over
//! the previous summary plus the evicted turns. If that call fails the turns
//! are held as pending, still visible through `load`, and the next `save`
//! tries again with everything pending so far.

use std::collections::VecDeque;
use std::sync::Arc;

use chainwright_core::Variables;
use chainwright_core::error::{Error, Result};
use chainwright_core::invoker::ModelInvoker;
use chainwright_prompt::PromptTemplate;
use tracing::{debug, warn};

use crate::buffer::evict_over_limit;
use crate::context::{MemoryContext, Turn, render_turns};
use crate::token::TokenEstimator;

const SUMMARY_PROMPT: &str = "\
Progressively summarize the lines of conversation provided, adding onto the \
previous summary and returning a new summary.

Current summary:
{summary}

New lines of conversation:
{new_lines}

New summary:";

const SUMMARY_KEY: &str = "summary";
const NEW_LINES_KEY: &str = "new_lines";

#[derive(Debug, Clone)]
pub struct SummaryBufferMemory {
    max_token_limit: usize,
    estimator: Arc<dyn TokenEstimator>,
    invoker: ModelInvoker,
    prompt: PromptTemplate,
    summary: Option<String>,
    /// Evicted but not yet summarized, oldest first
    pending: Vec<Turn>,
    turns: VecDeque<Turn>,
}

impl SummaryBufferMemory {
    pub fn new(
        invoker: ModelInvoker,
        max_token_limit: usize,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Result<Self> {
        Ok(Self {
            max_token_limit,
            estimator,
            invoker,
            prompt: PromptTemplate::new(SUMMARY_PROMPT)?,
            summary: None,
            pending: Vec::new(),
            turns: VecDeque::new(),
        })
    }

    /// Replace the summarization prompt. It may only use `{summary}` and
    /// `{new_lines}`.
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Result<Self> {
        if let Some(var) = prompt
            .input_variables()
            .iter()
            .find(|v| v.as_str() != SUMMARY_KEY && v.as_str() != NEW_LINES_KEY)
        {
            return Err(Error::config(format!(
                "summary prompt uses '{{{var}}}'; only {{summary}} and {{new_lines}} are available"
            )));
        }
        self.prompt = prompt;
        Ok(self)
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Turns waiting for a successful summarization.
    pub fn pending(&self) -> &[Turn] {
        &self.pending
    }

    /// Record a turn, summarizing whatever falls out of the buffer.
    ///
    /// A failed summary call is returned as an error. The turn itself is
    /// always recorded and nothing evicted is lost.
    pub async fn save(&mut self, turn: Turn) -> Result<()> {
        self.turns.push_back(turn);
        let evicted =
            evict_over_limit(&mut self.turns, self.estimator.as_ref(), self.max_token_limit);
        self.pending.extend(evicted);

        if self.pending.is_empty() {
            return Ok(());
        }

        match self.summarize().await {
            Ok(summary) => {
                debug!(folded = self.pending.len(), "Updated running summary");
                self.summary = Some(summary);
                self.pending.clear();
                Ok(())
            }
            Err(e) => {
                warn!(
                    pending = self.pending.len(),
                    error = %e,
                    "Summary update failed, keeping turns"
                );
                Err(e)
            }
        }
    }

    /// Summary, then pending turns, then buffered turns.
    pub fn load(&self) -> MemoryContext {
        MemoryContext {
            summary: self.summary.clone(),
            turns: self
                .pending
                .iter()
                .chain(self.turns.iter())
                .cloned()
                .collect(),
        }
    }

    async fn summarize(&self) -> Result<String> {
        let mut vars = Variables::new();
        vars.insert(SUMMARY_KEY.into(), self.summary.clone().unwrap_or_default());
        vars.insert(NEW_LINES_KEY.into(), render_turns(&self.pending));

        let prompt = self.prompt.render(&vars)?;
        let summary = self.invoker.invoke(&prompt).await?;
        Ok(summary.trim().to_string())
    }
}
