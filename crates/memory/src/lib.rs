//! Conversation memory for Chainwright.
//!
//! One capability, `save(turn)` and `load()`, over a closed set of
//! retention strategies picked at construction:
//!
//! | Strategy | Keeps |
//! |----------|-------|
//! | Buffer | every turn |
//! | Window | the last `k` turns |
//! | TokenBuffer | newest turns under a token ceiling |
//! | SummaryBuffer | TokenBuffer plus a running summary of what fell out |

pub mod buffer;
pub mod context;
pub mod summary;
pub mod token;

use std::sync::Arc;

use chainwright_config::{MemoryConfig, MemoryStrategy};
use chainwright_core::Variables;
use chainwright_core::error::Result;
use chainwright_core::invoker::ModelInvoker;

pub use buffer::{BufferMemory, TokenBufferMemory, WindowMemory};
pub use context::{MemoryContext, Turn, render_turns};
pub use summary::SummaryBufferMemory;
pub use token::{CharEstimator, TokenEstimator, WordEstimator, estimator_for_model};

/// Variable name under which [`ConversationMemory::load_variables`] puts the
/// rendered history.
pub const MEMORY_KEY: &str = "history";

/// A conversation memory store. Use one per session.
#[derive(Debug, Clone)]
pub enum ConversationMemory {
    Buffer(BufferMemory),
    Window(WindowMemory),
    TokenBuffer(TokenBufferMemory),
    SummaryBuffer(SummaryBufferMemory),
}

impl ConversationMemory {
    pub fn buffer() -> Self {
        Self::Buffer(BufferMemory::new())
    }

    pub fn window(k: usize) -> Self {
        Self::Window(WindowMemory::new(k))
    }

    pub fn token_buffer(max_token_limit: usize, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self::TokenBuffer(TokenBufferMemory::new(max_token_limit, estimator))
    }

    pub fn summary_buffer(
        invoker: ModelInvoker,
        max_token_limit: usize,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Result<Self> {
        Ok(Self::SummaryBuffer(SummaryBufferMemory::new(
            invoker,
            max_token_limit,
            estimator,
        )?))
    }

    /// Build the configured strategy. Token estimation follows the
    /// invoker's model.
    pub fn from_config(config: &MemoryConfig, invoker: &ModelInvoker) -> Result<Self> {
        let estimator = estimator_for_model(&invoker.options().model);
        match config.strategy {
            MemoryStrategy::Buffer => Ok(Self::buffer()),
            MemoryStrategy::Window => Ok(Self::window(config.window_size)),
            MemoryStrategy::Token => Ok(Self::token_buffer(config.max_token_limit, estimator)),
            MemoryStrategy::Summary => {
                Self::summary_buffer(invoker.clone(), config.max_token_limit, estimator)
            }
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Window(_) => "window",
            Self::TokenBuffer(_) => "token",
            Self::SummaryBuffer(_) => "summary",
        }
    }

    /// Record a completed exchange. Only the summary strategy can fail,
    /// when its model call does.
    pub async fn save(&mut self, turn: Turn) -> Result<()> {
        match self {
            Self::Buffer(m) => m.save(turn),
            Self::Window(m) => m.save(turn),
            Self::TokenBuffer(m) => m.save(turn),
            Self::SummaryBuffer(m) => return m.save(turn).await,
        }
        Ok(())
    }

    pub fn load(&self) -> MemoryContext {
        match self {
            Self::Buffer(m) => m.load(),
            Self::Window(m) => m.load(),
            Self::TokenBuffer(m) => m.load(),
            Self::SummaryBuffer(m) => m.load(),
        }
    }

    /// `{"history": <rendered context>}`
    pub fn load_variables(&self) -> Variables {
        let mut vars = Variables::new();
        vars.insert(MEMORY_KEY.into(), self.load().render());
        vars
    }
}
