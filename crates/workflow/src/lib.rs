//! Chains built on the model invoker.
//!
//! - [`SequentialPipeline`]: ordered prompt steps wired by variable name
//! - [`Router`]: model-chosen dispatch between pipelines with a default
//! - [`ConversationChain`]: chat with a [`chainwright_memory::ConversationMemory`]
//! - [`ExtractionChain`]: one prompt parsed into schema fields
//! - [`StuffQa`]: question answering over retrieved documents
//!
//! Everything runs on the caller's task: steps are awaited one after the
//! other and the provider call is the only suspension point.

pub mod conversation;
pub mod extract;
pub mod pipeline;
pub mod qa;
pub mod router;

pub use conversation::ConversationChain;
pub use extract::ExtractionChain;
pub use pipeline::{PipelineBuilder, PipelineStep, SequentialPipeline};
pub use qa::{QaAnswer, StuffQa};
pub use router::{
    DEFAULT_DESTINATION, Destination, RouteOutcome, Router, RouterBuilder, RoutingDecision,
};
