//! LLM Provider implementations for Chainwright.
//!
//! All providers implement the `chainwright_core::Provider` trait.
//! The registry selects the correct provider based on configuration.

pub mod openai_compat;
pub mod registry;

pub use openai_compat::OpenAiCompatProvider;
pub use registry::{build_from_config, invoker_from_config, ProviderRegistry};
