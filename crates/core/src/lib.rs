//! # Chainwright Core
//!
//! Domain types, traits, and error definitions for Chainwright.
//! This crate has **zero framework dependencies**: it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here (`Provider`, `Retriever`).
//! Implementations live in their respective crates, so pipelines, routers
//! and memory stores can be tested against scripted providers.

pub mod error;
pub mod invoker;
pub mod message;
pub mod provider;
pub mod retriever;

#[cfg(any(test, feature = "test-util"))]
pub mod test_helpers;

use std::collections::BTreeMap;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ParseError, ProviderError, Result, TemplateError};
pub use invoker::{InvokeOptions, ModelInvoker};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use retriever::{Retriever, StaticRetriever};

/// Named string values flowing into templates and out of pipelines.
///
/// Ordered so that rendered output and logs are deterministic.
pub type Variables = BTreeMap<String, String>;
