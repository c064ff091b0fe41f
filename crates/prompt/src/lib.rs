//! Prompt templates and structured output parsing.
//!
//! - [`PromptTemplate`]: `{name}` placeholders, rendered in a single pass
//! - [`StructuredOutputParser`]: schema-driven format instructions and
//!   fenced-JSON extraction

pub mod parser;
pub mod template;

pub use parser::{extract_json_block, ResponseSchema, StructuredOutput, StructuredOutputParser};
pub use template::PromptTemplate;
