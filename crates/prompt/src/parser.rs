//! Schema-driven structured output.
//!
//! A [`StructuredOutputParser`] does two things with the same schema:
//! it writes the formatting instructions that go into a prompt, and it
//! pulls the JSON object back out of whatever the model replied.
//!
//! Wire contract with the model:
//!
//! ````text
//! ```json
//! {
//!     "field": string  // description
//! }
//! ```
//! ````
//!
//! Models regularly drop the fence, so extraction falls back to the whole
//! reply when no `json` block is present.

use chainwright_core::error::{Error, ParseError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fields parsed out of a model response, restricted to the schema.
pub type StructuredOutput = serde_json::Map<String, serde_json::Value>;

/// One expected field in the model's JSON answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// JSON key the model must use
    pub name: String,

    /// What the value should contain, in plain words
    pub description: String,

    /// Type hint shown to the model (e.g. "string", "integer", "boolean")
    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,
}

fn default_type() -> String {
    "string".into()
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            type_name: default_type(),
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }
}

/// Parser over an ordered set of uniquely named fields.
#[derive(Debug, Clone)]
pub struct StructuredOutputParser {
    schemas: Vec<ResponseSchema>,
}

impl StructuredOutputParser {
    /// Build a parser. Field names must be non-empty and unique.
    pub fn new(schemas: Vec<ResponseSchema>) -> Result<Self> {
        for (i, schema) in schemas.iter().enumerate() {
            if schema.name.trim().is_empty() {
                return Err(Error::config(format!("response schema #{i} has an empty name")));
            }
            if schemas[..i].iter().any(|s| s.name == schema.name) {
                return Err(Error::config(format!(
                    "duplicate response schema field '{}'",
                    schema.name
                )));
            }
        }
        Ok(Self { schemas })
    }

    pub fn schemas(&self) -> &[ResponseSchema] {
        &self.schemas
    }

    /// Instructions to embed in a prompt. Deterministic for a given schema.
    pub fn format_instructions(&self) -> String {
        let fields = self
            .schemas
            .iter()
            .map(|s| format!("    \"{}\": {}  // {}", s.name, s.type_name, s.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Respond with a single JSON object inside a markdown code block that starts \
             with \"```json\" and ends with \"```\". Use exactly these field names, \
             all of them required and no others:\n\n```json\n{{\n{fields}\n}}\n```"
        )
    }

    /// Parse a raw model reply into the schema's fields.
    pub fn parse(&self, raw: &str) -> std::result::Result<StructuredOutput, ParseError> {
        let block = extract_json_block(raw);
        let value: serde_json::Value =
            serde_json::from_str(block).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let serde_json::Value::Object(mut object) = value else {
            return Err(ParseError::NotAnObject(json_kind(&value).into()));
        };

        let mut output = StructuredOutput::new();
        for schema in &self.schemas {
            let field = object
                .remove(&schema.name)
                .ok_or_else(|| ParseError::MissingField(schema.name.clone()))?;
            output.insert(schema.name.clone(), field);
        }

        if !object.is_empty() {
            debug!(
                extra = ?object.keys().collect::<Vec<_>>(),
                "Dropping fields outside the response schema"
            );
        }
        Ok(output)
    }

    /// Parse and deserialize into a typed value.
    pub fn parse_as<T: DeserializeOwned>(&self, raw: &str) -> std::result::Result<T, ParseError> {
        let output = self.parse(raw)?;
        serde_json::from_value(serde_json::Value::Object(output))
            .map_err(|e| ParseError::InvalidJson(e.to_string()))
    }
}

/// The body of the first ```` ```json ```` fenced block, or the whole text
/// (trimmed) when there is none. An unterminated fence runs to the end.
///
/// The block ends where its JSON value ends, so string values may contain
/// fences of their own. When the body does not start with a valid value,
/// it runs to the next fence instead.
pub fn extract_json_block(text: &str) -> &str {
    const FENCE: &str = "```";
    const TAG: &str = "json";

    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(FENCE) {
        let open = search_from + offset;
        let after_fence = open + FENCE.len();
        let rest = &text[after_fence..];

        let tagged = rest
            .get(..TAG.len())
            .is_some_and(|tag| tag.eq_ignore_ascii_case(TAG));
        if tagged {
            let body = text[after_fence + TAG.len()..].trim_start();
            if let Some(end) = first_value_end(body) {
                return &body[..end];
            }
            let body = match body.find(FENCE) {
                Some(close) => &body[..close],
                None => body,
            };
            return body.trim();
        }
        search_from = after_fence;
    }
    text.trim()
}

/// Byte length of the JSON value at the start of `text`, if there is one.
fn first_value_end(text: &str) -> Option<usize> {
    let mut values = serde_json::Deserializer::from_str(text).into_iter::<serde_json::Value>();
    match values.next() {
        Some(Ok(_)) => Some(values.byte_offset()),
        _ => None,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
