//! Error types for the Chainwright domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum, folded into [`Error`].

use thiserror::Error;

/// The top-level error type for all Chainwright operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Template errors ---
    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Backend errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Structured output ---
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Routing decision could not be parsed: {0}")]
    RoutingParse(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The model replied but the conversation memory could not record it.
    #[error("Reply produced but memory update failed: {source}")]
    Unrecorded {
        reply: String,
        #[source]
        source: Box<Error>,
    },

    // --- External collaborators ---
    #[error("Retrieval failed: {0}")]
    Retrieval(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Problems with the template text itself, found when it is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unclosed placeholder starting at byte {position}")]
    Unclosed { position: usize },

    #[error("Unmatched '}}' at byte {position}")]
    UnmatchedClose { position: usize },

    #[error("Invalid placeholder name '{name}' at byte {position}")]
    InvalidName { name: String, position: usize },
}

/// Model output that does not satisfy a response schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid JSON in model output: {0}")]
    InvalidJson(String),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(String),

    #[error("Missing field in model output: {0}")]
    MissingField(String),
}
