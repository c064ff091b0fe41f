//! Model invoker: the one door through which every component talks to a
//! backend.
//!
//! Failures are returned as [`ProviderError`] and never retried here. A
//! caller that wants retries or fallbacks wraps the [`Provider`] instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest};

/// Per-call decoding options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeOptions {
    /// Model identifier passed through to the provider
    pub model: String,

    /// Decoding temperature; 0.0 for routing and extraction
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl InvokeOptions {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    /// Same options with a different temperature.
    pub fn with_temperature(&self, temperature: f32) -> Self {
        Self {
            temperature,
            ..self.clone()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Sends prompts to a provider with a default set of options.
///
/// Cheap to clone: the provider is shared.
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn Provider>,
    options: InvokeOptions,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn Provider>, options: InvokeOptions) -> Self {
        Self { provider, options }
    }

    /// The default options used by [`ModelInvoker::invoke`].
    pub fn options(&self) -> &InvokeOptions {
        &self.options
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Invoke with the default options.
    pub async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        self.invoke_with(prompt, &self.options).await
    }

    /// Invoke a single user prompt with explicit options.
    pub async fn invoke_with(
        &self,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<String, ProviderError> {
        self.invoke_messages(vec![Message::user(prompt)], options).await
    }

    /// Invoke with a role-tagged message list.
    pub async fn invoke_messages(
        &self,
        messages: Vec<Message>,
        options: &InvokeOptions,
    ) -> Result<String, ProviderError> {
        debug!(
            provider = %self.provider.name(),
            model = %options.model,
            temperature = options.temperature,
            messages = messages.len(),
            "Invoking model"
        );

        let request = ProviderRequest {
            model: options.model.clone(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish()
    }
}
