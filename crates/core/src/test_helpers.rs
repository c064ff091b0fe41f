//! Scripted provider for tests in this and downstream crates.
//!
//! Enabled for downstream crates by the `test-util` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::ProviderError;
use crate::invoker::{InvokeOptions, ModelInvoker};
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// Model id reported by [`ScriptedProvider`] and used by [`invoker`].
pub const SCRIPTED_MODEL: &str = "scripted-model";

/// A mock provider that replays scripted replies and records every request.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds, replying with the given texts in order.
    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Content of the last message of each request, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = self.call_count();
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no reply scripted for call #{call}"));

        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: SCRIPTED_MODEL.into(),
        })
    }
}

/// An invoker over `provider` at temperature 0.
pub fn invoker(provider: Arc<ScriptedProvider>) -> ModelInvoker {
    ModelInvoker::new(provider, InvokeOptions::new(SCRIPTED_MODEL, 0.0))
}
