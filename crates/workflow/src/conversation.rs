//! Conversation chain: a chat loop backed by a memory store.

use chainwright_core::error::{Error, Result};
use chainwright_core::invoker::ModelInvoker;
use chainwright_memory::{ConversationMemory, MEMORY_KEY, Turn};
use chainwright_prompt::PromptTemplate;
use tracing::debug;

const CONVERSATION_PROMPT: &str = "\
You are a helpful assistant chatting with a human. Use the conversation so \
far when it is relevant, and say so plainly when you do not know something.

Conversation so far:
{history}
Human: {input}
AI:";

/// Variable holding the new user message.
pub const INPUT_KEY: &str = "input";

#[derive(Debug, Clone)]
pub struct ConversationChain {
    invoker: ModelInvoker,
    memory: ConversationMemory,
    prompt: PromptTemplate,
}

impl ConversationChain {
    pub fn new(invoker: ModelInvoker, memory: ConversationMemory) -> Result<Self> {
        Ok(Self {
            invoker,
            memory,
            prompt: PromptTemplate::new(CONVERSATION_PROMPT)?,
        })
    }

    /// Use a custom prompt. It may only reference `{history}` and `{input}`.
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Result<Self> {
        if let Some(var) = prompt
            .input_variables()
            .iter()
            .find(|v| v.as_str() != MEMORY_KEY && v.as_str() != INPUT_KEY)
        {
            return Err(Error::config(format!(
                "conversation prompt uses '{{{var}}}'; only {{history}} and {{input}} are available"
            )));
        }
        self.prompt = prompt;
        Ok(self)
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn into_memory(self) -> ConversationMemory {
        self.memory
    }

    /// Answer `input` with the history in context, then remember the turn.
    ///
    /// A memory failure (the summary strategy's model call) is returned as
    /// [`Error::Unrecorded`], which carries the reply. The memory keeps the
    /// turn and retries on the next save.
    pub async fn predict(&mut self, input: &str) -> Result<String> {
        let mut vars = self.memory.load_variables();
        vars.insert(INPUT_KEY.into(), input.to_string());

        let prompt = self.prompt.render(&vars)?;
        debug!(memory = self.memory.strategy_name(), %prompt, "Conversation prompt");

        let reply = self.invoker.invoke(&prompt).await?;
        if let Err(source) = self.memory.save(Turn::new(input, reply.clone())).await {
            return Err(Error::Unrecorded {
                reply,
                source: Box::new(source),
            });
        }
        Ok(reply)
    }
}
