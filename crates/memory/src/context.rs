//! Turns and the context a memory store hands back to prompts.

use chainwright_core::message::Message;
use serde::{Deserialize, Serialize};

/// Prefix for the user's side of a turn in rendered history.
pub const HUMAN_PREFIX: &str = "Human";

/// Prefix for the model's side of a turn in rendered history.
pub const AI_PREFIX: &str = "AI";

/// One input/output exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub input: String,
    pub output: String,
}

impl Turn {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// `Human: ...` and `AI: ...` on two lines.
    pub fn render(&self) -> String {
        format!(
            "{HUMAN_PREFIX}: {}\n{AI_PREFIX}: {}",
            self.input, self.output
        )
    }
}

/// What `load` returns: an optional running summary followed by turns,
/// oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryContext {
    pub summary: Option<String>,
    pub turns: Vec<Turn>,
}

impl MemoryContext {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.turns.is_empty()
    }

    /// History as plain text, ready for a `{history}` placeholder.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.turns.len() + 1);
        if let Some(summary) = &self.summary {
            parts.push(format!("System: {summary}"));
        }
        if !self.turns.is_empty() {
            parts.push(render_turns(&self.turns));
        }
        parts.join("\n")
    }

    /// History as role-tagged chat messages.
    pub fn as_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() * 2 + 1);
        if let Some(summary) = &self.summary {
            messages.push(Message::system(summary.clone()));
        }
        for turn in &self.turns {
            messages.push(Message::user(turn.input.clone()));
            messages.push(Message::assistant(turn.output.clone()));
        }
        messages
    }
}

/// Render turns one after another, oldest first.
pub fn render_turns<'a>(turns: impl IntoIterator<Item = &'a Turn>) -> String {
    turns
        .into_iter()
        .map(Turn::render)
        .collect::<Vec<_>>()
        .join("\n")
}
