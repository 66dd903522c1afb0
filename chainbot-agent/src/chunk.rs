//! What one agent invocation produces, and the thread it belongs to

use chainbot_llm::ChatMessage;

/// Thread id used for the single conversation a process holds
pub const DEFAULT_THREAD_ID: &str = "chainbot-session";

/// Identifies the conversation thread. Created once, passed unchanged to
/// every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub thread_id: String,
}

impl SessionConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_THREAD_ID)
    }
}

/// One step of a streamed agent run
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseChunk {
    /// A message produced by the model
    Agent { messages: Vec<ChatMessage> },
    /// Results of the tools the model asked for
    Tools { messages: Vec<ChatMessage> },
}

impl ResponseChunk {
    pub fn messages(&self) -> &[ChatMessage] {
        match self {
            ResponseChunk::Agent { messages } | ResponseChunk::Tools { messages } => messages,
        }
    }

    /// Text of the first message, or "" if there is none
    pub fn first_text(&self) -> &str {
        self.messages().first().map(|m| m.text()).unwrap_or("")
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResponseChunk::Agent { .. } => "agent",
            ResponseChunk::Tools { .. } => "tools",
        }
    }
}
