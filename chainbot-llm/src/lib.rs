//! # chainbot LLM
//!
//! The language-model side of chainbot.
//!
//! ## Core Concepts
//! - **ChatMessage**: OpenAI-style conversation entries, including tool calls
//! - **Tool**: something the model can invoke by name with JSON arguments
//! - **Provider**: trait-based LLM communication (Groq, OpenAI, any compatible endpoint)

pub mod provider;
pub mod tool;

pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, ToolCall, ToolChoice,
    ToolDefinition, Usage,
};
pub use tool::{Tool, ToolSet};
