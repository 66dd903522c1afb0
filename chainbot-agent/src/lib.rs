//! # chainbot Agent
//!
//! The agent orchestrates the LLM <-> tools loop:
//! 1. The user (or the autonomous loop) sends a message
//! 2. The model answers, or asks for tool calls
//! 3. Tool results go back to the model
//! 4. Repeat until the model answers without asking for tools
//!
//! Each step is streamed as a [`ResponseChunk`] and the conversation is
//! checkpointed per thread, so follow-up messages see the full history.

mod checkpoint;
mod chunk;
mod executor;
pub mod session;

pub use checkpoint::{CheckpointStore, MemoryCheckpointStore};
pub use chunk::{ResponseChunk, SessionConfig, DEFAULT_THREAD_ID};
pub use executor::{AgentConfig, AgentExecutor, ChunkStream, ReactAgent};
pub use session::{
    choose_mode, run_autonomous_mode, run_chat_mode, RunMode, SessionOutcome, AUTONOMOUS_PROMPT,
    DEFAULT_INTERVAL, FAREWELL, SEPARATOR,
};
