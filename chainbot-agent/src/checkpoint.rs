//! # Checkpoints
//!
//! Conversation history per thread. The in-memory store lives as long as the
//! process; nothing is written to disk.

use chainbot_error::{Error, Result};
use chainbot_llm::ChatMessage;
use std::collections::HashMap;
use std::sync::Mutex;

/// Checkpoint backend trait
pub trait CheckpointStore: Send + Sync {
    /// Messages saved for `thread_id`; empty for an unknown thread
    fn load(&self, thread_id: &str) -> Result<Vec<ChatMessage>>;

    /// Replace the saved messages for `thread_id`
    fn save(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<()>;
}

fn checkpoint_key(thread_id: &str) -> String {
    format!("_checkpoint:{}", thread_id)
}

/// In-memory checkpoints (volatile)
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    data: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, serde_json::Value>>> {
        self.data
            .lock()
            .map_err(|_| Error::storage_failed("checkpoint store lock poisoned"))
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        let data = self.lock()?;
        match data.get(&checkpoint_key(thread_id)) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                Error::serialization_failed(format!("corrupt checkpoint: {}", e))
                    .with_context("thread", thread_id)
            }),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let value = serde_json::to_value(messages).map_err(|e| {
            Error::serialization_failed(format!("failed to serialize checkpoint: {}", e))
        })?;
        self.lock()?.insert(checkpoint_key(thread_id), value);
        Ok(())
    }
}
