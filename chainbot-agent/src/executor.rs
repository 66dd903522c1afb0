//! Agent executor - orchestrates the LLM <-> tools loop

use crate::checkpoint::CheckpointStore;
use crate::chunk::{ResponseChunk, SessionConfig};
use chainbot_error::{Error, ErrorKind, Result};
use chainbot_llm::{ChatMessage, CompletionRequest, LlmProvider, Tool, ToolCall, ToolSet};
use futures_core::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Chunks of one agent run, in order. An `Err` item ends the stream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ResponseChunk>> + Send>>;

/// Something that turns one user message into a stream of response chunks
pub trait AgentExecutor: Send + Sync {
    fn stream(&self, message: ChatMessage, config: &SessionConfig) -> ChunkStream;
}

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model calls allowed per user message
    pub max_iterations: usize,
    /// Override the provider's default model
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            model: None,
            temperature: None,
        }
    }
}

struct Inner {
    provider: Arc<dyn LlmProvider>,
    tools: ToolSet,
    checkpoints: Arc<dyn CheckpointStore>,
    system_prompt: String,
    config: AgentConfig,
}

/// A ReAct agent: the model answers or asks for tools, tool results go back
/// to the model, until it answers without asking for tools.
#[derive(Clone)]
pub struct ReactAgent {
    inner: Arc<Inner>,
}

impl ReactAgent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Vec<Arc<dyn Tool>>,
        checkpoints: Arc<dyn CheckpointStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self::with_config(
            provider,
            tools,
            checkpoints,
            system_prompt,
            AgentConfig::default(),
        )
    }

    pub fn with_config(
        provider: Arc<dyn LlmProvider>,
        tools: Vec<Arc<dyn Tool>>,
        checkpoints: Arc<dyn CheckpointStore>,
        system_prompt: impl Into<String>,
        config: AgentConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                tools: tools.into_iter().collect(),
                checkpoints,
                system_prompt: system_prompt.into(),
                config,
            }),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.inner.tools.names()
    }

    pub fn system_prompt(&self) -> &str {
        &self.inner.system_prompt
    }
}

impl std::fmt::Debug for ReactAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactAgent")
            .field("provider", &self.inner.provider.name())
            .field("tools", &self.inner.tools)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Inner {
    async fn call_model(&self, history: &[ChatMessage]) -> Result<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend(history.iter().cloned());

        let mut request = CompletionRequest::new(messages).with_tools(self.tools.definitions());
        if let Some(model) = &self.config.model {
            request = request.with_model(model.as_str());
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.provider.complete(request).await.map_err(|e| {
            e.into_error(self.provider.name())
                .with_operation("agent::call_model")
        })?;
        debug!(
            finish_reason = ?response.finish_reason,
            tool_calls = response.tool_calls.len(),
            total_tokens = response.usage.total_tokens,
            "model responded"
        );
        Ok(response.into_message())
    }

    /// Run every requested tool in order. Failures, including unknown tool
    /// names, become `Error: ...` results.
    async fn run_tools(&self, calls: &[ToolCall]) -> Vec<ChatMessage> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            info!(tool = %call.name, "calling tool");
            let output = match self.tools.call(&call.name, &call.arguments).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool call failed");
                    format!("Error: {}", e.message())
                }
            };
            results.push(ChatMessage::tool_result(call.id.as_str(), output));
        }
        results
    }
}

impl AgentExecutor for ReactAgent {
    fn stream(&self, message: ChatMessage, config: &SessionConfig) -> ChunkStream {
        let inner = self.inner.clone();
        let thread_id = config.thread_id.clone();

        let stream = async_stream::stream! {
            let mut history = match inner.checkpoints.load(&thread_id) {
                Ok(history) => history,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            history.push(message);

            for step in 1..=inner.config.max_iterations {
                debug!(thread = %thread_id, step, "agent step");

                let reply = match inner.call_model(&history).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                let calls = reply.requested_tools().to_vec();
                history.push(reply.clone());
                if let Err(e) = inner.checkpoints.save(&thread_id, &history) {
                    yield Err(e);
                    return;
                }
                yield Ok(ResponseChunk::Agent { messages: vec![reply] });

                if calls.is_empty() {
                    return;
                }

                let results = inner.run_tools(&calls).await;
                history.extend(results.iter().cloned());
                if let Err(e) = inner.checkpoints.save(&thread_id, &history) {
                    yield Err(e);
                    return;
                }
                yield Ok(ResponseChunk::Tools { messages: results });
            }

            yield Err(Error::new(
                ErrorKind::StepLimitExceeded,
                format!(
                    "agent did not finish within {} model calls",
                    inner.config.max_iterations
                ),
            )
            .with_operation("agent::stream")
            .with_context("thread", thread_id.clone()));
        };

        Box::pin(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use async_trait::async_trait;
    use chainbot_llm::{
        CompletionResponse, FinishReason, ProviderError, ToolDefinition, Usage,
    };
    use futures_util::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records every request it receives
    struct ScriptedProvider {
        replies: Mutex<VecDeque<std::result::Result<CompletionResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(
            replies: Vec<std::result::Result<CompletionResponse, ProviderError>>,
        ) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    fn text(content: &str) -> std::result::Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse {
            id: "r".into(),
            model: "test".into(),
            content: Some(content.into()),
            tool_calls: vec![],
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }

    fn tool_call(
        id: &str,
        name: &str,
        args: &str,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse {
            id: "r".into(),
            model: "test".into(),
            content: None,
            tool_calls: vec![ToolCall {
                id: id.into(),
                name: name.into(),
                arguments: args.into(),
            }],
            finish_reason: FinishReason::ToolCalls,
            usage: Usage::default(),
        })
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "test"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))
        }
    }

    struct Balance;

    #[async_trait]
    impl Tool for Balance {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("get_balance", "balance")
        }

        async fn call(&self, _arguments: &str) -> Result<String> {
            Ok("1.5 ETH".into())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("broken", "always fails")
        }

        async fn call(&self, _arguments: &str) -> Result<String> {
            Err(Error::tool_failed("broken", "RPC returned 503"))
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, store: Arc<MemoryCheckpointStore>) -> ReactAgent {
        ReactAgent::new(
            provider,
            vec![Arc::new(Balance), Arc::new(Broken)],
            store,
            "You are a test agent.",
        )
    }

    async fn collect(stream: ChunkStream) -> Vec<Result<ResponseChunk>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_plain_answer_is_one_chunk() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("hello")]));
        let store = Arc::new(MemoryCheckpointStore::new());
        let agent = agent(provider.clone(), store.clone());

        let chunks = collect(agent.stream(ChatMessage::user("hi"), &SessionConfig::default())).await;
        assert_eq!(chunks.len(), 1);
        let chunk = chunks[0].as_ref().unwrap();
        assert_eq!(chunk.kind(), "agent");
        assert_eq!(chunk.first_text(), "hello");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].messages[0].text(), "You are a test agent.");
        assert_eq!(requests[0].messages[1].text(), "hi");
        assert_eq!(requests[0].tools.as_ref().map(|t| t.len()), Some(2));
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("c1", "get_balance", "{}"),
            text("You have 1.5 ETH"),
        ]));
        let store = Arc::new(MemoryCheckpointStore::new());
        let agent = agent(provider.clone(), store.clone());

        let chunks = collect(agent.stream(ChatMessage::user("balance?"), &SessionConfig::default())).await;
        let kinds: Vec<&str> = chunks.iter().map(|c| c.as_ref().unwrap().kind()).collect();
        assert_eq!(kinds, vec!["agent", "tools", "agent"]);
        assert_eq!(chunks[1].as_ref().unwrap().first_text(), "1.5 ETH");
        assert_eq!(chunks[2].as_ref().unwrap().first_text(), "You have 1.5 ETH");

        // the second request carries the tool result
        let requests = provider.requests.lock().unwrap();
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("c1"));

        // user, assistant(tool call), tool, assistant
        assert_eq!(store.load("chainbot-session").unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_tool_failures_are_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("c1", "broken", "{}"),
            tool_call("c2", "teleport", "{}"),
            text("sorry"),
        ]));
        let agent = agent(provider, Arc::new(MemoryCheckpointStore::new()));

        let chunks = collect(agent.stream(ChatMessage::user("go"), &SessionConfig::default())).await;
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[1].as_ref().unwrap().first_text(), "Error: RPC returned 503");
        assert_eq!(
            chunks[3].as_ref().unwrap().first_text(),
            "Error: tool 'teleport' not found"
        );
    }

    #[tokio::test]
    async fn test_history_carries_across_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![text("one"), text("two")]));
        let store = Arc::new(MemoryCheckpointStore::new());
        let agent = agent(provider.clone(), store);
        let session = SessionConfig::default();

        collect(agent.stream(ChatMessage::user("first"), &session)).await;
        collect(agent.stream(ChatMessage::user("second"), &session)).await;

        let requests = provider.requests.lock().unwrap();
        // system, first, one, second
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[2].text(), "one");
    }

    #[tokio::test]
    async fn test_provider_error_ends_stream() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Api {
            status: 503,
            message: "over capacity".into(),
        })]));
        let agent = agent(provider, Arc::new(MemoryCheckpointStore::new()));

        let chunks = collect(agent.stream(ChatMessage::user("hi"), &SessionConfig::default())).await;
        assert_eq!(chunks.len(), 1);
        let err = chunks[0].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_step_limit() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("c1", "get_balance", "{}"),
            tool_call("c2", "get_balance", "{}"),
            tool_call("c3", "get_balance", "{}"),
        ]));
        let agent = ReactAgent::with_config(
            provider,
            vec![Arc::new(Balance)],
            Arc::new(MemoryCheckpointStore::new()),
            "test",
            AgentConfig {
                max_iterations: 2,
                ..AgentConfig::default()
            },
        );

        let chunks = collect(agent.stream(ChatMessage::user("loop"), &SessionConfig::default())).await;
        assert_eq!(chunks.len(), 5);
        let err = chunks[4].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StepLimitExceeded);
    }
}
