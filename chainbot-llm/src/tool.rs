//! Tools the model can call.
//!
//! A [`Tool`] pairs a [`ToolDefinition`] (what the model sees) with an async
//! `call` that receives the raw JSON arguments string. A [`ToolSet`] is the
//! name-indexed collection the agent dispatches against.

use crate::provider::ToolDefinition;
use async_trait::async_trait;
use chainbot_error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and JSON schema presented to the model
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the model-supplied arguments.
    ///
    /// `Ok` text goes back to the model verbatim. `Err` aborts nothing: the
    /// agent reports it to the model as a tool message.
    async fn call(&self, arguments: &str) -> Result<String>;

    fn name(&self) -> String {
        self.definition().name
    }
}

/// Registered tools, in registration order
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A later tool with the same name replaces the earlier one.
    pub fn add(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up `name` and run it
    pub async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        let tool = self.get(name).ok_or_else(|| Error::tool_not_found(name))?;
        tool.call(arguments).await
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        let mut set = ToolSet::new();
        for tool in iter {
            set.add(tool);
        }
        set
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainbot_error::ErrorKind;

    struct Echo {
        name: &'static str,
        prefix: &'static str,
    }

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.name, "echo the arguments")
        }

        async fn call(&self, arguments: &str) -> Result<String> {
            Ok(format!("{}{}", self.prefix, arguments))
        }
    }

    fn echo(name: &'static str, prefix: &'static str) -> Arc<dyn Tool> {
        Arc::new(Echo { name, prefix })
    }

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let set: ToolSet = vec![echo("a", "A:"), echo("b", "B:")].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.call("b", "{}").await.unwrap(), "B:{}");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let set = ToolSet::new();
        let err = set.call("missing", "{}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolNotFound);
    }

    #[tokio::test]
    async fn test_replace_keeps_position() {
        let mut set = ToolSet::new();
        set.add(echo("a", "old:"));
        set.add(echo("b", "B:"));
        set.add(echo("a", "new:"));

        assert_eq!(set.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(set.call("a", "x").await.unwrap(), "new:x");
        assert_eq!(set.definitions().len(), 2);
    }
}
