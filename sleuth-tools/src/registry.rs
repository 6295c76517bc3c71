use crate::context::CallContext;
use crate::tool::{Tool, ToolError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

/// Id, name and usage text of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Thread-safe table of tools keyed by id.
///
/// Clones share the same table, so tools can be registered after the
/// registry has been handed out.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` under `id`, returning whatever it replaced.
    pub fn register(&self, id: impl Into<String>, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let id = id.into();
        let replaced = self.tools.insert(id.clone(), tool);
        if replaced.is_some() {
            warn!(target: "tools.registry", %id, "tool replaced");
        }
        replaced
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Every registered tool, ordered by id.
    pub fn list(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .iter()
            .map(|entry| ToolInfo {
                id: entry.key().clone(),
                name: entry.value().name().to_string(),
                description: entry.value().description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Invoke the tool registered as `id`.
    pub async fn call(
        &self,
        id: &str,
        ctx: &CallContext,
        input: &str,
    ) -> Result<String, ToolError> {
        // Clone out of the map so no shard lock is held across the await.
        let tool = self
            .get(id)
            .ok_or_else(|| ToolError::NotRegistered(id.to_string()))?;

        let span = info_span!("tool_call", tool = %id, call_id = %ctx.call_id());
        async move {
            info!(input_len = input.len(), "invoking tool");
            let result = tool.call(ctx, input).await;
            match &result {
                Ok(out) => info!(output_len = out.len(), "tool finished"),
                Err(e) => warn!(error = %e, "tool failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "Repeats its input."
        }
        async fn call(&self, _ctx: &CallContext, input: &str) -> Result<String, ToolError> {
            Ok(format!("{}:{input}", self.0))
        }
    }

    #[tokio::test]
    async fn dispatches_by_id() {
        let registry = ToolRegistry::new();
        registry.register("first", Arc::new(Echo("a")));
        registry.register("second", Arc::new(Echo("b")));

        let out = registry
            .call("second", &CallContext::new(), "hi")
            .await
            .unwrap();
        assert_eq!(out, "b:hi");
    }

    #[tokio::test]
    async fn unknown_id_is_not_registered() {
        let registry = ToolRegistry::new();
        let err = registry
            .call("missing", &CallContext::new(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotRegistered(ref id) if id == "missing"));
    }

    #[test]
    fn list_is_sorted_and_replacement_is_reported() {
        let registry = ToolRegistry::new();
        assert!(registry.register("zeta", Arc::new(Echo("z"))).is_none());
        assert!(registry.register("alpha", Arc::new(Echo("a"))).is_none());
        assert!(registry.register("zeta", Arc::new(Echo("z2"))).is_some());

        let ids: Vec<_> = registry.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["alpha", "zeta"]);
        assert_eq!(registry.get("zeta").unwrap().name(), "z2");
        assert_eq!(registry.len(), 2);
    }
}
