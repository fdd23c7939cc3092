use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::time::Instant;

/// Arguments a tool was invoked with, in the order the caller supplied them.
pub type ToolArgs = IndexMap<String, Value>;

/// A tool invocation that has started and not yet finished.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub id: String,
    pub name: String,
    pub args: Option<ToolArgs>,
    pub started_at: Instant,
}

/// A finished tool invocation. Never modified once recorded.
#[derive(Debug, Clone)]
pub struct CompletedToolEntry {
    pub tool: ToolEntry,
    pub failed: bool,
    pub duration: Duration,
}

impl CompletedToolEntry {
    pub fn name(&self) -> &str {
        &self.tool.name
    }
}

/// Accumulated thinking text plus active and completed tools for one status
/// message.
///
/// Active tools keep their start order; completed tools keep their completion
/// order. A tool id only ever moves from active to completed.
#[derive(Debug, Default)]
pub struct SessionState {
    thinking: Option<String>,
    active: IndexMap<String, ToolEntry>,
    completed: Vec<CompletedToolEntry>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_thinking(&mut self, text: impl Into<String>) {
        self.thinking = Some(text.into());
    }

    /// Register a running tool. Reusing an id that is still active replaces
    /// the earlier entry in place.
    pub fn start_tool(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        args: Option<ToolArgs>,
        now: Instant,
    ) {
        let id = id.into();
        self.active.insert(
            id.clone(),
            ToolEntry {
                id,
                name: name.into(),
                args,
                started_at: now,
            },
        );
    }

    /// Move a tool from active to completed. Returns false, and changes
    /// nothing, when the id is not active.
    pub fn end_tool(&mut self, id: &str, failed: bool, now: Instant) -> bool {
        let Some(tool) = self.active.shift_remove(id) else {
            return false;
        };
        let duration = now.saturating_duration_since(tool.started_at);
        self.completed.push(CompletedToolEntry {
            tool,
            failed,
            duration,
        });
        true
    }

    pub fn thinking(&self) -> Option<&str> {
        self.thinking.as_deref()
    }

    pub fn active_tools(&self) -> impl Iterator<Item = &ToolEntry> + '_ {
        self.active.values()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn completed_tools(&self) -> &[CompletedToolEntry] {
        &self.completed
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thinking.is_none() && self.active.is_empty() && self.completed.is_empty()
    }
}
