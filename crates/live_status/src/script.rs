//! Timed event scripts for replaying a run against a [`StatusUpdater`].
//!
//! One JSON object per line; `at_ms` is the offset from the start of the
//! replay:
//!
//! ```text
//! {"at_ms": 0,   "event": "start"}
//! {"at_ms": 40,  "event": "thinking", "text": "Looking at the config"}
//! {"at_ms": 90,  "event": "tool_start", "id": "t1", "name": "read", "args": {"path": "a.toml"}}
//! {"at_ms": 400, "event": "tool_end", "id": "t1"}
//! {"at_ms": 900, "event": "finish"}
//! ```

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use crate::state::ToolArgs;
use crate::updater::StatusUpdater;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Start,
    Thinking {
        text: String,
    },
    ToolStart {
        id: String,
        name: String,
        #[serde(default)]
        args: Option<ToolArgs>,
    },
    ToolEnd {
        id: String,
        #[serde(default)]
        failed: bool,
    },
    Flush,
    Stop,
    Delete,
    Collapse {
        #[serde(default)]
        summary: Option<String>,
    },
    Finish,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: ScriptEvent,
}

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct ScriptError {
    pub line: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Parse a script. Blank lines and lines starting with `#` are skipped.
pub fn parse_script(input: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| ScriptError {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Play `steps` against `updater` at their offsets. A run the script leaves
/// open is finished with the configured completion behaviour.
pub async fn replay(updater: &StatusUpdater, steps: &[ScriptStep]) {
    let epoch = Instant::now();
    for step in steps {
        tokio::time::sleep_until(epoch + Duration::from_millis(step.at_ms)).await;
        debug!(at_ms = step.at_ms, event = ?step.event, "replaying script step");
        apply(updater, &step.event).await;
    }
    if !updater.is_stopped().await {
        updater.finish().await;
    }
    // Waits for a delivery still in flight.
    let _ = updater.message_id().await;
}

async fn apply(updater: &StatusUpdater, event: &ScriptEvent) {
    match event {
        ScriptEvent::Start => updater.start().await,
        ScriptEvent::Thinking { text } => updater.update(text.clone()).await,
        ScriptEvent::ToolStart { id, name, args } => {
            updater
                .tool_start(id.clone(), name.clone(), args.clone())
                .await
        }
        ScriptEvent::ToolEnd { id, failed } => updater.tool_end(id, *failed).await,
        ScriptEvent::Flush => updater.flush().await,
        ScriptEvent::Stop => updater.stop().await,
        ScriptEvent::Delete => updater.delete().await,
        ScriptEvent::Collapse { summary } => updater.collapse(summary.clone()).await,
        ScriptEvent::Finish => updater.finish().await,
    }
}
