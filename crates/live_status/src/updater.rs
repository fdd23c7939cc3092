use std::sync::Arc;

use tokio::time::Instant;

use crate::config::{CompletionBehavior, StatusConfig};
use crate::diagnostics::{DiagnosticObserver, TracingObserver};
use crate::dispatch::{DispatchPhase, Dispatcher, Termination};
use crate::sink::{ChatTarget, MessageId, MessageTransport, RemoteSink};
use crate::state::ToolArgs;

/// Live status message for one run: thinking text plus tool progress, kept in
/// sync with a single remote message.
///
/// Every mutation schedules an update; updates are coalesced so the remote
/// message is edited at most once per configured interval. After a terminal
/// call (`stop`, `delete`, `collapse`, `finish`) every method is a no-op.
#[derive(Clone)]
pub struct StatusUpdater {
    dispatcher: Dispatcher,
}

impl StatusUpdater {
    pub fn new(
        config: StatusConfig,
        transport: Arc<dyn MessageTransport>,
        target: ChatTarget,
    ) -> Self {
        Self::with_observer(config, transport, target, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        config: StatusConfig,
        transport: Arc<dyn MessageTransport>,
        target: ChatTarget,
        observer: Arc<dyn DiagnosticObserver>,
    ) -> Self {
        let sink = RemoteSink::new(transport, observer, target);
        Self {
            dispatcher: Dispatcher::new(config, sink),
        }
    }

    pub fn config(&self) -> &StatusConfig {
        self.dispatcher.config()
    }

    /// Show the message right away, with a placeholder if nothing happened yet.
    pub async fn start(&self) {
        if !self.dispatcher.is_stopped().await {
            self.dispatcher.trigger().await;
        }
    }

    /// Replace the thinking text.
    pub async fn update(&self, text: impl Into<String>) {
        let text = text.into();
        self.dispatcher
            .mutate(move |session| {
                session.set_thinking(text);
                true
            })
            .await;
    }

    pub async fn tool_start(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        args: Option<ToolArgs>,
    ) {
        let (id, name) = (id.into(), name.into());
        let now = Instant::now();
        self.dispatcher
            .mutate(move |session| {
                session.start_tool(id, name, args, now);
                true
            })
            .await;
    }

    /// Mark a tool finished. Unknown or already finished ids are ignored.
    pub async fn tool_end(&self, id: &str, failed: bool) {
        let now = Instant::now();
        self.dispatcher
            .mutate(|session| session.end_tool(id, failed, now))
            .await;
    }

    /// Deliver the current state now instead of waiting for the interval.
    pub async fn flush(&self) {
        self.dispatcher.flush().await;
    }

    /// Stop updating; the remote message keeps its last content.
    pub async fn stop(&self) {
        self.dispatcher.terminate(Termination::Stop).await;
    }

    /// Stop updating and remove the remote message.
    pub async fn delete(&self) {
        self.dispatcher.terminate(Termination::Delete).await;
    }

    /// Replace the message with `summary` (or a default summary counting the
    /// completed tools) and stop.
    pub async fn collapse(&self, summary: Option<String>) {
        self.dispatcher
            .terminate(Termination::Collapse(summary))
            .await;
    }

    /// End the run the way the configuration asks for.
    pub async fn finish(&self) {
        match self.config().thinking.on_complete {
            CompletionBehavior::Delete => self.delete().await,
            CompletionBehavior::Summary => self.collapse(None).await,
            CompletionBehavior::Keep => {
                self.dispatcher.terminate(Termination::Keep).await;
            }
        }
    }

    pub async fn is_stopped(&self) -> bool {
        self.dispatcher.is_stopped().await
    }

    pub async fn phase(&self) -> DispatchPhase {
        self.dispatcher.phase().await
    }

    /// Text the next update would show.
    pub async fn rendered(&self) -> String {
        self.dispatcher.rendered().await
    }

    pub async fn completed_count(&self) -> usize {
        self.dispatcher.completed_count().await
    }

    /// Id of the remote message, once created. Waits for an update in flight.
    pub async fn message_id(&self) -> Option<MessageId> {
        self.dispatcher.message_id().await
    }
}
