//! Remote message sink.
//!
//! [`MessageTransport`] is the seam to the messaging service: create, edit and
//! remove one message. [`RemoteSink`] wraps a transport with the delivery
//! bookkeeping for a single status message: the message id once created, and
//! the last content that made it through (used to skip redundant edits).
//! Transport failures are reported to the observer and never propagate.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::diagnostics::{DiagnosticEvent, DiagnosticObserver, RemoteOp};
use crate::error::TransportError;

/// Where the status message lives, e.g. a chat and an optional thread in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatTarget {
    pub chat: String,
    pub thread: Option<String>,
}

impl ChatTarget {
    pub fn new(chat: impl Into<String>) -> Self {
        Self {
            chat: chat.into(),
            thread: None,
        }
    }

    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = Some(thread.into());
        self
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.thread {
            Some(thread) => write!(f, "{}#{}", self.chat, thread),
            None => f.write_str(&self.chat),
        }
    }
}

/// Identifier the transport assigned to a created message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Markup dialect of the text handed to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextFormat {
    #[default]
    Html,
    Plain,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn create(
        &self,
        target: &ChatTarget,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageId, TransportError>;

    async fn edit(
        &self,
        target: &ChatTarget,
        id: &MessageId,
        text: &str,
        format: TextFormat,
    ) -> Result<(), TransportError>;

    async fn remove(&self, target: &ChatTarget, id: &MessageId) -> Result<(), TransportError>;
}

/// Result of one [`RemoteSink::deliver`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Identical to the last delivered content; the transport was not called.
    Skipped,
    Failed,
}

impl DeliveryOutcome {
    /// Whether the transport was actually called.
    pub fn attempted(self) -> bool {
        !matches!(self, DeliveryOutcome::Skipped)
    }
}

#[derive(Debug, Default, Clone)]
pub struct DeliveryState {
    pub message_id: Option<MessageId>,
    pub last_sent: Option<String>,
    pub last_delivered_at: Option<Instant>,
}

pub struct RemoteSink {
    transport: Arc<dyn MessageTransport>,
    observer: Arc<dyn DiagnosticObserver>,
    target: ChatTarget,
    format: TextFormat,
    state: DeliveryState,
}

impl RemoteSink {
    pub fn new(
        transport: Arc<dyn MessageTransport>,
        observer: Arc<dyn DiagnosticObserver>,
        target: ChatTarget,
    ) -> Self {
        Self {
            transport,
            observer,
            target,
            format: TextFormat::Html,
            state: DeliveryState::default(),
        }
    }

    pub fn state(&self) -> &DeliveryState {
        &self.state
    }

    pub fn message_id(&self) -> Option<&MessageId> {
        self.state.message_id.as_ref()
    }

    /// Create the message on first use, edit it afterwards.
    pub async fn deliver(&mut self, text: &str) -> DeliveryOutcome {
        if self.state.last_sent.as_deref() == Some(text) {
            self.observer.record(DiagnosticEvent::Skipped);
            return DeliveryOutcome::Skipped;
        }

        let (op, result) = match self.state.message_id.clone() {
            None => {
                let result = self
                    .transport
                    .create(&self.target, text, self.format)
                    .await
                    .map(|id| {
                        self.state.message_id = Some(id);
                    });
                (RemoteOp::Create, result)
            }
            Some(id) => {
                let result = self
                    .transport
                    .edit(&self.target, &id, text, self.format)
                    .await;
                (RemoteOp::Edit, result)
            }
        };

        match result {
            // The remote side already shows this text.
            Ok(()) | Err(TransportError::NotModified) => {
                self.state.last_sent = Some(text.to_string());
                self.state.last_delivered_at = Some(Instant::now());
                self.observer.record(DiagnosticEvent::Delivered {
                    op,
                    chars: text.chars().count(),
                });
                DeliveryOutcome::Delivered
            }
            Err(err) => {
                self.observer.record(DiagnosticEvent::DeliveryFailed {
                    op,
                    error: err.to_string(),
                });
                DeliveryOutcome::Failed
            }
        }
    }

    /// Remove the message if one was created. Returns true when nothing is
    /// left on the remote side.
    pub async fn remove(&mut self) -> bool {
        let Some(id) = self.state.message_id.clone() else {
            return true;
        };
        match self.transport.remove(&self.target, &id).await {
            Ok(()) | Err(TransportError::MessageNotFound) => {
                self.state = DeliveryState::default();
                self.observer.record(DiagnosticEvent::Removed);
                true
            }
            Err(err) => {
                self.observer.record(DiagnosticEvent::RemoveFailed {
                    error: err.to_string(),
                });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingObserver, RecordingTransport, TransportCall};

    fn sink_with(transport: &Arc<RecordingTransport>) -> (RemoteSink, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let sink = RemoteSink::new(
            transport.clone(),
            observer.clone(),
            ChatTarget::new("chat-1"),
        );
        (sink, observer)
    }

    #[tokio::test]
    async fn creates_then_edits() {
        let transport = Arc::new(RecordingTransport::new());
        let (mut sink, _) = sink_with(&transport);

        assert_eq!(sink.deliver("one").await, DeliveryOutcome::Delivered);
        assert_eq!(sink.deliver("two").await, DeliveryOutcome::Delivered);

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], TransportCall::Create { text, .. } if text == "one"));
        assert!(
            matches!(&calls[1], TransportCall::Edit { id, text, .. } if text == "two" && id.0 == "msg-1")
        );
        assert_eq!(sink.message_id(), Some(&MessageId("msg-1".into())));
    }

    #[tokio::test]
    async fn identical_content_is_not_sent() {
        let transport = Arc::new(RecordingTransport::new());
        let (mut sink, observer) = sink_with(&transport);

        sink.deliver("same").await;
        assert_eq!(sink.deliver("same").await, DeliveryOutcome::Skipped);
        assert_eq!(transport.calls().len(), 1);
        assert!(observer.events().contains(&DiagnosticEvent::Skipped));
    }

    #[tokio::test]
    async fn failure_is_swallowed_and_retried_later() {
        let transport = Arc::new(RecordingTransport::new());
        let (mut sink, observer) = sink_with(&transport);

        transport.fail_next(TransportError::Network("timeout".into()));
        assert_eq!(sink.deliver("hello").await, DeliveryOutcome::Failed);
        assert!(sink.message_id().is_none());
        assert!(sink.state().last_sent.is_none());
        assert!(matches!(
            observer.events()[0],
            DiagnosticEvent::DeliveryFailed {
                op: RemoteOp::Create,
                ..
            }
        ));

        // Same content again is a real retry, not a dedupe skip.
        assert_eq!(sink.deliver("hello").await, DeliveryOutcome::Delivered);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn not_modified_counts_as_delivered() {
        let transport = Arc::new(RecordingTransport::new());
        let (mut sink, _) = sink_with(&transport);
        sink.deliver("a").await;

        transport.fail_next(TransportError::NotModified);
        assert_eq!(sink.deliver("b").await, DeliveryOutcome::Delivered);
        assert_eq!(sink.state().last_sent.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn remove_tolerates_missing_message() {
        let transport = Arc::new(RecordingTransport::new());
        let (mut sink, _) = sink_with(&transport);

        assert!(sink.remove().await);
        assert!(transport.calls().is_empty());

        sink.deliver("x").await;
        assert!(sink.remove().await);
        assert!(sink.message_id().is_none());
        assert!(matches!(transport.calls()[1], TransportCall::Remove { .. }));
    }

    #[test]
    fn target_display_includes_thread() {
        assert_eq!(ChatTarget::new("42").with_thread("7").to_string(), "42#7");
        assert_eq!(ChatTarget::new("42").to_string(), "42");
    }
}
