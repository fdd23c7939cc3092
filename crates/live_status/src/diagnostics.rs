//! Diagnostic events raised by the sink and dispatcher.
//!
//! The updater takes an observer rather than logging through a global, so a
//! host can route these events wherever it wants. [`TracingObserver`] is the
//! default and simply forwards to `tracing`.

use std::fmt;

use tracing::{debug, warn};

/// Which remote operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Create,
    Edit,
    Remove,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOp::Create => "create",
            RemoteOp::Edit => "edit",
            RemoteOp::Remove => "remove",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// Content reached the transport.
    Delivered { op: RemoteOp, chars: usize },
    /// Content matched what was last delivered; no call was made.
    Skipped,
    /// The transport reported a failure; delivery state is unchanged.
    DeliveryFailed { op: RemoteOp, error: String },
    Removed,
    RemoveFailed { error: String },
}

pub trait DiagnosticObserver: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DiagnosticObserver for TracingObserver {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::Delivered { op, chars } => {
                debug!(%op, chars, "status message delivered");
            }
            DiagnosticEvent::Skipped => {
                debug!("status message unchanged; skipping delivery");
            }
            DiagnosticEvent::DeliveryFailed { op, error } => {
                warn!(%op, "failed to deliver status message: {error}");
            }
            DiagnosticEvent::Removed => {
                debug!("status message removed");
            }
            DiagnosticEvent::RemoveFailed { error } => {
                warn!("failed to remove status message: {error}");
            }
        }
    }
}
