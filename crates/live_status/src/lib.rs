//! Rate-limited, coalescing status message updater.
//!
//! A [`StatusUpdater`] tracks the thinking text and the tool calls of a run
//! and mirrors them into one remote message through a [`MessageTransport`].
//! Changes arrive far faster than the transport accepts edits, so updates
//! are coalesced: at most one remote call is in flight, consecutive calls
//! are spaced by the configured interval, and the message always ends up
//! showing the latest state.

pub mod config;
pub mod console;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod render;
pub mod script;
pub mod sink;
pub mod state;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{CompletionBehavior, StatusConfig, ThinkingConfig, ToolDisplayConfig};
pub use diagnostics::{DiagnosticEvent, DiagnosticObserver, TracingObserver};
pub use dispatch::DispatchPhase;
pub use error::{ConfigError, TransportError};
pub use sink::{ChatTarget, MessageId, MessageTransport, TextFormat};
pub use state::ToolArgs;
pub use updater::StatusUpdater;
