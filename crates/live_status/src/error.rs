use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`MessageTransport`](crate::sink::MessageTransport).
///
/// The sink adapter records these and swallows them; they never reach the
/// caller of the updater.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport rejected the request ({status}): {description}")]
    Rejected { status: u16, description: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("message not found")]
    MessageNotFound,

    #[error("message content not modified")]
    NotModified,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
