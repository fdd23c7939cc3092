use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::sink::{ChatTarget, MessageId, MessageTransport, TextFormat};

/// Transport that prints every remote call as one JSON line.
///
/// Stands in for a real messaging service when replaying scripts, so the
/// effect of rate limiting and coalescing can be inspected.
pub struct ConsoleTransport<W: Write + Send> {
    out: Mutex<W>,
    epoch: Instant,
    latency: Duration,
    next_id: AtomicU64,
}

impl ConsoleTransport<io::Stdout> {
    pub fn stdout(latency: Duration) -> Self {
        Self::new(io::stdout(), latency)
    }
}

impl<W: Write + Send> ConsoleTransport<W> {
    pub fn new(out: W, latency: Duration) -> Self {
        Self {
            out: Mutex::new(out),
            epoch: Instant::now(),
            latency,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn emit(&self, record: serde_json::Value) -> Result<(), TransportError> {
        let mut record = record;
        record["at_ms"] = json!(self.epoch.elapsed().as_millis() as u64);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut out = self
            .out
            .lock()
            .map_err(|_| TransportError::Other("console output poisoned".into()))?;
        writeln!(out, "{record}")
            .and_then(|()| out.flush())
            .map_err(|err| TransportError::Other(err.to_string()))
    }
}

#[async_trait]
impl<W: Write + Send + 'static> MessageTransport for ConsoleTransport<W> {
    async fn create(
        &self,
        target: &ChatTarget,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageId, TransportError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
        self.emit(json!({
            "op": "create",
            "target": target.to_string(),
            "id": id.0,
            "format": format_name(format),
            "text": text,
        }))
        .await?;
        Ok(id)
    }

    async fn edit(
        &self,
        target: &ChatTarget,
        id: &MessageId,
        text: &str,
        format: TextFormat,
    ) -> Result<(), TransportError> {
        self.emit(json!({
            "op": "edit",
            "target": target.to_string(),
            "id": id.0,
            "format": format_name(format),
            "text": text,
        }))
        .await
    }

    async fn remove(&self, target: &ChatTarget, id: &MessageId) -> Result<(), TransportError> {
        self.emit(json!({
            "op": "remove",
            "target": target.to_string(),
            "id": id.0,
        }))
        .await
    }
}

fn format_name(format: TextFormat) -> &'static str {
    match format {
        TextFormat::Html => "html",
        TextFormat::Plain => "plain",
    }
}
