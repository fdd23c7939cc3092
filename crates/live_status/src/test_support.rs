//! Test doubles shared by the unit tests of several modules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::diagnostics::{DiagnosticEvent, DiagnosticObserver};
use crate::error::TransportError;
use crate::sink::{ChatTarget, MessageId, MessageTransport, TextFormat};

#[derive(Debug, Clone)]
pub enum TransportCall {
    Create { text: String, at: Instant },
    Edit { id: MessageId, text: String, at: Instant },
    Remove { id: MessageId, at: Instant },
}

impl TransportCall {
    pub fn at(&self) -> Instant {
        match self {
            TransportCall::Create { at, .. }
            | TransportCall::Edit { at, .. }
            | TransportCall::Remove { at, .. } => *at,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            TransportCall::Create { text, .. } | TransportCall::Edit { text, .. } => Some(text),
            TransportCall::Remove { .. } => None,
        }
    }
}

/// Transport that records every call, optionally takes `latency` to answer,
/// and fails the calls queued with [`fail_next`](Self::fail_next).
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    failures: Mutex<VecDeque<TransportError>>,
    latency: Mutex<Duration>,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        let transport = Self::default();
        transport.set_latency(latency);
        transport
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn fail_next(&self, err: TransportError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.text().map(str::to_string))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn perform(&self, call: TransportCall) -> Result<(), TransportError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn create(
        &self,
        _target: &ChatTarget,
        text: &str,
        _format: TextFormat,
    ) -> Result<MessageId, TransportError> {
        self.perform(TransportCall::Create {
            text: text.to_string(),
            at: Instant::now(),
        })
        .await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageId(format!("msg-{n}")))
    }

    async fn edit(
        &self,
        _target: &ChatTarget,
        id: &MessageId,
        text: &str,
        _format: TextFormat,
    ) -> Result<(), TransportError> {
        self.perform(TransportCall::Edit {
            id: id.clone(),
            text: text.to_string(),
            at: Instant::now(),
        })
        .await
    }

    async fn remove(&self, _target: &ChatTarget, id: &MessageId) -> Result<(), TransportError> {
        self.perform(TransportCall::Remove {
            id: id.clone(),
            at: Instant::now(),
        })
        .await
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DiagnosticObserver for RecordingObserver {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().unwrap().push(event);
    }
}
