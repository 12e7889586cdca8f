//! Broadcasting finished shots
//!
//! Delivery is at-most-once: a failed send is logged and counted, never
//! retried, and never touches the already-computed `ShotResult`.

use std::sync::Mutex;

use super::messages::{WireMessage, encode, preview_stream};
use crate::error::EngineError;
use crate::sim::shot::ShotResult;

/// Pub/sub transport consumed by the broadcaster
pub trait Transport {
    fn send(&self, payload: &str) -> Result<(), EngineError>;
}

/// What a broadcast sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastMode {
    /// One `shotRecord` message
    #[default]
    Authoritative,
    /// Only the progressive-preview stream
    Preview,
    /// Preview stream followed by the record
    Both,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub sent: usize,
    pub dropped: usize,
}

pub struct Broadcaster<T: Transport> {
    transport: T,
    mode: BroadcastMode,
}

impl<T: Transport> Broadcaster<T> {
    pub fn new(transport: T, mode: BroadcastMode) -> Self {
        Self { transport, mode }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn broadcast(&self, result: &ShotResult) -> BroadcastReport {
        let mut messages = match self.mode {
            BroadcastMode::Authoritative => Vec::new(),
            BroadcastMode::Preview | BroadcastMode::Both => preview_stream(result),
        };
        if self.mode != BroadcastMode::Preview {
            messages.push(WireMessage::record(result));
        }

        let mut report = BroadcastReport::default();
        for message in &messages {
            match encode(message).and_then(|json| self.transport.send(&json)) {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    log::warn!("Dropped message for shot {}: {}", result.id(), e);
                    report.dropped += 1;
                }
            }
        }

        log::debug!(
            "Broadcast shot {} ({:?}): {} sent, {} dropped",
            result.id(),
            self.mode,
            report.sent,
            report.dropped
        );
        report
    }
}

/// In-process transport that keeps every sent payload in order
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    sent: Mutex<Vec<String>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything sent so far
    pub fn drain(&self) -> Vec<String> {
        match self.sent.lock() {
            Ok(mut sent) => std::mem::take(&mut *sent),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, payload: &str) -> Result<(), EngineError> {
        self.sent
            .lock()
            .map_err(|_| EngineError::Transport("loopback poisoned".to_string()))?
            .push(payload.to_string());
        Ok(())
    }
}
