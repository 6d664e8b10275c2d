//! Outbound message broker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, ServiceError};

/// Publishes JSON payloads on named channels.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn publish(&self, channel: &str, payload: Value) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryBrokerState {
    channels: HashMap<String, Vec<Value>>,
    failures_remaining: u32,
}

/// In-memory broker for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<InMemoryBrokerState>>,
}

impl InMemoryBroker {
    /// Creates a new in-memory broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` publishes fail.
    pub fn fail_next(&self, count: u32) {
        self.state().failures_remaining = count;
    }

    /// Returns the payloads published on a channel, oldest first.
    pub fn messages(&self, channel: &str) -> Vec<Value> {
        self.state()
            .channels
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, InMemoryBrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, channel: &str, payload: Value) -> Result<()> {
        let mut state = self.state();

        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(ServiceError::Publish(format!(
                "Broker rejected message on {channel}"
            )));
        }

        state
            .channels
            .entry(channel.to_string())
            .or_default()
            .push(payload);
        Ok(())
    }
}

/// Broker that writes published messages to the log.
#[derive(Debug, Clone, Default)]
pub struct LogBroker;

#[async_trait]
impl MessageBroker for LogBroker {
    async fn publish(&self, channel: &str, payload: Value) -> Result<()> {
        tracing::info!(%channel, %payload, "message published");
        Ok(())
    }
}
