//! Outbound notifications.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{Result, ServiceError};

/// Sends a message to a destination such as an email address.
#[async_trait]
pub trait Notifications: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<()>;
}

/// A notification that was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub destination: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct InMemoryNotificationsState {
    sent: Vec<SentNotification>,
    failures_remaining: u32,
}

/// In-memory notifications for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifications {
    state: Arc<Mutex<InMemoryNotificationsState>>,
}

impl InMemoryNotifications {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` sends fail.
    pub fn fail_next(&self, count: u32) {
        self.state().failures_remaining = count;
    }

    /// Returns every notification sent so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.state().sent.clone()
    }

    /// Returns the messages sent to one destination.
    pub fn sent_to(&self, destination: &str) -> Vec<String> {
        self.state()
            .sent
            .iter()
            .filter(|n| n.destination == destination)
            .map(|n| n.message.clone())
            .collect()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, InMemoryNotificationsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Notifications for InMemoryNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        let mut state = self.state();

        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(ServiceError::Notification(format!(
                "Could not reach {destination}"
            )));
        }

        state.sent.push(SentNotification {
            destination: destination.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Notifications written to the log instead of delivered.
#[derive(Debug, Clone, Default)]
pub struct LogNotifications;

#[async_trait]
impl Notifications for LogNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        tracing::info!(%destination, %message, "notification sent");
        Ok(())
    }
}
