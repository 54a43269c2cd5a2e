//! Fan-out of scheduler notifications.
//!
//! The scheduler publishes a [`Notification`] whenever a task is queued,
//! executed or cancelled. Publishing is fire-and-forget: the scheduler never
//! waits on a notifier, and a notifier that falls more than the bus capacity
//! behind loses the oldest notifications rather than stalling control.

use std::future::Future;

use tokio::sync::broadcast;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::notification::Notification;

use crate::ports::EventPublisher;

/// Broadcasts scheduler notifications to every attached notifier.
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// `capacity` is how many notifications a slow notifier may lag behind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a notifier. It sees notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl EventPublisher for NotificationBus {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        // No notifier attached: nobody to tell.
        let _ = self.sender.send(notification);
        async { Ok(()) }
    }
}
