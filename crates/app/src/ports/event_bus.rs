//! Event bus port: publish scheduler notifications to interested subscribers.

use std::future::Future;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::notification::Notification;

/// Publishes notifications to all current subscribers.
pub trait EventPublisher {
    /// Publish a notification to all current subscribers.
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        (**self).publish(notification)
    }
}
