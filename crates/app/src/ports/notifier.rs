//! Notifier port: surfaces scheduler transitions to an operator.

use std::future::Future;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::notification::Notification;

/// Delivers a notification to an operator channel (chat, log, …).
///
/// Delivery is best-effort: callers log failures and carry on.
pub trait Notifier {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send;
}
