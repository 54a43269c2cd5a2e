//! Notification delivery: drains the bus into a [`Notifier`].

use std::future::Future;

use tokio::sync::broadcast;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::notification::Notification;

use crate::ports::Notifier;

/// [`Notifier`] that writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
        tracing::info!(
            kind = %notification.kind,
            zone_id = %notification.zone_id,
            target = %notification.target,
            delay_secs = ?notification.delay_secs,
            "{notification}"
        );
        async { Ok(()) }
    }
}

/// Forward every notification received on `rx` to `notifier` until the bus
/// closes.
///
/// Delivery failures and lagging are logged and never stop the loop.
pub async fn forward_notifications<N: Notifier>(
    mut rx: broadcast::Receiver<Notification>,
    notifier: N,
) {
    loop {
        match rx.recv().await {
            Ok(notification) => {
                if let Err(err) = notifier.notify(&notification).await {
                    tracing::warn!(
                        error = %err,
                        zone_id = %notification.zone_id,
                        "failed to deliver notification"
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notifier lagging behind, notifications dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!("notification forwarding stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::NotificationBus;
    use crate::ports::EventPublisher;
    use heatkeeper_domain::decision::TargetState;
    use heatkeeper_domain::id::ZoneId;
    use heatkeeper_domain::notification::NotificationKind;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SpyNotifier {
        seen: Arc<Mutex<Vec<NotificationKind>>>,
        fail: bool,
    }

    impl Notifier for SpyNotifier {
        fn notify(
            &self,
            notification: &Notification,
        ) -> impl Future<Output = Result<(), HeatKeeperError>> + Send {
            self.seen.lock().unwrap().push(notification.kind);
            let fail = self.fail;
            async move {
                if fail {
                    Err(HeatKeeperError::Unavailable)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn notification(kind: NotificationKind) -> Notification {
        Notification::new(kind, ZoneId::new(1), "Study", TargetState::Auto, None, "test")
    }

    #[tokio::test]
    async fn should_forward_notifications_until_bus_closes() {
        let bus = NotificationBus::new(8);
        let spy = SpyNotifier::default();
        let rx = bus.subscribe();

        bus.publish(notification(NotificationKind::Queued)).await.unwrap();
        bus.publish(notification(NotificationKind::Executed)).await.unwrap();
        drop(bus);

        forward_notifications(rx, spy.clone()).await;

        assert_eq!(
            *spy.seen.lock().unwrap(),
            vec![NotificationKind::Queued, NotificationKind::Executed]
        );
    }

    #[tokio::test]
    async fn should_keep_forwarding_after_delivery_failure() {
        let bus = NotificationBus::new(8);
        let spy = SpyNotifier {
            fail: true,
            ..SpyNotifier::default()
        };
        let rx = bus.subscribe();

        bus.publish(notification(NotificationKind::Queued)).await.unwrap();
        bus.publish(notification(NotificationKind::Cancelled)).await.unwrap();
        drop(bus);

        forward_notifications(rx, spy.clone()).await;

        assert_eq!(spy.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_accept_notifications_in_log_notifier() {
        let result = LogNotifier.notify(&notification(NotificationKind::Queued)).await;
        assert!(result.is_ok());
    }
}
