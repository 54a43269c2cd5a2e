//! Poller: builds [`Update`] snapshots from the vendor and distributes them.
//!
//! Every subscriber owns a bounded channel. Delivery never waits: a full
//! channel skips that subscriber for the cycle and a closed one is dropped,
//! so a slow or crashed consumer cannot hold back the others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tokio::time::MissedTickBehavior;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::time::now;
use heatkeeper_domain::update::Update;
use heatkeeper_domain::zone::ZoneState;

use crate::ports::ZoneController;

/// Identifies one subscription for [`Poller::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::Receiver<Arc<Update>>,
}

/// Cloneable trigger for an out-of-cycle poll.
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle(Arc<Notify>);

impl RefreshHandle {
    /// Ask the poller to poll now. Requests made while a poll is pending
    /// coalesce into one.
    pub fn refresh(&self) {
        self.0.notify_one();
    }
}

/// Periodic state poller.
pub struct Poller<C> {
    controller: C,
    capacity: usize,
    subscribers: Mutex<HashMap<SubscriptionId, mpsc::Sender<Arc<Update>>>>,
    next_id: AtomicU64,
    refresh: RefreshHandle,
}

impl<C: ZoneController> Poller<C> {
    /// Create a poller; each subscriber channel buffers up to `capacity` updates.
    pub fn new(controller: C, capacity: usize) -> Self {
        Self {
            controller,
            capacity: capacity.max(1),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            refresh: RefreshHandle::default(),
        }
    }

    /// Register a new subscriber. It receives every update polled from now on.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.lock_subscribers().insert(id, sender);
        Subscription { id, receiver }
    }

    /// Stop delivering to a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock_subscribers().remove(&id).is_some()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    /// Handle that forces an out-of-cycle poll when the poller is running.
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// Request an out-of-cycle poll.
    pub fn refresh(&self) {
        self.refresh.refresh();
    }

    /// Poll the vendor once and distribute the resulting snapshot.
    ///
    /// A zone whose state cannot be read is reported as
    /// [`ZoneState::Unknown`] rather than failing the whole cycle. The
    /// snapshot is stamped with the time the first vendor read started.
    ///
    /// # Errors
    ///
    /// Returns the vendor error if zones or presence cannot be listed.
    pub async fn poll(&self) -> Result<Arc<Update>, HeatKeeperError> {
        let started = now();
        let zones = self.controller.get_zones().await?;
        let users = self.controller.get_presence().await?;

        let mut builder = Update::builder().timestamp(started);
        for zone in zones {
            let state = match self.controller.get_zone_state(zone.id).await {
                Ok(state) => state,
                Err(err) => {
                    tracing::warn!(error = %err, zone_id = %zone.id, "failed to read zone state");
                    ZoneState::Unknown
                }
            };
            builder = builder.zone(zone, state);
        }
        for user in users {
            builder = builder.user(user);
        }

        let update = Arc::new(builder.build());
        self.distribute(&update);
        Ok(update)
    }

    fn distribute(&self, update: &Arc<Update>) {
        self.lock_subscribers()
            .retain(|id, sender| match sender.try_send(Arc::clone(update)) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscription = id.0, "subscriber is full, update skipped");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(subscription = id.0, "subscriber gone, removing");
                    false
                }
            });
    }

    /// Poll every `interval` (and on refresh) until `shutdown` changes.
    ///
    /// A failed cycle is logged and skipped; the next tick tries again.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = interval.as_secs(), "poller started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
                () = self.refresh.0.notified() => {
                    tracing::debug!("refresh requested");
                    ticker.reset();
                }
            }

            match self.poll().await {
                Ok(update) => tracing::debug!(
                    zones = update.zones().count(),
                    users = update.users().count(),
                    "update distributed"
                ),
                Err(err) => tracing::warn!(error = %err, "poll failed, skipping cycle"),
            }
        }
        tracing::info!("poller stopped");
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, HashMap<SubscriptionId, mpsc::Sender<Arc<Update>>>> {
        // A poisoned map is still structurally valid.
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
