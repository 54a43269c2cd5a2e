//! Task scheduler: at most one pending, delayed state change per zone.
//!
//! The scheduler's table is owned by a single writer (the control loop).
//! Each waiting task has its own timer task; when it expires it does not
//! touch the table but sends [`SchedulerEvent::Fired`] back through the
//! channel returned by [`TaskScheduler::new`]. The owner feeds those events
//! to [`TaskScheduler::handle`], which checks the table before acting, so a
//! fire that raced with a cancellation or a replacement is discarded.
//!
//! Vendor calls run on their own short-lived task and report back with
//! [`SchedulerEvent::Completed`]. Failed calls are logged and not retried:
//! the next poll cycle re-derives the decision from fresh state.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use heatkeeper_domain::decision::TargetState;
use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::id::{TaskId, ZoneId};
use heatkeeper_domain::notification::{Notification, NotificationKind};
use heatkeeper_domain::task::ScheduledTask;
use heatkeeper_domain::time::{Timestamp, add_duration, now};
use heatkeeper_domain::zone::OFF_TEMPERATURE;

use crate::ports::{EventPublisher, ZoneController};

/// Messages from timer and execution tasks back to the table owner.
#[derive(Debug)]
pub enum SchedulerEvent {
    /// A timer expired.
    Fired { zone_id: ZoneId, task_id: TaskId },
    /// A vendor mutation finished.
    Completed {
        task: ScheduledTask,
        result: Result<(), HeatKeeperError>,
    },
}

/// What [`TaskScheduler::schedule`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A timer was started.
    Queued,
    /// Zero delay: the vendor mutation was started right away.
    Executing,
    /// An equivalent task that fires no later is already pending.
    Unchanged,
}

#[derive(Debug)]
enum Phase {
    Waiting {
        deadline: Instant,
        timer: JoinHandle<()>,
    },
    /// Fired; the vendor call is in flight and can no longer be cancelled.
    Executing,
}

#[derive(Debug)]
struct Entry {
    task: ScheduledTask,
    phase: Phase,
}

/// Longest timer ever armed. Larger delays wait this long instead.
const MAX_DELAY: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(delay: Duration) -> Instant {
    Instant::now() + delay.min(MAX_DELAY)
}

/// Per-zone delayed-action scheduler.
pub struct TaskScheduler<C, P> {
    controller: C,
    publisher: P,
    tasks: HashMap<ZoneId, Entry>,
    /// When the last successful mutation of each zone completed.
    settled: HashMap<ZoneId, Timestamp>,
    events: mpsc::UnboundedSender<SchedulerEvent>,
}

impl<C, P> TaskScheduler<C, P>
where
    C: ZoneController + Clone + Send + Sync + 'static,
    P: EventPublisher,
{
    /// Create a scheduler and the channel its timers and executions report on.
    ///
    /// Every event received on the returned channel must be passed to
    /// [`handle`](Self::handle).
    pub fn new(controller: C, publisher: P) -> (Self, mpsc::UnboundedReceiver<SchedulerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            controller,
            publisher,
            tasks: HashMap::new(),
            settled: HashMap::new(),
            events,
        };
        (scheduler, receiver)
    }

    /// Schedule `target` for `zone_id` after `delay`.
    ///
    /// A pending task with the same target that fires no later than the new
    /// request is kept as is. Anything else replaces the pending task. A zero
    /// delay starts the vendor mutation immediately. Delays beyond thirty
    /// years are shortened to that.
    #[tracing::instrument(skip(self, zone_name, reason), fields(zone = zone_name))]
    pub async fn schedule(
        &mut self,
        zone_id: ZoneId,
        zone_name: &str,
        target: TargetState,
        delay: Duration,
        reason: &str,
    ) -> ScheduleOutcome {
        let deadline = deadline_after(delay);

        if let Some(entry) = self.tasks.get(&zone_id) {
            if entry.task.target == target {
                match &entry.phase {
                    Phase::Executing => return ScheduleOutcome::Unchanged,
                    Phase::Waiting { deadline: current, .. } if deadline >= *current => {
                        return ScheduleOutcome::Unchanged;
                    }
                    Phase::Waiting { .. } => {}
                }
            }
            tracing::debug!(previous = %entry.task.id, "superseding pending task");
        }
        self.remove_pending(zone_id);

        let task = ScheduledTask {
            id: TaskId::new(),
            zone_id,
            zone_name: zone_name.to_string(),
            target,
            activation: add_duration(now(), delay),
            reason: reason.to_string(),
        };

        if delay.is_zero() {
            tracing::info!(task_id = %task.id, %target, "executing immediately");
            self.spawn_execution(task.clone());
            self.tasks.insert(
                zone_id,
                Entry {
                    task,
                    phase: Phase::Executing,
                },
            );
            return ScheduleOutcome::Executing;
        }

        let timer = self.spawn_timer(zone_id, task.id, deadline);
        tracing::info!(task_id = %task.id, %target, delay_secs = delay.as_secs(), "task queued");
        self.notify(Notification::new(
            NotificationKind::Queued,
            zone_id,
            zone_name,
            target,
            Some(delay),
            reason,
        ))
        .await;
        self.tasks.insert(
            zone_id,
            Entry {
                task,
                phase: Phase::Waiting { deadline, timer },
            },
        );
        ScheduleOutcome::Queued
    }

    /// Cancel the pending task of `zone_id`, if any.
    ///
    /// Returns `true` when a waiting task was cancelled. Once this returns,
    /// that task will not execute. Tasks already executing are left alone.
    pub async fn cancel(&mut self, zone_id: ZoneId) -> bool {
        self.cancel_because(zone_id, None).await
    }

    /// Like [`cancel`](Self::cancel), reporting `reason` in the notification
    /// instead of the task's own reason.
    pub async fn cancel_because(&mut self, zone_id: ZoneId, reason: Option<&str>) -> bool {
        if !matches!(
            self.tasks.get(&zone_id),
            Some(Entry {
                phase: Phase::Waiting { .. },
                ..
            })
        ) {
            return false;
        }
        let Some(task) = self.remove_pending(zone_id) else {
            return false;
        };

        tracing::info!(zone = %task.zone_name, task_id = %task.id, "task cancelled");
        self.notify(Notification::new(
            NotificationKind::Cancelled,
            zone_id,
            &task.zone_name,
            task.target,
            None,
            reason.unwrap_or(&task.reason),
        ))
        .await;
        true
    }

    /// Process an event received on the scheduler channel.
    pub async fn handle(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Fired { zone_id, task_id } => self.on_fired(zone_id, task_id),
            SchedulerEvent::Completed { task, result } => self.on_completed(task, result).await,
        }
    }

    fn on_fired(&mut self, zone_id: ZoneId, task_id: TaskId) {
        let Some(entry) = self.tasks.get_mut(&zone_id) else {
            tracing::debug!(%zone_id, %task_id, "stale timer: zone has no task");
            return;
        };
        if entry.task.id != task_id || matches!(entry.phase, Phase::Executing) {
            tracing::debug!(%zone_id, %task_id, "stale timer: task was replaced");
            return;
        }
        entry.phase = Phase::Executing;
        let task = entry.task.clone();
        self.spawn_execution(task);
    }

    async fn on_completed(&mut self, task: ScheduledTask, result: Result<(), HeatKeeperError>) {
        let current = self
            .tasks
            .get(&task.zone_id)
            .is_some_and(|entry| entry.task.id == task.id);
        if current {
            self.tasks.remove(&task.zone_id);
        }

        match result {
            Ok(()) => {
                self.settled.insert(task.zone_id, now());
                tracing::info!(zone = %task.zone_name, task_id = %task.id, target = %task.target, "task executed");
                self.notify(Notification::new(
                    NotificationKind::Executed,
                    task.zone_id,
                    &task.zone_name,
                    task.target,
                    None,
                    &task.reason,
                ))
                .await;
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    zone = %task.zone_name,
                    task_id = %task.id,
                    target = %task.target,
                    "task execution failed, will re-evaluate on next update"
                );
            }
        }
    }

    /// The pending or executing task of a zone.
    #[must_use]
    pub fn get_scheduled(&self, zone_id: ZoneId) -> Option<&ScheduledTask> {
        self.tasks.get(&zone_id).map(|entry| &entry.task)
    }

    /// Every pending or executing task, soonest first.
    #[must_use]
    pub fn scheduled(&self) -> Vec<ScheduledTask> {
        let mut tasks: Vec<_> = self.tasks.values().map(|e| e.task.clone()).collect();
        tasks.sort_by_key(|t| t.activation);
        tasks
    }

    /// When a mutation of `zone_id` last succeeded.
    ///
    /// Snapshots taken before that instant may not reflect the mutation yet.
    #[must_use]
    pub fn settled_at(&self, zone_id: ZoneId) -> Option<Timestamp> {
        self.settled.get(&zone_id).copied()
    }

    /// Number of pending or executing tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is pending or executing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every timer and forget all tasks. In-flight vendor calls finish
    /// on their own but their completion is never processed.
    pub fn shutdown(&mut self) {
        let count = self.tasks.len();
        for (_, entry) in self.tasks.drain() {
            if let Phase::Waiting { timer, .. } = entry.phase {
                timer.abort();
            }
        }
        tracing::debug!(count, "scheduler stopped");
    }

    fn remove_pending(&mut self, zone_id: ZoneId) -> Option<ScheduledTask> {
        let entry = self.tasks.remove(&zone_id)?;
        if let Phase::Waiting { timer, .. } = entry.phase {
            timer.abort();
        }
        Some(entry.task)
    }

    fn spawn_timer(&self, zone_id: ZoneId, task_id: TaskId, deadline: Instant) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = events.send(SchedulerEvent::Fired { zone_id, task_id });
        })
    }

    fn spawn_execution(&self, task: ScheduledTask) {
        let controller = self.controller.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = apply(&controller, task.zone_id, task.target).await;
            // Closed only after shutdown, when nobody cares anymore.
            let _ = events.send(SchedulerEvent::Completed { task, result });
        });
    }

    async fn notify(&self, notification: Notification) {
        if let Err(err) = self.publisher.publish(notification).await {
            tracing::warn!(error = %err, "failed to publish notification");
        }
    }
}

impl<C, P> Drop for TaskScheduler<C, P> {
    fn drop(&mut self) {
        for entry in self.tasks.values() {
            if let Phase::Waiting { timer, .. } = &entry.phase {
                timer.abort();
            }
        }
    }
}

/// Translate a target state into the matching vendor mutation.
async fn apply<C: ZoneController>(
    controller: &C,
    zone_id: ZoneId,
    target: TargetState,
) -> Result<(), HeatKeeperError> {
    match target {
        TargetState::Off => controller.set_overlay(zone_id, OFF_TEMPERATURE, None).await,
        TargetState::Auto => controller.delete_overlay(zone_id).await,
    }
}
