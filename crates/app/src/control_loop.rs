//! Control loop: turns snapshots into scheduler calls.
//!
//! The loop is the only owner of the rule set and of the [`TaskScheduler`].
//! It serially consumes, in priority order: the shutdown signal, scheduler
//! events, new updates and report requests. Nothing else mutates the task
//! table.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use heatkeeper_domain::decision::{CandidateDecision, aggregate};
use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::id::ZoneId;
use heatkeeper_domain::report::{Report, ZoneReport};
use heatkeeper_domain::rule::{ZoneConfig, ZoneRules};
use heatkeeper_domain::update::Update;
use heatkeeper_domain::zone::ZoneState;

use crate::poller::RefreshHandle;
use crate::ports::{EventPublisher, ZoneController};
use crate::scheduler::{SchedulerEvent, TaskScheduler};

const REQUEST_CAPACITY: usize = 16;

/// Requests served by the control loop between updates.
#[derive(Debug)]
pub enum ControlRequest {
    Report(oneshot::Sender<Report>),
}

/// Cloneable client of a running [`ControlLoop`].
#[derive(Debug, Clone)]
pub struct ControlHandle {
    requests: mpsc::Sender<ControlRequest>,
    refresh: RefreshHandle,
}

impl ControlHandle {
    /// Snapshot of every controlled zone and its pending task.
    ///
    /// # Errors
    ///
    /// Returns [`HeatKeeperError::Unavailable`] once the loop has stopped.
    pub async fn report(&self) -> Result<Report, HeatKeeperError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(ControlRequest::Report(reply))
            .await
            .map_err(|_| HeatKeeperError::Unavailable)?;
        response.await.map_err(|_| HeatKeeperError::Unavailable)
    }

    /// Ask the poller for a fresh snapshot.
    pub fn refresh(&self) {
        self.refresh.refresh();
    }
}

#[derive(Debug, Clone)]
struct ZoneStatus {
    state: ZoneState,
    decision: String,
}

/// Single serialized consumer driving the scheduler.
pub struct ControlLoop<C, P> {
    zones: Vec<ZoneConfig>,
    /// `None` until the first snapshot with zones has been seen.
    rules: Option<Vec<ZoneRules>>,
    statuses: HashMap<ZoneId, ZoneStatus>,
    /// Indices of the rules that asked for each zone's scheduled target.
    proposers: HashMap<ZoneId, Vec<usize>>,
    scheduler: TaskScheduler<C, P>,
    scheduler_events: mpsc::UnboundedReceiver<SchedulerEvent>,
    requests: mpsc::Receiver<ControlRequest>,
}

impl<C, P> ControlLoop<C, P>
where
    C: ZoneController + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync,
{
    /// Build a loop for the given zone configurations.
    ///
    /// `refresh` is exposed through the returned handle so clients can force
    /// an out-of-cycle poll.
    pub fn new(
        zones: Vec<ZoneConfig>,
        controller: C,
        publisher: P,
        refresh: RefreshHandle,
    ) -> (Self, ControlHandle) {
        let (scheduler, scheduler_events) = TaskScheduler::new(controller, publisher);
        let (requests_tx, requests) = mpsc::channel(REQUEST_CAPACITY);
        let control = Self {
            zones,
            rules: None,
            statuses: HashMap::new(),
            proposers: HashMap::new(),
            scheduler,
            scheduler_events,
            requests,
        };
        let handle = ControlHandle {
            requests: requests_tx,
            refresh,
        };
        (control, handle)
    }

    /// Run until `shutdown` changes or the update stream ends.
    ///
    /// Every outstanding timer is cancelled before returning.
    pub async fn run(
        mut self,
        mut updates: mpsc::Receiver<Arc<Update>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(zones = self.zones.len(), "control loop started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                Some(event) = self.scheduler_events.recv() => self.scheduler.handle(event).await,
                update = updates.recv() => match update {
                    Some(update) => self.process_update(&update).await,
                    None => {
                        tracing::info!("update stream closed");
                        break;
                    }
                },
                Some(request) = self.requests.recv() => self.answer(request),
            }
        }
        self.scheduler.shutdown();
        tracing::info!("control loop stopped");
    }

    /// Evaluate every zone against `update` and schedule or cancel accordingly.
    pub async fn process_update(&mut self, update: &Update) {
        if self.rules.is_none() {
            if update.zones().next().is_none() {
                tracing::debug!("snapshot has no zones, rules not resolved yet");
                return;
            }
            self.rules = Some(self.resolve_rules(update));
        }
        let Some(rules) = &self.rules else {
            return;
        };

        for zone in rules {
            let state = update.zone_state(zone.zone_id);
            if update.zone(zone.zone_id).is_none() || matches!(state, ZoneState::Unknown) {
                tracing::debug!(zone = %zone.zone_name, "zone state unknown, skipping");
                continue;
            }
            if self
                .scheduler
                .settled_at(zone.zone_id)
                .is_some_and(|settled| update.timestamp() < settled)
            {
                tracing::debug!(zone = %zone.zone_name, "snapshot predates last mutation, skipping");
                continue;
            }

            let candidates = zone.candidates(update);
            let decision = aggregate(zone.zone_id, &candidates);
            tracing::debug!(zone = %zone.zone_name, %state, "{decision}");
            self.statuses.insert(
                zone.zone_id,
                ZoneStatus {
                    state,
                    decision: decision.to_string(),
                },
            );

            match decision.action {
                Some(action) if !action.target.is_reached_by(state) => {
                    let proposers = candidates
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| c.action.is_some_and(|a| a.target == action.target))
                        .map(|(index, _)| index)
                        .collect();
                    self.proposers.insert(zone.zone_id, proposers);
                    self.scheduler
                        .schedule(
                            zone.zone_id,
                            &zone.zone_name,
                            action.target,
                            action.delay,
                            &decision.reason,
                        )
                        .await;
                }
                _ => {
                    // Explain the cancellation with the rules that had asked
                    // for the pending target, not with every rule's verdict.
                    let reason = self
                        .proposers
                        .remove(&zone.zone_id)
                        .map(|proposers| reasons_of(&candidates, &proposers))
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| decision.reason.clone());
                    self.scheduler
                        .cancel_because(zone.zone_id, Some(&reason))
                        .await;
                }
            }
        }
    }

    fn resolve_rules(&self, update: &Update) -> Vec<ZoneRules> {
        self.zones
            .iter()
            .filter_map(|config| match config.resolve(update) {
                Ok(rules) => {
                    tracing::info!(zone = %rules.zone_name, zone_id = %rules.zone_id, rules = rules.rules.len(), "rules installed");
                    Some(rules)
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        zone = %config.zone,
                        "invalid rule configuration, zone excluded from control"
                    );
                    None
                }
            })
            .collect()
    }

    fn answer(&self, request: ControlRequest) {
        match request {
            ControlRequest::Report(reply) => {
                // The requester may have given up.
                let _ = reply.send(self.report());
            }
        }
    }

    /// Current view of every controlled zone.
    #[must_use]
    pub fn report(&self) -> Report {
        let zones = self
            .rules
            .iter()
            .flatten()
            .map(|zone| {
                let status = self.statuses.get(&zone.zone_id);
                ZoneReport {
                    zone_id: zone.zone_id,
                    zone_name: zone.zone_name.clone(),
                    state: status.map(|s| s.state).unwrap_or_default(),
                    decision: status.map_or_else(String::new, |s| s.decision.clone()),
                    scheduled: self.scheduler.get_scheduled(zone.zone_id).cloned(),
                }
            })
            .collect();
        Report { zones }
    }
}

fn reasons_of(candidates: &[CandidateDecision], indices: &[usize]) -> String {
    let reasons: BTreeSet<&str> = indices
        .iter()
        .filter_map(|&index| candidates.get(index))
        .map(|c| c.reason.as_str())
        .filter(|r| !r.is_empty())
        .collect();
    reasons.into_iter().collect::<Vec<_>>().join(", ")
}
