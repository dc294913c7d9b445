use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::probe::{ReachabilityProbe, check_reachable};
use super::types::{ProbeOutcome, TargetState, TargetStatus};
use crate::notify::NotificationChannel;
use crate::registry::TargetRegistry;
use crate::sink::MetricsSink;

/// Tunables for the per-target state machine
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Hard wall-time bound for a single probe
    pub probe_timeout: Duration,

    /// Consecutive successful ticks before a sustained-uptime heartbeat
    /// fires. 0 disables the heartbeat.
    pub sustained_threshold_ticks: u32,

    /// Re-alert cadence while a target stays down: 1 alerts every tick,
    /// 0 alerts only on the up-to-down transition.
    pub realert_every_ticks: u32,

    /// Mention string prepended to down alerts (e.g. a Slack handle)
    pub mention: String,
}

/// Runs one monitoring pass over the registry snapshot and carries
/// per-target state between passes.
///
/// Probes within a pass fan out concurrently, each bounded by the probe
/// timeout, so one slow target never delays the others. Outcomes are then
/// interpreted sequentially against the state map.
pub struct MonitorScheduler {
    registry: Arc<TargetRegistry>,
    probe: Arc<dyn ReachabilityProbe>,
    sink: Arc<dyn MetricsSink>,
    channel: Arc<dyn NotificationChannel>,
    settings: SchedulerSettings,
    states: Mutex<HashMap<String, TargetState>>,
    // at most one periodic tick in flight
    tick_guard: Mutex<()>,
}

impl MonitorScheduler {
    pub fn new(
        registry: Arc<TargetRegistry>,
        probe: Arc<dyn ReachabilityProbe>,
        sink: Arc<dyn MetricsSink>,
        channel: Arc<dyn NotificationChannel>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            registry,
            probe,
            sink,
            channel,
            settings,
            states: Mutex::new(HashMap::new()),
            tick_guard: Mutex::new(()),
        }
    }

    /// One periodic monitoring pass. Skipped with a warning if the previous
    /// pass is still running.
    pub async fn tick(&self) {
        let Ok(_running) = self.tick_guard.try_lock() else {
            warn!("previous tick still running, skipping this one");
            return;
        };

        let targets = self.registry.list().await;
        if targets.is_empty() {
            debug!("no targets registered, nothing to probe");
            self.states.lock().await.clear();
            return;
        }

        debug!(count = targets.len(), "starting monitoring tick");
        let outcomes = self.probe_all(&targets).await;

        let mut states = self.states.lock().await;
        for outcome in &outcomes {
            let state = states.entry(outcome.target.clone()).or_default();
            let notice = interpret(state, outcome, &self.settings);

            self.record(outcome).await;
            if let Some(message) = notice {
                self.send(&message).await;
            }
        }

        // Drop state for targets removed since the snapshot was taken
        states.retain(|target, _| targets.iter().any(|t| t == target));
    }

    /// On-demand pass requested by the operator.
    ///
    /// Every target is acknowledged through the notification channel,
    /// reachable or not, and the periodic state machine is neither read nor
    /// mutated.
    pub async fn check_now(&self) {
        let targets = self.registry.list().await;
        if targets.is_empty() {
            self.send("There are no targets to check. Add one first.").await;
            return;
        }

        info!(count = targets.len(), "running on-demand check");
        let outcomes = self.probe_all(&targets).await;

        for outcome in &outcomes {
            self.record(outcome).await;

            let message = if outcome.reachable {
                format!("{} is online: {}", outcome.target, format_time(outcome.observed_at))
            } else {
                down_alert(&self.settings.mention, &outcome.target, outcome.observed_at)
            };
            self.send(&message).await;
        }
    }

    async fn probe_all(&self, targets: &[String]) -> Vec<ProbeOutcome> {
        join_all(targets.iter().map(|target| {
            check_reachable(self.probe.as_ref(), target, self.settings.probe_timeout)
        }))
        .await
    }

    async fn record(&self, outcome: &ProbeOutcome) {
        if let Err(cause) =
            self.sink.record(&outcome.target, outcome.reachable, outcome.observed_at).await
        {
            error!(site = %outcome.target, %cause, "failed to record probe outcome");
        }
    }

    async fn send(&self, message: &str) {
        if let Err(cause) = self.channel.notify(message).await {
            warn!(%cause, "failed to deliver notification");
        }
    }
}

/// Apply one outcome to a target's state, returning the notification to
/// emit, if any.
fn interpret(
    state: &mut TargetState,
    outcome: &ProbeOutcome,
    settings: &SchedulerSettings,
) -> Option<String> {
    if outcome.reachable {
        interpret_success(state, outcome, settings)
    } else {
        interpret_failure(state, outcome, settings)
    }
}

fn interpret_success(
    state: &mut TargetState,
    outcome: &ProbeOutcome,
    settings: &SchedulerSettings,
) -> Option<String> {
    let previous = state.status;
    state.status = TargetStatus::Up;
    state.ticks_down = 0;

    match previous {
        TargetStatus::Up => {
            state.consecutive_successes += 1;
            let threshold = settings.sustained_threshold_ticks;
            if threshold > 0 && state.consecutive_successes >= threshold {
                state.consecutive_successes = 0;
                return Some(format!(
                    "{} has been up for {} consecutive checks",
                    outcome.target, threshold
                ));
            }
            None
        }
        TargetStatus::Down => {
            state.consecutive_successes = 1;
            Some(format!(
                "{} is back online: {}",
                outcome.target,
                format_time(outcome.observed_at)
            ))
        }
        TargetStatus::Unknown => {
            state.consecutive_successes = 1;
            Some(format!("{} is online: {}", outcome.target, format_time(outcome.observed_at)))
        }
    }
}

fn interpret_failure(
    state: &mut TargetState,
    outcome: &ProbeOutcome,
    settings: &SchedulerSettings,
) -> Option<String> {
    let transitioned = state.status != TargetStatus::Down;
    state.status = TargetStatus::Down;
    state.consecutive_successes = 0;

    if transitioned {
        state.ticks_down = 1;
    } else {
        state.ticks_down = state.ticks_down.saturating_add(1);
    }

    let realert = settings.realert_every_ticks;
    let due = transitioned || (realert > 0 && (state.ticks_down - 1) % realert == 0);

    due.then(|| down_alert(&settings.mention, &outcome.target, outcome.observed_at))
}

fn down_alert(mention: &str, target: &str, at: SystemTime) -> String {
    let prefix = if mention.is_empty() { String::new() } else { format!("{mention} ") };
    format!("{prefix}{target} is offline: {}. You should find out why", format_time(at))
}

fn format_time(at: SystemTime) -> String {
    DateTime::<Utc>::from(at).format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
