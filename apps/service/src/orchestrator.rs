use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::config::Config;
use crate::error::CommandError;
use crate::monitoring::{HttpProbe, MonitorScheduler, SchedulerSettings};
use crate::notify::{LogChannel, NotificationChannel, SlackWebhookChannel};
use crate::registry::TargetRegistry;
use crate::sink::{InfluxSink, MetricsSink, NoopSink};
use crate::validation::validate_http_endpoint;

/// Main orchestrator for the vakt service.
///
/// Owns the target registry and the scheduler, wires the probe, sink and
/// notification channel from configuration, and exposes the command API
/// consumed by chat adapters.
pub struct Orchestrator {
    config: Arc<Config>,
    registry: Arc<TargetRegistry>,
    scheduler: Arc<MonitorScheduler>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let registry = Arc::new(TargetRegistry::new(config.monitor.sites.clone()));

        let probe =
            Arc::new(HttpProbe::new(Duration::from_secs(config.monitor.timeout_seconds))?);

        let sink: Arc<dyn MetricsSink> = if config.monitor.dev_mode {
            info!("dev mode, metric points will not be written");
            Arc::new(NoopSink)
        } else {
            Arc::new(InfluxSink::new(&config.influx.url, &config.influx.database))
        };

        let channel: Arc<dyn NotificationChannel> = if config.notify.webhook_url.is_empty() {
            info!("no webhook configured, notifications go to the log");
            Arc::new(LogChannel)
        } else {
            Arc::new(SlackWebhookChannel::new(config.notify.webhook_url.clone()))
        };

        let settings = SchedulerSettings {
            probe_timeout: Duration::from_secs(config.monitor.timeout_seconds),
            sustained_threshold_ticks: config.monitor.sustained_threshold_ticks,
            realert_every_ticks: config.monitor.realert_every_ticks,
            mention: config.notify.mention.clone(),
        };
        let scheduler =
            Arc::new(MonitorScheduler::new(registry.clone(), probe, sink, channel, settings));

        Ok(Self { config, registry, scheduler })
    }

    /// Snapshot of the monitored targets, in insertion order
    pub async fn list_targets(&self) -> Vec<String> {
        self.registry.list().await
    }

    /// Add a target. `Ok(false)` means it was already monitored.
    pub async fn add_target(&self, url: &str) -> Result<bool, CommandError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CommandError::MissingTarget);
        }

        let validation = validate_http_endpoint(url);
        if !validation.is_valid {
            return Err(CommandError::InvalidTarget {
                target: url.to_string(),
                reason: validation.error.unwrap_or_else(|| "validation failed".to_string()),
            });
        }

        Ok(self.registry.add(url).await)
    }

    /// Remove a target. `Ok(false)` means it was not monitored.
    pub async fn remove_target(&self, url: &str) -> Result<bool, CommandError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CommandError::MissingTarget);
        }

        Ok(self.registry.remove(url).await)
    }

    /// On-demand check across all targets; results surface through the
    /// notification channel.
    pub async fn run_check_now(&self) {
        self.scheduler.check_now().await;
    }

    /// Run the periodic monitoring loop. Does not return under normal
    /// operation.
    pub async fn run(&self) -> Result<()> {
        let period = Duration::from_secs(self.config.monitor.interval_seconds);
        info!(
            interval_seconds = self.config.monitor.interval_seconds,
            targets = self.registry.list().await.len(),
            "starting monitoring loop"
        );

        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            self.scheduler.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_orchestrator(sites: &[&str]) -> Orchestrator {
        let mut config = Config::default();
        config.monitor.dev_mode = true;
        config.monitor.sites = sites.iter().map(|s| s.to_string()).collect();
        Orchestrator::new(config).unwrap()
    }

    #[tokio::test]
    async fn seeded_targets_are_listed_and_mutable() {
        let orchestrator = dev_orchestrator(&["http://a.test", "http://b.test"]);

        assert!(orchestrator.add_target("http://c.test").await.unwrap());
        assert_eq!(
            orchestrator.list_targets().await,
            vec!["http://a.test", "http://b.test", "http://c.test"]
        );

        assert!(orchestrator.remove_target("http://b.test").await.unwrap());
        assert_eq!(orchestrator.list_targets().await, vec!["http://a.test", "http://c.test"]);
    }

    #[tokio::test]
    async fn duplicate_add_reports_false() {
        let orchestrator = dev_orchestrator(&["http://a.test"]);

        assert!(!orchestrator.add_target("http://a.test").await.unwrap());
        assert_eq!(orchestrator.list_targets().await, vec!["http://a.test"]);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_not_a_crash() {
        let orchestrator = dev_orchestrator(&[]);

        assert!(matches!(
            orchestrator.add_target("   ").await,
            Err(CommandError::MissingTarget)
        ));
        assert!(matches!(
            orchestrator.remove_target("").await,
            Err(CommandError::MissingTarget)
        ));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_with_reason() {
        let orchestrator = dev_orchestrator(&[]);

        let error = orchestrator.add_target("not-a-url").await.unwrap_err();
        assert!(matches!(error, CommandError::InvalidTarget { .. }));
        assert!(orchestrator.list_targets().await.is_empty());
    }
}
