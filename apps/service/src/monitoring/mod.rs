pub mod probe;
/// Monitoring engine module - handles execution of reachability checks
///
/// This module is responsible for:
/// - Probing targets over HTTP/HTTPS with a bounded timeout
/// - Driving the per-target up/down state machine across ticks
/// - Coordinating with the metrics sink and notification channel
pub mod scheduler;
pub mod types;

pub use probe::HttpProbe;
pub use scheduler::{MonitorScheduler, SchedulerSettings};
