use anyhow::{Context, Result, bail};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Durable store for probe outcomes.
///
/// Writes are fire-and-forget from the engine's perspective: at most one
/// attempt per outcome, and the scheduler logs and drops failures without
/// letting them touch monitoring control flow.
#[async_trait::async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, target: &str, success: bool, at: SystemTime) -> Result<()>;
}

/// InfluxDB sink speaking the v1 line protocol over HTTP
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
}

impl InfluxSink {
    pub fn new(url: &str, database: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            write_url: format!("{}/write?db={}", url.trim_end_matches('/'), database),
        }
    }
}

#[async_trait::async_trait]
impl MetricsSink for InfluxSink {
    async fn record(&self, target: &str, success: bool, at: SystemTime) -> Result<()> {
        let line = line_protocol(target, success, at);

        let response = self
            .client
            .post(&self.write_url)
            .body(line)
            .send()
            .await
            .context("influx write request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("influx write rejected with status {}", status.as_u16());
        }

        Ok(())
    }
}

/// Sink used in dev mode; points are dropped instead of written
pub struct NoopSink;

#[async_trait::async_trait]
impl MetricsSink for NoopSink {
    async fn record(&self, target: &str, success: bool, _at: SystemTime) -> Result<()> {
        debug!(site = %target, success, "dev mode, dropping metric point");
        Ok(())
    }
}

/// Render one `uptime` measurement point in line protocol
fn line_protocol(target: &str, success: bool, at: SystemTime) -> String {
    let (status_name, status, status_number) =
        if success { ("success", true, 1) } else { ("failure", false, 0) };
    let nanos = at.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();

    format!(
        "uptime,target={} status_name=\"{}\",status={},status_number={}i,site_name=\"{}\" {}",
        escape_tag_value(target),
        status_name,
        status,
        status_number,
        escape_field_value(target),
        nanos,
    )
}

/// Tag values escape commas, equals signs and spaces
fn escape_tag_value(value: &str) -> String {
    value.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

/// String field values escape backslashes and double quotes
fn escape_field_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
