use anyhow::{Result, anyhow};
use std::time::{Duration, SystemTime};
use tracing::debug;

use super::types::ProbeOutcome;

/// Reachability probe for a single target
#[async_trait::async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Attempt to reach the target. `Ok(())` means reachable; the error
    /// carries the transport diagnostic (DNS, refused, TLS, bad status).
    async fn probe(&self, target: &str) -> Result<()>;
}

/// HTTP/HTTPS probe
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self, target: &str) -> Result<()> {
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        let status = response.status();

        // Consider 2xx and 3xx as reachable
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(anyhow!("HTTP probe failed with status code: {}", status.as_u16()))
        }
    }
}

/// Run one probe with a hard upper bound on wall time.
///
/// Network-level failures are not errors from the engine's point of view;
/// they all collapse into `reachable = false`. A probe still running at the
/// deadline is dropped, which cancels the underlying request.
pub async fn check_reachable(
    probe: &dyn ReachabilityProbe,
    target: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let reachable = match tokio::time::timeout(timeout, probe.probe(target)).await {
        Ok(Ok(())) => true,
        Ok(Err(cause)) => {
            debug!(site = %target, %cause, "probe failed");
            false
        }
        Err(_) => {
            debug!(site = %target, timeout_ms = timeout.as_millis() as u64, "probe timed out");
            false
        }
    };

    ProbeOutcome { target: target.to_string(), reachable, observed_at: SystemTime::now() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct HangingProbe;

    #[async_trait::async_trait]
    impl ReachabilityProbe for HangingProbe {
        async fn probe(&self, _target: &str) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    struct RefusingProbe;

    #[async_trait::async_trait]
    impl ReachabilityProbe for RefusingProbe {
        async fn probe(&self, _target: &str) -> Result<()> {
            Err(anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn hanging_probe_is_unreachable_within_timeout() {
        let start = Instant::now();
        let outcome =
            check_reachable(&HangingProbe, "http://a.test", Duration::from_millis(100)).await;

        assert!(!outcome.reachable);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn transport_error_is_unreachable_not_a_panic() {
        let outcome =
            check_reachable(&RefusingProbe, "http://a.test", Duration::from_secs(1)).await;

        assert!(!outcome.reachable);
        assert_eq!(outcome.target, "http://a.test");
    }
}
