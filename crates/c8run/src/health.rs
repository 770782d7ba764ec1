//! Bounded-retry readiness polling used to sequence dependent services.

use anyhow::{Result, bail};
use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use c8run_core::{HealthCheckSpec, LauncherError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Source of HTTP status codes for a readiness URL
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Status code of a GET against `url`; connection failures are errors
    async fn status(&self, url: &str) -> Result<u16>;
}

/// Statuses in [200, 400) mean ready
pub fn is_healthy(status: u16) -> bool {
    (200..400).contains(&status)
}

/// `HealthProbe` backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        // No overall request timeout: the cluster health endpoint holds the
        // request open until its own server-side timeout
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn status(&self, url: &str) -> Result<u16> {
        let response = self.client.get(url).send().await?;
        Ok(response.status().as_u16())
    }
}

pub struct HealthGate<P> {
    probe: P,
}

impl<P: HealthProbe> HealthGate<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Poll `spec.url` until it reports ready or `spec.max_attempts()` polls
    /// have failed. Returns the number of attempts used.
    pub async fn wait(&self, spec: &HealthCheckSpec) -> Result<u32, LauncherError> {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let probe = &self.probe;

        let backoff = ConstantBuilder::default()
            .with_delay(spec.retry_interval)
            .with_max_times(spec.max_retries as usize);

        let result = (move || Self::attempt(probe, spec, attempts))
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .notify(|err: &anyhow::Error, dur: Duration| {
                debug!(
                    service = %spec.name,
                    error = %err,
                    "Not ready yet, retrying in {:?}", dur
                );
            })
            .await;

        let used = counter.load(Ordering::Relaxed);
        match result {
            Ok(()) => {
                debug!(service = %spec.name, attempts = used, "Health check passed");
                Ok(used)
            }
            Err(e) => {
                debug!(
                    service = %spec.name,
                    attempts = used,
                    budget = spec.max_attempts(),
                    error = %e,
                    "Health check budget exhausted"
                );
                Err(LauncherError::ServiceUnhealthy {
                    name: spec.name.clone(),
                    attempts: used,
                })
            }
        }
    }

    async fn attempt(probe: &P, spec: &HealthCheckSpec, counter: &AtomicU32) -> Result<()> {
        let attempt = counter.fetch_add(1, Ordering::Relaxed);
        info!(
            "Waiting for {} to start. {} retries left",
            spec.name,
            spec.max_retries.saturating_sub(attempt)
        );

        let status = probe.status(&spec.url).await?;
        if !is_healthy(status) {
            bail!("{} answered with status {status}", spec.url);
        }
        Ok(())
    }
}
