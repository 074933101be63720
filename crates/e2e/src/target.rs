//! Target reachability - an optional preflight before any scenario runs

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Probe settings for the site under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Number of requests before giving up
    pub attempts: usize,

    /// Pause between attempts
    pub interval_ms: u64,

    /// Per-request timeout
    pub request_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval_ms: 1000,
            request_timeout_ms: 5000,
        }
    }
}

/// Checks that the form page answers HTTP at all
pub struct TargetProbe {
    client: reqwest::Client,
    config: ProbeConfig,
}

impl TargetProbe {
    pub fn new(config: ProbeConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    /// Wait until `url` returns any HTTP response
    ///
    /// Non-2xx statuses still count: the page exists and the browser will
    /// show whatever it serves.
    pub async fn wait_until_reachable(&self, url: &str) -> E2eResult<()> {
        let attempts = self.config.attempts.max(1);

        for attempt in 1..=attempts {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        warn!("Target {} answered {}", url, resp.status());
                    }
                    info!("Target reachable at {}", url);
                    return Ok(());
                }
                Err(e) => {
                    if attempt == 1 {
                        info!("Waiting for target {}...", url);
                    }
                    if !e.is_connect() {
                        warn!("Probe error: {}", e);
                    }
                }
            }

            if attempt < attempts {
                sleep(Duration::from_millis(self.config.interval_ms)).await;
            }
        }

        Err(E2eError::TargetUnreachable {
            url: url.to_string(),
            attempts,
        })
    }
}
