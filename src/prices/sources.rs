// src/prices/sources.rs
//! Live price tiers.
//!
//! Neither tier yields prices today: the authoritative API is an unfilled
//! extension point and the scrape tier only probes reachability. Both decline so
//! resolution falls through to the regional model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{MarketLocation, PriceLookup, PriceQuery, PriceTable};
use crate::resolve::{AttemptError, AttemptResult, SourceAttempt};

pub struct AuthoritativeApiAttempt {
    timeout: Duration,
}

impl AuthoritativeApiAttempt {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl SourceAttempt<PriceLookup> for AuthoritativeApiAttempt {
    fn name(&self) -> &str {
        "agmarknet-api"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        &self,
        _query: &PriceQuery,
        _context: &MarketLocation,
    ) -> Result<AttemptResult<PriceTable>, AttemptError> {
        Ok(AttemptResult::declined(
            "no authoritative price API is configured",
        ))
    }
}

/// Connectivity probe against the market site with an aggressive ceiling.
pub struct ScrapeProbeAttempt {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ScrapeProbeAttempt {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("kisan-mitra/0.1 (+mandi price probe)")
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("building scrape probe http client")?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SourceAttempt<PriceLookup> for ScrapeProbeAttempt {
    fn name(&self) -> &str {
        "agmarknet-scrape"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        &self,
        _query: &PriceQuery,
        context: &MarketLocation,
    ) -> Result<AttemptResult<PriceTable>, AttemptError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| match AttemptError::from(e) {
                AttemptError::Timeout { .. } => AttemptError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                },
                other => other,
            })?;
        let status = resp.status().as_u16();
        debug!(target: "resolve", url = %self.url, status, location = %context, "market site reachable");

        // TODO: parse the daily price report once the site's query form is mapped.
        Ok(AttemptResult::declined(format!(
            "{} reachable (HTTP {status}); price extraction not implemented",
            self.url
        )))
    }
}
