//! UnleashNFTs analytics API client.
//!
//! Implements [`MetricSource`] over the public REST API. Requests are
//! authenticated with an `x-api-key` header drawn from a round-robin ring
//! of configured keys so that quota is spread evenly across them.

use crate::api::MetricSource;
use crate::config::ApiConfig;
use crate::types::{
    DefiPortfolio, MetricGroup, MetricName, MetricValue, MetricsResponse, ReputationResponse,
    TokenPage, WalletIdentity,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

/// Analytics API client for wallet metrics, token balances, and DeFi
/// positions.
pub struct UnleashClient {
    base_url: String,
    api_keys: Vec<String>,
    /// Cursor into `api_keys` for round-robin selection.
    key_cursor: AtomicUsize,
    http_client: reqwest::Client,
}

impl UnleashClient {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.unleashnfts.com/api/v1";

    pub fn new(base_url: Option<String>, api_keys: Vec<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .connect_timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            api_keys,
            key_cursor: AtomicUsize::new(0),
            http_client,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(Some(config.base_url.clone()), config.api_keys.clone())
    }

    /// Next API key in the ring, if any are configured.
    fn next_key(&self) -> Option<&str> {
        if self.api_keys.is_empty() {
            return None;
        }
        let index = self.key_cursor.fetch_add(1, Ordering::Relaxed) % self.api_keys.len();
        Some(self.api_keys[index].as_str())
    }

    /// Execute a GET and decode the JSON body.
    ///
    /// Non-success statuses are classified into the error taxonomy, carrying
    /// the upstream `message` field when the error body has one.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut request = self
            .http_client
            .get(url)
            .header("accept", "application/json")
            .query(query);
        if let Some(key) = self.next_key() {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                });
            warn!(status = %status, url = url, "Analytics API request failed");
            return Err(Error::from_status(status.as_u16(), message));
        }

        Ok(response.json::<T>().await?)
    }

    async fn fetch_portfolio_metric(
        &self,
        identity: &WalletIdentity,
        metric: MetricName,
        currency: &str,
    ) -> Result<MetricValue> {
        let url = format!("{}/wallet/{}/metrics", self.base_url, identity.address);
        let query = [
            ("blockchain", identity.chain_id.to_string()),
            ("currency", currency.to_string()),
            ("metrics", metric.api_name().to_string()),
            ("time_range", "all".to_string()),
            ("include_washtrade", "true".to_string()),
        ];
        let response: MetricsResponse = self.get_json(&url, &query).await?;
        Ok(metric_or_zero(&response.metric_values, metric))
    }

    async fn fetch_reputation_metric(
        &self,
        identity: &WalletIdentity,
        metric: MetricName,
    ) -> Result<MetricValue> {
        let url = format!(
            "{}/wallet/{}/{}/score/reputation",
            self.base_url, identity.chain_id, identity.address
        );
        let query = [("metrics", metric.api_name().to_string())];
        let response: ReputationResponse = self.get_json(&url, &query).await?;
        Ok(metric_or_zero(&response.wallet.metric_values, metric))
    }
}

/// Look up a metric in a successful response.
///
/// The API omits metrics it has no data for; a missing key reads as a
/// zero value, not a failure, so the fetch sequence continues.
fn metric_or_zero(values: &HashMap<String, MetricValue>, metric: MetricName) -> MetricValue {
    values
        .get(metric.api_name())
        .cloned()
        .unwrap_or_else(|| MetricValue {
            value: 0.0,
            unit: String::new(),
        })
}

#[async_trait::async_trait]
impl MetricSource for UnleashClient {
    async fn fetch_metric(
        &self,
        identity: &WalletIdentity,
        metric: MetricName,
        currency: &str,
    ) -> Result<MetricValue> {
        debug!(wallet = %identity, metric = %metric, "Fetching metric");
        match metric.group() {
            MetricGroup::Portfolio => self.fetch_portfolio_metric(identity, metric, currency).await,
            _ => self.fetch_reputation_metric(identity, metric).await,
        }
    }

    async fn fetch_token_page(
        &self,
        identity: &WalletIdentity,
        offset: u32,
        limit: u32,
    ) -> Result<TokenPage> {
        let url = format!("{}/wallet/balance/token", self.base_url);
        let query = [
            ("blockchain", identity.chain_id.to_string()),
            ("address", identity.address.clone()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        debug!(wallet = %identity, offset, limit, "Fetching token balances");
        self.get_json(&url, &query).await
    }

    async fn fetch_defi_portfolio(
        &self,
        identity: &WalletIdentity,
        offset: u32,
        limit: u32,
    ) -> Result<DefiPortfolio> {
        let url = format!("{}/wallet/balance/defi", self.base_url);
        let query = [
            ("blockchain", identity.chain_id.to_string()),
            ("address", identity.address.clone()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        debug!(wallet = %identity, offset, limit, "Fetching DeFi positions");
        self.get_json(&url, &query).await
    }
}
