//! API clients for external services.

pub mod unleash;

use crate::types::{DefiPortfolio, MetricName, MetricValue, TokenPage, WalletIdentity};
use crate::Result;

pub use unleash::UnleashClient;

/// The metric-fetch capability the scoring engine consumes.
///
/// Keeping this a trait hides every transport concern (URLs, headers,
/// API-key rotation) from the engine and lets tests substitute scripted
/// sources.
#[async_trait::async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch a single named metric for a wallet.
    async fn fetch_metric(
        &self,
        identity: &WalletIdentity,
        metric: MetricName,
        currency: &str,
    ) -> Result<MetricValue>;

    /// Fetch one page of fungible token balances.
    async fn fetch_token_page(
        &self,
        identity: &WalletIdentity,
        offset: u32,
        limit: u32,
    ) -> Result<TokenPage>;

    /// Fetch one page of active DeFi positions.
    async fn fetch_defi_portfolio(
        &self,
        identity: &WalletIdentity,
        offset: u32,
        limit: u32,
    ) -> Result<DefiPortfolio>;
}
