//! Shared types for the wallet credit scoring system.
//!
//! Wire payload structs mirror the UnleashNFTs API response shapes
//! field-for-field.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A wallet scoped to a specific chain.
///
/// Equality on the full (address, chain id) pair drives the session's
/// duplicate-submission guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletIdentity {
    pub address: String,
    pub chain_id: u32,
}

impl WalletIdentity {
    pub fn new(address: impl Into<String>, chain_id: u32) -> Self {
        Self {
            address: address.into(),
            chain_id,
        }
    }

    /// Abbreviated address for display: `0x1234...abcd`.
    ///
    /// Counts characters, not bytes, so addresses containing multi-byte
    /// characters abbreviate instead of panicking mid-character.
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 10 {
            return self.address.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.chain_id)
    }
}

/// Chain ids supported by the analytics API.
pub mod chains {
    pub const ETHEREUM: u32 = 1;
    pub const BSC: u32 = 56;
    pub const POLYGON: u32 = 137;
    pub const SOLANA: u32 = 900;
    pub const BITCOIN: u32 = 8086;

    pub fn name(chain_id: u32) -> Option<&'static str> {
        match chain_id {
            ETHEREUM => Some("Ethereum"),
            BSC => Some("Binance Smart Chain"),
            POLYGON => Some("Polygon"),
            SOLANA => Some("Solana"),
            BITCOIN => Some("Bitcoin"),
            _ => None,
        }
    }
}

/// Upstream metric identifiers, across both fetch groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Transactions,
    Volume,
    PortfolioValue,
    WalletScore,
    WalletAgeScore,
    RiskInteractionScore,
    SmartContractInteractionScore,
}

impl MetricName {
    /// Portfolio metrics, in fetch order.
    pub const PORTFOLIO: &'static [MetricName] = &[
        MetricName::Transactions,
        MetricName::Volume,
        MetricName::PortfolioValue,
    ];

    /// Reputation metrics, in fetch order.
    pub const REPUTATION: &'static [MetricName] = &[
        MetricName::WalletScore,
        MetricName::WalletAgeScore,
        MetricName::RiskInteractionScore,
        MetricName::SmartContractInteractionScore,
    ];

    /// The metric name as the upstream API expects it.
    pub fn api_name(&self) -> &'static str {
        match self {
            MetricName::Transactions => "transactions",
            MetricName::Volume => "volume",
            MetricName::PortfolioValue => "portfolio_value",
            MetricName::WalletScore => "wallet_score",
            MetricName::WalletAgeScore => "wallet_age_score",
            MetricName::RiskInteractionScore => "risk_interaction_score",
            MetricName::SmartContractInteractionScore => "smart_contract_interaction_score",
        }
    }

    /// Which fetch group this metric belongs to.
    pub fn group(&self) -> MetricGroup {
        match self {
            MetricName::Transactions | MetricName::Volume | MetricName::PortfolioValue => {
                MetricGroup::Portfolio
            }
            _ => MetricGroup::Reputation,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// The independently-fetched groups a session fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricGroup {
    Portfolio,
    Reputation,
    Tokens,
    Positions,
}

impl MetricGroup {
    pub const ALL: &'static [MetricGroup] = &[
        MetricGroup::Portfolio,
        MetricGroup::Reputation,
        MetricGroup::Tokens,
        MetricGroup::Positions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricGroup::Portfolio => "portfolio",
            MetricGroup::Reputation => "reputation",
            MetricGroup::Tokens => "tokens",
            MetricGroup::Positions => "positions",
        }
    }
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single metric value with its unit.
///
/// The reputation endpoint returns values as strings while the portfolio
/// endpoint returns numbers; the deserializer accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(deserialize_with = "f64_or_string")]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

fn f64_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Response of `GET /wallet/{address}/metrics`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsResponse {
    pub metric_values: HashMap<String, MetricValue>,
}

/// Response of `GET /wallet/{chain}/{address}/score/reputation`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReputationResponse {
    pub wallet: ReputationWallet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReputationWallet {
    pub metric_values: HashMap<String, MetricValue>,
}

/// One fungible token balance entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub blockchain: String,
    pub chain_id: u32,
    pub decimal: u32,
    pub quantity: f64,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub total_items: u32,
    pub offset: u32,
    pub limit: u32,
    pub has_next: bool,
}

/// Response of `GET /wallet/balance/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPage {
    #[serde(default)]
    pub token: Vec<TokenEntry>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// One active DeFi position. Quantities come back as strings here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefiPosition {
    pub blockchain: String,
    pub chain_id: u32,
    pub decimal: u32,
    pub quantity: String,
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
}

/// Response of `GET /wallet/balance/defi`.
#[derive(Debug, Clone, Deserialize)]
pub struct DefiPortfolio {
    #[serde(default)]
    pub active_positions: Vec<DefiPosition>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_and_display() {
        let a = WalletIdentity::new("0xabc", 1);
        let b = WalletIdentity::new("0xabc", 1);
        let c = WalletIdentity::new("0xabc", 137);

        assert_eq!(a, b);
        assert_ne!(a, c, "same address on a different chain is a new identity");
        assert_eq!(a.to_string(), "0xabc@1");
    }

    #[test]
    fn test_short_address() {
        let id = WalletIdentity::new("0x1234567890abcdef1234567890abcdef12345678", 1);
        assert_eq!(id.short_address(), "0x1234...5678");

        let tiny = WalletIdentity::new("0xabc", 1);
        assert_eq!(tiny.short_address(), "0xabc");
    }

    #[test]
    fn test_short_address_multibyte() {
        // Name-service style identifiers can carry multi-byte characters;
        // abbreviation must not split one.
        let id = WalletIdentity::new("日本語のアドレス例テスト用の長い名前", 1);
        assert_eq!(id.short_address(), "日本語のアド...長い名前");

        let boundary = WalletIdentity::new("ααααααααααα", 1);
        assert_eq!(boundary.short_address(), "αααααα...αααα");
    }

    #[test]
    fn test_metric_api_names() {
        assert_eq!(MetricName::PortfolioValue.api_name(), "portfolio_value");
        assert_eq!(MetricName::Transactions.api_name(), "transactions");
        assert_eq!(
            MetricName::SmartContractInteractionScore.api_name(),
            "smart_contract_interaction_score"
        );
    }

    #[test]
    fn test_group_membership() {
        for metric in MetricName::PORTFOLIO {
            assert_eq!(metric.group(), MetricGroup::Portfolio);
        }
        for metric in MetricName::REPUTATION {
            assert_eq!(metric.group(), MetricGroup::Reputation);
        }
        assert_eq!(MetricName::PORTFOLIO.len() + MetricName::REPUTATION.len(), 7);
    }

    #[test]
    fn test_metric_value_accepts_number_or_string() {
        let from_number: MetricValue =
            serde_json::from_str(r#"{"value": 42.5, "unit": "usd"}"#).unwrap();
        assert_eq!(from_number.value, 42.5);

        // Reputation endpoint style: value encoded as a string.
        let from_string: MetricValue = serde_json::from_str(r#"{"value": "7.3", "unit": ""}"#).unwrap();
        assert_eq!(from_string.value, 7.3);

        let missing_unit: MetricValue = serde_json::from_str(r#"{"value": 1}"#).unwrap();
        assert_eq!(missing_unit.unit, "");
    }

    #[test]
    fn test_token_page_defaults() {
        let page: TokenPage = serde_json::from_str("{}").unwrap();
        assert!(page.token.is_empty());
        assert_eq!(page.pagination.total_items, 0);
    }

    #[test]
    fn test_chain_names() {
        assert_eq!(chains::name(1), Some("Ethereum"));
        assert_eq!(chains::name(8086), Some("Bitcoin"));
        assert_eq!(chains::name(42), None);
    }
}
