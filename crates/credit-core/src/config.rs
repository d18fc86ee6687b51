//! Configuration management for the wallet credit scoring system.

use crate::{Error, Result};
use serde::Deserialize;
use std::env;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub pacing: PacingConfig,
}

/// Analytics API access configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the analytics API.
    pub base_url: String,
    /// API keys rotated across requests to spread quota.
    pub api_keys: Vec<String>,
    /// Currency the portfolio metrics are denominated in.
    pub currency: String,
}

/// Request pacing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Delay between consecutive metric requests within one fetcher.
    pub inter_request_delay_ms: u64,
    /// Page size for the token balance fetch.
    pub token_page_limit: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            inter_request_delay_ms: 1000,
            token_page_limit: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_keys: Vec<String> = env::var("UNLEASH_API_KEYS")
            .map_err(|_| Error::Config {
                message: "UNLEASH_API_KEYS environment variable not set".to_string(),
            })?
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if api_keys.is_empty() {
            return Err(Error::Config {
                message: "UNLEASH_API_KEYS contains no usable keys".to_string(),
            });
        }

        Ok(Self {
            api: ApiConfig {
                base_url: env::var("UNLEASH_API_BASE_URL")
                    .unwrap_or_else(|_| crate::api::UnleashClient::DEFAULT_BASE_URL.to_string()),
                api_keys,
                currency: env::var("SCORE_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            },
            pacing: PacingConfig {
                inter_request_delay_ms: env::var("SCORE_PACING_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
                token_page_limit: env::var("SCORE_TOKEN_LIMIT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
        })
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:9999/api/v1".to_string(),
                api_keys: vec!["test-key-a".to_string(), "test-key-b".to_string()],
                currency: "usd".to_string(),
            },
            pacing: PacingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_defaults() {
        let pacing = PacingConfig::default();
        assert_eq!(pacing.inter_request_delay_ms, 1000);
        assert_eq!(pacing.token_page_limit, 30);
    }

    #[test]
    fn test_test_config_has_keys() {
        let config = Config::test_config();
        assert_eq!(config.api.api_keys.len(), 2);
        assert_eq!(config.api.currency, "usd");
    }
}
