//! Error types for the wallet credit scoring system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Upstream signalled request-quota exhaustion (HTTP 429).
    #[error("rate limited by analytics API")]
    RateLimited,

    /// The wallet/chain combination yields no data (HTTP 404).
    #[error("wallet not found")]
    NotFound,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("wallet address must not be empty")]
    EmptyAddress,
}

impl Error {
    /// Classify an upstream HTTP status into the error taxonomy.
    ///
    /// 429 and 404 get dedicated variants; anything else carries the
    /// upstream message (when the body had one) and the status code.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            429 => Error::RateLimited,
            404 => Error::NotFound,
            _ => Error::Api {
                message: message.unwrap_or_else(|| format!("API error: {status}")),
                status: Some(status),
            },
        }
    }

    /// User-visible message for presentation layers.
    ///
    /// Rate limiting and missing wallets get fixed copy; every other
    /// failure passes through the underlying description.
    pub fn user_message(&self) -> String {
        match self {
            Error::RateLimited => "Server load, please refresh.".to_string(),
            Error::NotFound => "Wallet not found.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(Error::from_status(429, None), Error::RateLimited));
        assert!(matches!(Error::from_status(404, None), Error::NotFound));

        let other = Error::from_status(500, Some("internal".to_string()));
        match other {
            Error::Api { message, status } => {
                assert_eq!(message, "internal");
                assert_eq!(status, Some(500));
            }
            _ => panic!("500 should classify as Api"),
        }
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            Error::RateLimited.user_message(),
            "Server load, please refresh."
        );
        assert_eq!(Error::NotFound.user_message(), "Wallet not found.");

        // Unclassified errors pass the underlying description through.
        let api = Error::Api {
            message: "unexpected shape".to_string(),
            status: Some(502),
        };
        assert!(api.user_message().contains("unexpected shape"));
    }
}
