//! Score a wallet against the live analytics API.
//!
//! Run with:
//! ```
//! UNLEASH_API_KEYS=key1,key2 cargo run --example score_wallet -- 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 1
//! ```

use credit_core::api::UnleashClient;
use credit_core::config::Config;
use credit_core::types::{chains, MetricGroup, WalletIdentity};
use credit_engine::{FetchState, ScoreSession, SessionConfig, SessionEvent};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter("info").init();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string());
    let chain_id: u32 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(chains::ETHEREUM);

    println!("=== Wallet Credit Score ===\n");

    println!("1. Loading configuration from environment...");
    let config = Config::from_env()?;
    println!("   ✓ {} API key(s) configured", config.api.api_keys.len());

    println!("\n2. Starting score session...");
    let client = Arc::new(UnleashClient::from_config(&config.api));
    let session = ScoreSession::new(client, SessionConfig::from(&config));
    let mut events = session.subscribe();

    let identity = WalletIdentity::new(address, chain_id);
    println!(
        "   Wallet: {} on {}",
        identity.short_address(),
        chains::name(chain_id).unwrap_or("unknown chain")
    );
    session.submit(identity).await?;

    println!("\n3. Fetching metrics (paced, this takes a few seconds)...\n");
    let mut done: HashSet<MetricGroup> = HashSet::new();
    while done.len() < MetricGroup::ALL.len() {
        let event = tokio::time::timeout(Duration::from_secs(120), events.recv()).await;
        let event = match event {
            Ok(Ok(event)) => event,
            _ => break,
        };
        match event {
            SessionEvent::ScoreChanged(result) => {
                println!(
                    "   score {:.4} ({:.2}%) — {}",
                    result.score, result.percentage, result.tier
                );
            }
            SessionEvent::FetchStateChanged { group, state } => match state {
                FetchState::Ready(_) => {
                    println!("   ✓ {group} metrics loaded");
                    done.insert(group);
                }
                FetchState::Failed(error) => {
                    println!("   ✗ {group}: {}", error.message);
                    done.insert(group);
                }
                _ => {}
            },
            SessionEvent::PositionsLoaded(portfolio) => {
                println!(
                    "   {} active DeFi position(s)",
                    portfolio.active_positions.len()
                );
            }
        }
    }

    let result = session.score();
    println!("\n=== Result ===");
    println!("Credit score: {:.2} / 1.00", result.score);
    println!("Percentage:   {:.2}%", result.percentage);
    println!("Rank:         {}", result.tier);

    Ok(())
}
