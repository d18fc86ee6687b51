//! Session control for score computation.
//!
//! The session owns the committed wallet identity, gates recomputation on
//! identity change, and fans a new identity out to the four concurrent
//! fetch paths: portfolio metrics, reputation metrics, token balances
//! (for the held-token count), and DeFi positions. Presentation layers
//! subscribe to the broadcast event stream.

use crate::fetcher::{CancelToken, FetchError, FetchState, InputUpdate, SequentialFetcher};
use crate::scoring::{CreditScoreInputs, ScoreResult};
use credit_core::api::MetricSource;
use credit_core::config::Config;
use credit_core::types::{DefiPortfolio, MetricGroup, MetricName, WalletIdentity};
use credit_core::Error;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Events pushed to presentation layers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The credit score changed (some input was written).
    ScoreChanged(ScoreResult),
    /// A fetch group transitioned state.
    FetchStateChanged { group: MetricGroup, state: FetchState },
    /// The standalone DeFi positions fetch resolved (display data only;
    /// never feeds the score).
    PositionsLoaded(DefiPortfolio),
}

/// Session tuning knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Currency portfolio metrics are quoted in.
    pub currency: String,
    /// Pacing delay between sequential metric requests.
    pub inter_request_delay: Duration,
    /// Page size for the token balance fetch.
    pub token_page_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            inter_request_delay: Duration::from_millis(1000),
            token_page_limit: 30,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            currency: config.api.currency.clone(),
            inter_request_delay: Duration::from_millis(config.pacing.inter_request_delay_ms),
            token_page_limit: config.pacing.token_page_limit,
        }
    }
}

/// Coordinates metric fetching and scoring for one wallet at a time.
#[derive(Clone)]
pub struct ScoreSession {
    source: Arc<dyn MetricSource>,
    config: SessionConfig,
    /// The identity all in-flight fetches belong to. Frozen per cycle.
    committed: Arc<RwLock<Option<WalletIdentity>>>,
    /// Raw score inputs. Each field is written by exactly one fetch path;
    /// the lock only serializes the write-then-recompute step.
    inputs: Arc<Mutex<CreditScoreInputs>>,
    /// Per-group fetch state registry.
    states: Arc<DashMap<MetricGroup, FetchState>>,
    events: broadcast::Sender<SessionEvent>,
    /// Cancellation token of the active fetch cycle.
    cycle: Arc<RwLock<Option<CancelToken>>>,
}

impl ScoreSession {
    pub fn new(source: Arc<dyn MetricSource>, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        let states = Arc::new(DashMap::new());
        for group in MetricGroup::ALL {
            states.insert(*group, FetchState::Idle);
        }
        Self {
            source,
            config,
            committed: Arc::new(RwLock::new(None)),
            inputs: Arc::new(Mutex::new(CreditScoreInputs::default())),
            states,
            events,
            cycle: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to score and fetch-state events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current score, recomputed from the inputs on demand.
    pub fn score(&self) -> ScoreResult {
        ScoreResult::compute(&self.inputs.lock().unwrap())
    }

    /// Snapshot of the raw score inputs.
    pub fn inputs(&self) -> CreditScoreInputs {
        self.inputs.lock().unwrap().clone()
    }

    /// Current state of one fetch group.
    pub fn fetch_state(&self, group: MetricGroup) -> FetchState {
        self.states
            .get(&group)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// The committed identity, if any.
    pub async fn committed(&self) -> Option<WalletIdentity> {
        self.committed.read().await.clone()
    }

    /// Submit a candidate identity.
    ///
    /// Returns `Ok(false)` without side effects when the candidate equals
    /// the committed identity (re-submission guard: no network calls, the
    /// score stands). Otherwise cancels the previous cycle, commits the
    /// candidate, resets the inputs, and starts the four fetch paths.
    pub async fn submit(&self, candidate: WalletIdentity) -> anyhow::Result<bool> {
        if candidate.address.trim().is_empty() {
            return Err(Error::EmptyAddress.into());
        }

        // Commit and swap the cycle token under one lock so a racing
        // submit cannot leave the active token paired with the wrong
        // identity.
        let token = CancelToken::new();
        {
            let mut committed = self.committed.write().await;
            if committed.as_ref() == Some(&candidate) {
                debug!(wallet = %candidate, "Identity unchanged, ignoring re-submission");
                return Ok(false);
            }
            *committed = Some(candidate.clone());

            // Cancel the previous cycle before its replacement starts. A
            // stale in-flight response resolving after this point is dropped
            // at the token check, so it can never overwrite the new wallet's
            // inputs.
            let mut cycle = self.cycle.write().await;
            if let Some(previous) = cycle.replace(token.clone()) {
                previous.cancel();
            }

            // The input reset belongs to the new cycle, so it must land
            // before these locks release: a competing submit serializes
            // behind them and can never zero the inputs after a newer
            // cycle has started writing its own.
            let mut inputs = self.inputs.lock().unwrap();
            *inputs = CreditScoreInputs::default();
            let _ = self
                .events
                .send(SessionEvent::ScoreChanged(ScoreResult::compute(&inputs)));
        }

        info!(wallet = %candidate, chain = candidate.chain_id, "Starting fetch cycle");

        for group in MetricGroup::ALL {
            self.set_state(&token, *group, FetchState::Loading);
        }

        let session = self.clone();
        let identity = candidate.clone();
        let cycle_token = token.clone();
        tokio::spawn(async move {
            session
                .run_metric_cycle(identity, MetricGroup::Portfolio, MetricName::PORTFOLIO, cycle_token)
                .await;
        });

        let session = self.clone();
        let identity = candidate.clone();
        let cycle_token = token.clone();
        tokio::spawn(async move {
            session
                .run_metric_cycle(identity, MetricGroup::Reputation, MetricName::REPUTATION, cycle_token)
                .await;
        });

        let session = self.clone();
        let identity = candidate.clone();
        let cycle_token = token.clone();
        tokio::spawn(async move {
            session.run_token_cycle(identity, cycle_token).await;
        });

        let session = self.clone();
        tokio::spawn(async move {
            session.run_positions_cycle(candidate, token).await;
        });

        Ok(true)
    }

    async fn run_metric_cycle(
        &self,
        identity: WalletIdentity,
        group: MetricGroup,
        metrics: &'static [MetricName],
        token: CancelToken,
    ) {
        let fetcher = SequentialFetcher::new(
            self.source.clone(),
            self.config.currency.clone(),
            self.config.inter_request_delay,
        );
        let outcome = fetcher
            .run(&identity, metrics, &token, |update| {
                self.apply_update(&token, update)
            })
            .await;
        match outcome {
            Some(state) => self.set_state(&token, group, state),
            None => debug!(wallet = %identity, group = %group, "Fetch cycle cancelled"),
        }
    }

    async fn run_token_cycle(&self, identity: WalletIdentity, token: CancelToken) {
        let result = self
            .source
            .fetch_token_page(&identity, 0, self.config.token_page_limit)
            .await;
        if token.is_cancelled() {
            debug!(wallet = %identity, group = %MetricGroup::Tokens, "Fetch cycle cancelled");
            return;
        }
        match result {
            Ok(page) => {
                // The held-token count is derived from the returned entries,
                // not from the server-reported total.
                self.apply_update(&token, InputUpdate::TokenCount(page.token.len()));
                self.set_state(&token, MetricGroup::Tokens, FetchState::Ready(HashMap::new()));
            }
            Err(error) => {
                warn!(wallet = %identity, error = %error, "Token balance fetch failed");
                self.set_state(
                    &token,
                    MetricGroup::Tokens,
                    FetchState::Failed(FetchError::from(&error)),
                );
            }
        }
    }

    async fn run_positions_cycle(&self, identity: WalletIdentity, token: CancelToken) {
        let result = self
            .source
            .fetch_defi_portfolio(&identity, 0, self.config.token_page_limit)
            .await;
        if token.is_cancelled() {
            debug!(wallet = %identity, group = %MetricGroup::Positions, "Fetch cycle cancelled");
            return;
        }
        match result {
            Ok(portfolio) => {
                let _ = self.events.send(SessionEvent::PositionsLoaded(portfolio));
                self.set_state(&token, MetricGroup::Positions, FetchState::Ready(HashMap::new()));
            }
            Err(error) => {
                warn!(wallet = %identity, error = %error, "DeFi positions fetch failed");
                self.set_state(
                    &token,
                    MetricGroup::Positions,
                    FetchState::Failed(FetchError::from(&error)),
                );
            }
        }
    }

    /// Write one input field and broadcast the recomputed score.
    ///
    /// Gated on the cycle token so a cancelled cycle's late resolutions
    /// are suppressed.
    fn apply_update(&self, token: &CancelToken, update: InputUpdate) {
        if token.is_cancelled() {
            return;
        }
        let result = {
            let mut inputs = self.inputs.lock().unwrap();
            match update {
                InputUpdate::Metric { metric, value } => match metric {
                    MetricName::Transactions => inputs.transactions = value,
                    MetricName::Volume => inputs.volume = value,
                    MetricName::PortfolioValue => inputs.portfolio_value = value,
                    MetricName::WalletScore => inputs.wallet_score = value,
                    MetricName::WalletAgeScore => inputs.wallet_age_score = value,
                    MetricName::RiskInteractionScore => inputs.risk_interaction_score = value,
                    MetricName::SmartContractInteractionScore => {
                        inputs.smart_contract_interaction_score = value
                    }
                },
                InputUpdate::TokenCount(count) => inputs.num_tokens_held = count as f64,
            }
            ScoreResult::compute(&inputs)
        };
        let _ = self.events.send(SessionEvent::ScoreChanged(result));
    }

    fn set_state(&self, token: &CancelToken, group: MetricGroup, state: FetchState) {
        if token.is_cancelled() {
            return;
        }
        self.states.insert(group, state.clone());
        let _ = self.events.send(SessionEvent::FetchStateChanged { group, state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Tier;
    use credit_core::types::{MetricValue, TokenPage};
    use credit_core::Result;

    struct NullSource;

    #[async_trait::async_trait]
    impl MetricSource for NullSource {
        async fn fetch_metric(
            &self,
            _identity: &WalletIdentity,
            _metric: MetricName,
            _currency: &str,
        ) -> Result<MetricValue> {
            Ok(MetricValue {
                value: 0.0,
                unit: String::new(),
            })
        }

        async fn fetch_token_page(
            &self,
            _identity: &WalletIdentity,
            _offset: u32,
            _limit: u32,
        ) -> Result<TokenPage> {
            Ok(serde_json::from_str("{}").unwrap())
        }

        async fn fetch_defi_portfolio(
            &self,
            _identity: &WalletIdentity,
            _offset: u32,
            _limit: u32,
        ) -> Result<DefiPortfolio> {
            Ok(serde_json::from_str("{}").unwrap())
        }
    }

    #[tokio::test]
    async fn test_empty_address_rejected() {
        let session = ScoreSession::new(Arc::new(NullSource), SessionConfig::default());
        let result = session.submit(WalletIdentity::new("   ", 1)).await;
        assert!(result.is_err());
        assert!(session.committed().await.is_none());
    }

    #[tokio::test]
    async fn test_initial_state() {
        let session = ScoreSession::new(Arc::new(NullSource), SessionConfig::default());
        for group in MetricGroup::ALL {
            assert_eq!(session.fetch_state(*group), FetchState::Idle);
        }
        // Zeroed inputs still score 0.1 from the inverted risk term.
        let baseline = session.score();
        assert!((baseline.score - 0.1).abs() < 1e-9);
        assert_eq!(baseline.tier, Tier::Poor);
    }
}
