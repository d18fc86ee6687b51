//! Sequential metric fetching.
//!
//! Drives an ordered list of metrics through a paced, cancellable fetch
//! loop. Results are pushed out one at a time as they arrive so the score
//! can update progressively; the pacing delay keeps the upstream API's
//! rate limits honored.

use credit_core::api::MetricSource;
use credit_core::types::{MetricName, MetricValue, WalletIdentity};
use credit_core::Error;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cancellation flag scoped to one fetch cycle.
///
/// Cloned into every fetch path a cycle spawns; checked before acting on
/// each result and before issuing each request. Once cancelled, a cycle
/// suppresses all further state writes even if in-flight requests later
/// resolve.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Classified failure kind, mirroring the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    Unclassified,
}

/// Cheap, cloneable snapshot of a fetch failure, suitable for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: ErrorKind,
    /// User-visible description.
    pub message: String,
}

impl From<&Error> for FetchError {
    fn from(error: &Error) -> Self {
        let kind = match error {
            Error::RateLimited => ErrorKind::RateLimited,
            Error::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Unclassified,
        };
        Self {
            kind,
            message: error.user_message(),
        }
    }
}

/// Lifecycle of one fetch group within a cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    /// Terminal success. Carries the fetched metric mapping; groups without
    /// named metrics (tokens, positions) publish an empty mapping.
    Ready(HashMap<MetricName, MetricValue>),
    /// Terminal failure. Metrics fetched before the failure stay written.
    Failed(FetchError),
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Ready(_) | FetchState::Failed(_))
    }
}

/// A single write into the shared score inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputUpdate {
    Metric { metric: MetricName, value: f64 },
    TokenCount(usize),
}

/// Fetches an ordered metric list one request at a time.
pub struct SequentialFetcher {
    source: Arc<dyn MetricSource>,
    currency: String,
    pacing: Duration,
}

impl SequentialFetcher {
    pub fn new(source: Arc<dyn MetricSource>, currency: impl Into<String>, pacing: Duration) -> Self {
        Self {
            source,
            currency: currency.into(),
            pacing,
        }
    }

    /// Run the fetch loop over `metrics`, strictly in order.
    ///
    /// Each successful fetch emits an [`InputUpdate`] immediately; the
    /// pacing delay elapses before the next request is issued. The first
    /// failure aborts the remainder and yields `Failed` (earlier updates
    /// stand). Returns `None` without emitting anything further once the
    /// token is cancelled.
    pub async fn run<F>(
        &self,
        identity: &WalletIdentity,
        metrics: &[MetricName],
        token: &CancelToken,
        mut on_update: F,
    ) -> Option<FetchState>
    where
        F: FnMut(InputUpdate),
    {
        let mut fetched: HashMap<MetricName, MetricValue> = HashMap::new();

        for (index, &metric) in metrics.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            if token.is_cancelled() {
                debug!(wallet = %identity, metric = %metric, "Fetch cycle cancelled before request");
                return None;
            }

            debug!(wallet = %identity, metric = %metric, "Fetching metric");
            let result = self
                .source
                .fetch_metric(identity, metric, &self.currency)
                .await;

            // A cancellation that raced the in-flight request wins: the
            // resolved value must not reach shared state.
            if token.is_cancelled() {
                debug!(wallet = %identity, metric = %metric, "Fetch cycle cancelled mid-flight");
                return None;
            }

            match result {
                Ok(value) => {
                    on_update(InputUpdate::Metric {
                        metric,
                        value: value.value,
                    });
                    fetched.insert(metric, value);
                }
                Err(error) => {
                    warn!(
                        wallet = %identity,
                        metric = %metric,
                        error = %error,
                        "Metric fetch failed, aborting remaining sequence"
                    );
                    return Some(FetchState::Failed(FetchError::from(&error)));
                }
            }
        }

        Some(FetchState::Ready(fetched))
    }
}
