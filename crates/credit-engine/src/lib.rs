//! Credit Engine
//!
//! Computes a normalized credit score for a blockchain wallet by
//! orchestrating paced, cancellable metric fetches and folding the
//! results through a fixed weighted formula.

pub mod fetcher;
pub mod scoring;
pub mod session;

pub use fetcher::{CancelToken, ErrorKind, FetchError, FetchState, InputUpdate, SequentialFetcher};
pub use scoring::{CreditScoreInputs, ScoreResult, ScoreWeights, Tier};
pub use session::{ScoreSession, SessionConfig, SessionEvent};
