//! Credit score aggregation.
//!
//! A pure transform from the eight raw metric inputs to a single
//! normalized credit score, a percentage, and a discrete tier. Recomputed
//! from scratch on every input change; there is no hidden state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ceiling for portfolio value normalization (observed max: 1771.82).
pub const CEIL_PORTFOLIO_VALUE: f64 = 2000.0;
/// Ceiling for held-token count normalization (matches observed max).
pub const CEIL_NUM_TOKENS: f64 = 1000.0;
/// Ceiling for transaction count normalization (observed max: 1278).
pub const CEIL_TRANSACTIONS: f64 = 1500.0;
/// Ceiling for volume normalization (observed max: 1,995,632,500).
pub const CEIL_VOLUME: f64 = 2_000_000_000.0;

/// Upstream scale of the wallet age score.
pub const MAX_WALLET_AGE_SCORE: f64 = 10.0;
/// Upstream scale of the risk interaction score.
pub const RISK_SCALE: f64 = 25.0;
/// Upstream scale of the smart contract interaction score.
pub const MAX_CONTRACT_SCORE: f64 = 100.0;
/// Upstream scale of the wallet score.
pub const MAX_WALLET_SCORE: f64 = 100.0;

/// Maximum attainable credit score.
pub const MAX_CREDIT_SCORE: f64 = 1.0;

/// Raw metric inputs to the aggregator.
///
/// Each field is written by exactly one fetch path; a metric that has not
/// been fetched (or whose fetch failed) stays at the zero default, so a
/// partial fetch cycle yields a degraded score rather than a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditScoreInputs {
    pub portfolio_value: f64,
    pub transactions: f64,
    pub volume: f64,
    pub num_tokens_held: f64,
    pub wallet_age_score: f64,
    pub risk_interaction_score: f64,
    pub smart_contract_interaction_score: f64,
    pub wallet_score: f64,
}

/// Inputs normalized onto the scoring scale.
///
/// The four volume-style metrics are ceiling-clamped to [0, 1]. The four
/// score-style metrics arrive on fixed upstream scales and are divided
/// without clamping, with risk inverted (`1 - value/25`): a raw value past
/// its nominal maximum pushes its term outside [0, 1] and can carry the
/// composite with it. Known edge case, kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInputs {
    pub portfolio_value: f64,
    pub num_tokens_held: f64,
    pub transactions: f64,
    pub volume: f64,
    pub wallet_age: f64,
    pub risk_interaction: f64,
    pub smart_contract: f64,
    pub wallet_score: f64,
}

impl NormalizedInputs {
    pub fn from_raw(raw: &CreditScoreInputs) -> Self {
        Self {
            portfolio_value: (raw.portfolio_value / CEIL_PORTFOLIO_VALUE).clamp(0.0, 1.0),
            num_tokens_held: (raw.num_tokens_held / CEIL_NUM_TOKENS).clamp(0.0, 1.0),
            transactions: (raw.transactions / CEIL_TRANSACTIONS).clamp(0.0, 1.0),
            volume: (raw.volume / CEIL_VOLUME).clamp(0.0, 1.0),
            wallet_age: raw.wallet_age_score / MAX_WALLET_AGE_SCORE,
            risk_interaction: 1.0 - raw.risk_interaction_score / RISK_SCALE,
            smart_contract: raw.smart_contract_interaction_score / MAX_CONTRACT_SCORE,
            wallet_score: raw.wallet_score / MAX_WALLET_SCORE,
        }
    }

    /// Weighted composite of the normalized terms.
    pub fn composite(&self, weights: &ScoreWeights) -> f64 {
        self.portfolio_value * weights.portfolio_value
            + self.num_tokens_held * weights.num_tokens_held
            + self.transactions * weights.transactions
            + self.volume * weights.volume
            + self.wallet_age * weights.wallet_age
            + self.risk_interaction * weights.risk_interaction
            + self.smart_contract * weights.smart_contract
            + self.wallet_score * weights.wallet_score
    }
}

/// Weight configuration for the composite score.
///
/// All weights should sum to 1.0 for normalized output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub portfolio_value: f64,
    pub num_tokens_held: f64,
    pub transactions: f64,
    pub volume: f64,
    pub wallet_age: f64,
    pub risk_interaction: f64,
    pub smart_contract: f64,
    pub wallet_score: f64,
}

impl ScoreWeights {
    pub const DEFAULT: Self = Self {
        portfolio_value: 0.2,
        num_tokens_held: 0.1,
        transactions: 0.1,
        volume: 0.2,
        wallet_age: 0.1,
        risk_interaction: 0.1,
        smart_contract: 0.1,
        wallet_score: 0.1,
    };
}

/// Discrete rank bucket derived from the percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl Tier {
    /// Map a percentage to a tier. Lower bounds are inclusive, evaluated
    /// top-down with first match winning.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Tier::Excellent
        } else if percentage >= 75.0 {
            Tier::Good
        } else if percentage >= 50.0 {
            Tier::Average
        } else if percentage >= 25.0 {
            Tier::BelowAverage
        } else {
            Tier::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Excellent => "Tier 1 (Excellent)",
            Tier::Good => "Tier 2 (Good)",
            Tier::Average => "Tier 3 (Average)",
            Tier::BelowAverage => "Tier 4 (Below Average)",
            Tier::Poor => "Tier 5 (Poor)",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The derived score triple. Never stored independently; recomputed
/// whenever any input changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub percentage: f64,
    pub tier: Tier,
}

impl ScoreResult {
    /// Compute the credit score from raw inputs.
    pub fn compute(inputs: &CreditScoreInputs) -> Self {
        let score = NormalizedInputs::from_raw(inputs).composite(&ScoreWeights::DEFAULT);
        let percentage = score / MAX_CREDIT_SCORE * 100.0;
        Self {
            score,
            percentage,
            tier: Tier::from_percentage(percentage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = &ScoreWeights::DEFAULT;
        let sum = w.portfolio_value
            + w.num_tokens_held
            + w.transactions
            + w.volume
            + w.wallet_age
            + w.risk_interaction
            + w.smart_contract
            + w.wallet_score;
        assert!(approx(sum, 1.0), "weights sum to {} instead of 1.0", sum);
    }

    #[test]
    fn test_worked_example_midrange_wallet() {
        let inputs = CreditScoreInputs {
            portfolio_value: 1000.0,
            num_tokens_held: 500.0,
            transactions: 750.0,
            volume: 1_000_000_000.0,
            wallet_age_score: 5.0,
            risk_interaction_score: 0.0,
            smart_contract_interaction_score: 50.0,
            wallet_score: 50.0,
        };

        let normalized = NormalizedInputs::from_raw(&inputs);
        assert!(approx(normalized.portfolio_value, 0.5));
        assert!(approx(normalized.num_tokens_held, 0.5));
        assert!(approx(normalized.transactions, 0.5));
        assert!(approx(normalized.volume, 0.5));
        assert!(approx(normalized.wallet_age, 0.5));
        assert!(approx(normalized.risk_interaction, 1.0));
        assert!(approx(normalized.smart_contract, 0.5));
        assert!(approx(normalized.wallet_score, 0.5));

        let result = ScoreResult::compute(&inputs);
        assert!(approx(result.score, 0.55), "score was {}", result.score);
        assert!(approx(result.percentage, 55.0));
        assert_eq!(result.tier, Tier::Average);
    }

    #[test]
    fn test_all_zero_inputs_score_from_risk_inversion() {
        // With everything at zero the inverted risk term is 1 - 0/25 = 1,
        // contributing its full 0.1 weight.
        let result = ScoreResult::compute(&CreditScoreInputs::default());
        assert!(approx(result.score, 0.1), "score was {}", result.score);
        assert!(approx(result.percentage, 10.0));
        assert_eq!(result.tier, Tier::Poor);
    }

    #[test]
    fn test_aggregator_is_pure() {
        let inputs = CreditScoreInputs {
            portfolio_value: 123.4,
            transactions: 56.0,
            volume: 7_000_000.0,
            num_tokens_held: 12.0,
            wallet_age_score: 8.0,
            risk_interaction_score: 3.0,
            smart_contract_interaction_score: 77.0,
            wallet_score: 61.0,
        };
        assert_eq!(ScoreResult::compute(&inputs), ScoreResult::compute(&inputs));
    }

    #[test]
    fn test_tier_boundaries_inclusive() {
        assert_eq!(Tier::from_percentage(90.0), Tier::Excellent);
        assert_eq!(Tier::from_percentage(89.999), Tier::Good);
        assert_eq!(Tier::from_percentage(75.0), Tier::Good);
        assert_eq!(Tier::from_percentage(74.999), Tier::Average);
        assert_eq!(Tier::from_percentage(50.0), Tier::Average);
        assert_eq!(Tier::from_percentage(49.999), Tier::BelowAverage);
        assert_eq!(Tier::from_percentage(25.0), Tier::BelowAverage);
        assert_eq!(Tier::from_percentage(24.999), Tier::Poor);
        assert_eq!(Tier::from_percentage(0.0), Tier::Poor);
    }

    #[test]
    fn test_clamped_terms_cap_at_ceiling() {
        let inputs = CreditScoreInputs {
            portfolio_value: 1_000_000.0,
            num_tokens_held: 50_000.0,
            transactions: 99_999.0,
            volume: 1e18,
            ..Default::default()
        };
        let normalized = NormalizedInputs::from_raw(&inputs);
        assert!(approx(normalized.portfolio_value, 1.0));
        assert!(approx(normalized.num_tokens_held, 1.0));
        assert!(approx(normalized.transactions, 1.0));
        assert!(approx(normalized.volume, 1.0));
    }

    #[test]
    fn test_unclamped_terms_exceed_nominal_range() {
        // Score-style inputs past their upstream maxima leak through the
        // normalization unclamped.
        let inputs = CreditScoreInputs {
            wallet_score: 150.0,
            ..Default::default()
        };
        let normalized = NormalizedInputs::from_raw(&inputs);
        assert!(approx(normalized.wallet_score, 1.5));

        let nominal_max = ScoreResult::compute(&CreditScoreInputs {
            wallet_score: 100.0,
            ..Default::default()
        });
        let overflowed = ScoreResult::compute(&inputs);
        assert!(overflowed.score > nominal_max.score);

        // A raw risk score past its scale drives the inverted term negative.
        let risky = NormalizedInputs::from_raw(&CreditScoreInputs {
            risk_interaction_score: 50.0,
            ..Default::default()
        });
        assert!(approx(risky.risk_interaction, -1.0));
    }
}
