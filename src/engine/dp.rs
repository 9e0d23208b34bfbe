//! Differential-privacy style estimation from amount dispersion.
//!
//! Heuristic, not a formal DP mechanism: epsilon is derived from the
//! normalized interquartile range of amounts (wider spread reads as lower
//! epsilon, i.e. "stronger" heuristic privacy). Numbers are meaningful only
//! relative to each other.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TransactionRecord;
use crate::engine::stats::{clamp01, finite_or_zero, interquartile_range, mean};

const MIN_SAMPLE: usize = 3;

/// Epsilon clamp range.
const EPSILON_MIN: f64 = 0.1;
const EPSILON_MAX: f64 = 10.0;

/// Heuristic privacy tier from epsilon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DpTier {
    Strong,
    Moderate,
    Weak,
    None,
}

impl DpTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "STRONG",
            Self::Moderate => "MODERATE",
            Self::Weak => "WEAK",
            Self::None => "NONE",
        }
    }

    fn from_epsilon(epsilon: f64) -> Self {
        if epsilon <= 0.5 {
            Self::Strong
        } else if epsilon <= 1.0 {
            Self::Moderate
        } else if epsilon <= 3.0 {
            Self::Weak
        } else {
            Self::None
        }
    }
}

/// Differential-privacy estimation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DifferentialPrivacyAnalysis {
    /// max-amount / mean-amount (query sensitivity proxy)
    pub sensitivity: f64,
    /// Heuristic epsilon, in [0.1, 10]
    pub epsilon: f64,
    /// min(1, e^epsilon / n)
    pub delta: f64,
    /// min(1, epsilon / 5)
    pub privacy_budget_used: f64,
    pub tier: DpTier,
    pub interpretation: String,
}

impl DifferentialPrivacyAnalysis {
    fn empty() -> Self {
        Self {
            sensitivity: 0.0,
            epsilon: EPSILON_MAX,
            delta: 1.0,
            privacy_budget_used: 1.0,
            tier: DpTier::None,
            interpretation: "Insufficient history for differential-privacy estimation."
                .to_string(),
        }
    }
}

/// Estimate heuristic (epsilon, delta) from the amount distribution.
#[must_use]
pub fn estimate_differential_privacy(txs: &[TransactionRecord]) -> DifferentialPrivacyAnalysis {
    if txs.len() < MIN_SAMPLE {
        return DifferentialPrivacyAnalysis::empty();
    }

    let amounts: Vec<f64> = txs.iter().map(|t| t.amount).collect();
    let avg = mean(&amounts);
    let max = amounts.iter().copied().fold(0.0_f64, f64::max);

    // Uniform-amount guard: zero mean (all-zero amounts) or zero IQR both
    // collapse toward the weakest epsilon rather than dividing by zero.
    let sensitivity = if avg > 0.0 {
        finite_or_zero(max / avg)
    } else {
        0.0
    };
    let normalized_iqr = if avg > 0.0 {
        finite_or_zero(interquartile_range(&amounts) / avg)
    } else {
        0.0
    };

    let epsilon = (1.0 / (0.1 + normalized_iqr)).clamp(EPSILON_MIN, EPSILON_MAX);
    let delta = (epsilon.exp() / txs.len() as f64).min(1.0);
    let budget = clamp01(epsilon / 5.0);
    let tier = DpTier::from_epsilon(epsilon);

    DifferentialPrivacyAnalysis {
        sensitivity,
        epsilon,
        delta,
        privacy_budget_used: budget,
        tier,
        interpretation: format!(
            "Heuristic epsilon {:.2} ({}): amount dispersion {} plausible-deniability noise.",
            epsilon,
            tier.as_str(),
            if matches!(tier, DpTier::Strong | DpTier::Moderate) {
                "resembles"
            } else {
                "provides little"
            }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionRecord;

    fn tx(i: i64, amount: f64) -> TransactionRecord {
        TransactionRecord::new(format!("sig{i}"), 1_700_000_000 + i * 60, amount, "cp", "TRANSFER")
    }

    #[test]
    fn test_insufficient_history_is_weakest() {
        let result = estimate_differential_privacy(&[tx(0, 1.0)]);
        assert_eq!(result.tier, DpTier::None);
        assert_eq!(result.privacy_budget_used, 1.0);
    }

    #[test]
    fn test_uniform_amounts_no_division_by_zero() {
        let txs: Vec<_> = (0..10).map(|i| tx(i, 2.5)).collect();
        let result = estimate_differential_privacy(&txs);
        assert!(result.epsilon.is_finite());
        assert!(result.delta.is_finite());
        // Zero IQR => epsilon at the weak end
        assert_eq!(result.epsilon, EPSILON_MAX);
        assert_eq!(result.tier, DpTier::None);
    }

    #[test]
    fn test_all_zero_amounts() {
        let txs: Vec<_> = (0..10).map(|i| tx(i, 0.0)).collect();
        let result = estimate_differential_privacy(&txs);
        assert_eq!(result.sensitivity, 0.0);
        assert!(result.epsilon.is_finite());
    }

    #[test]
    fn test_wide_dispersion_strengthens_epsilon() {
        let narrow: Vec<_> = (0..20).map(|i| tx(i, 1.0 + (i % 2) as f64 * 0.01)).collect();
        let wide: Vec<_> = (0..20).map(|i| tx(i, 0.1 + i as f64 * 2.0)).collect();

        let narrow_eps = estimate_differential_privacy(&narrow).epsilon;
        let wide_eps = estimate_differential_privacy(&wide).epsilon;
        assert!(wide_eps < narrow_eps, "wide {wide_eps} vs narrow {narrow_eps}");
    }

    #[test]
    fn test_ranges_and_tier_consistency() {
        let txs: Vec<_> = (0..30).map(|i| tx(i, 0.5 + i as f64 * 0.3)).collect();
        let result = estimate_differential_privacy(&txs);
        assert!((EPSILON_MIN..=EPSILON_MAX).contains(&result.epsilon));
        assert!((0.0..=1.0).contains(&result.delta));
        assert!((0.0..=1.0).contains(&result.privacy_budget_used));
        assert_eq!(result.tier, DpTier::from_epsilon(result.epsilon));
    }
}
