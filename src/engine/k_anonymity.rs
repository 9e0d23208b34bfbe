//! K-anonymity estimation from quasi-identifier uniqueness.
//!
//! Five behavioral quasi-identifiers are scored against reference-population
//! statistics; their average uniqueness maps to an estimated anonymity-set
//! size. This is a population-relative estimate, not a count over actual
//! ledger peers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ReferenceStats, RiskTier, TransactionRecord};
use crate::engine::stats::{clamp01, frequency_map, mean, time_bucket_counts};

/// Minimum records before the estimator reports anything but the neutral k.
const MIN_SAMPLE: usize = 3;

/// Anonymity-set size assumed for a wallet indistinguishable from the
/// reference population (uniqueness 0).
pub const NEUTRAL_K: u64 = 1000;

/// One scored quasi-identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuasiIdentifier {
    pub name: String,
    /// Uniqueness vs the reference population, in [0,1]
    pub uniqueness: f64,
}

/// K-anonymity estimation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KAnonymityAnalysis {
    pub quasi_identifiers: Vec<QuasiIdentifier>,
    /// Mean uniqueness across quasi-identifiers, in [0,1]
    pub average_uniqueness: f64,
    /// Estimated anonymity-set size k, in [1, 1000]
    pub estimated_k: u64,
    pub risk: RiskTier,
    pub interpretation: String,
}

/// Map a uniqueness vector to the estimated anonymity-set size:
/// `k = max(1, floor(1000 * (1 - u)^2))` where `u` is the mean uniqueness.
///
/// Monotone: raising any component never raises k.
#[must_use]
pub fn k_from_uniqueness(uniqueness: &[f64]) -> u64 {
    if uniqueness.is_empty() {
        return NEUTRAL_K;
    }
    let u = clamp01(mean(&uniqueness.iter().map(|&v| clamp01(v)).collect::<Vec<_>>()));
    ((NEUTRAL_K as f64 * (1.0 - u).powi(2)).floor() as u64).max(1)
}

fn risk_for_k(k: u64) -> RiskTier {
    if k >= 100 {
        RiskTier::Low
    } else if k >= 20 {
        RiskTier::Medium
    } else if k >= 5 {
        RiskTier::High
    } else {
        RiskTier::Critical
    }
}

/// Relative deviation of `observed` from `reference`, in [0,1].
fn deviation(observed: f64, reference: f64) -> f64 {
    let denom = observed.max(reference);
    if denom <= 0.0 {
        return 0.0;
    }
    clamp01((observed - reference).abs() / denom)
}

/// Estimate the wallet's k-anonymity against `reference` statistics.
#[must_use]
pub fn estimate_k_anonymity(
    txs: &[TransactionRecord],
    reference: &ReferenceStats,
) -> KAnonymityAnalysis {
    if txs.len() < MIN_SAMPLE {
        return KAnonymityAnalysis {
            quasi_identifiers: Vec::new(),
            average_uniqueness: 0.0,
            estimated_k: NEUTRAL_K,
            risk: RiskTier::Low,
            interpretation: format!(
                "Fewer than {MIN_SAMPLE} records; wallet treated as indistinguishable from the reference population (k = {NEUTRAL_K})."
            ),
        };
    }

    let n = txs.len() as f64;
    let amounts: Vec<f64> = txs.iter().map(|t| t.amount).collect();
    let distinct_counterparties =
        frequency_map(txs.iter().map(|t| t.counterparty.as_str())).len() as f64;

    let type_counts = frequency_map(txs.iter().map(|t| t.tx_type.as_str()));
    let dominant_type = type_counts.values().copied().max().unwrap_or(0) as f64;

    let bucket_counts = time_bucket_counts(txs);
    let dominant_bucket = bucket_counts.iter().copied().max().unwrap_or(0) as f64;

    let identifiers = vec![
        QuasiIdentifier {
            name: "transaction_count_deviation".to_string(),
            uniqueness: deviation(n, reference.avg_transaction_count),
        },
        QuasiIdentifier {
            name: "mean_amount_deviation".to_string(),
            uniqueness: deviation(mean(&amounts), reference.avg_amount),
        },
        QuasiIdentifier {
            name: "counterparty_count_deviation".to_string(),
            uniqueness: deviation(distinct_counterparties, reference.avg_counterparty_count),
        },
        QuasiIdentifier {
            name: "dominant_type_concentration".to_string(),
            uniqueness: clamp01(dominant_type / n),
        },
        QuasiIdentifier {
            name: "dominant_time_bucket_concentration".to_string(),
            uniqueness: clamp01(dominant_bucket / n),
        },
    ];

    let uniqueness: Vec<f64> = identifiers.iter().map(|q| q.uniqueness).collect();
    let average = clamp01(mean(&uniqueness));
    let k = k_from_uniqueness(&uniqueness);
    let risk = risk_for_k(k);

    KAnonymityAnalysis {
        quasi_identifiers: identifiers,
        average_uniqueness: average,
        estimated_k: k,
        risk,
        interpretation: format!(
            "Estimated anonymity set: {k} wallets share this behavioral profile ({} re-identification risk).",
            risk.as_str()
        ),
    }
}
