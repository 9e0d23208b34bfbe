//! Shannon-entropy analysis over four transaction attributes: amounts,
//! time-of-day buckets, counterparties, and type tags.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TransactionRecord;
use crate::engine::stats::{
    amount_bin_counts, clamp01, frequency_map, normalized_entropy, time_bucket_counts,
};

/// Weights for combining the four per-attribute entropies into
/// `total_entropy`. Counterparty diversity dominates because address reuse
/// is the strongest linkability signal.
const AMOUNT_WEIGHT: f64 = 0.30;
const TEMPORAL_WEIGHT: f64 = 0.20;
const COUNTERPARTY_WEIGHT: f64 = 0.35;
const TYPE_WEIGHT: f64 = 0.15;

/// Entropy analysis result. All `*_entropy` fields are normalized to [0,1];
/// the `*_bits` fields carry the un-normalized Shannon entropy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntropyAnalysis {
    pub amount_entropy: f64,
    pub temporal_entropy: f64,
    pub counterparty_entropy: f64,
    pub type_entropy: f64,
    /// Weighted combination, in [0,1]; higher is more private
    pub total_entropy: f64,
    pub amount_entropy_bits: f64,
    pub temporal_entropy_bits: f64,
    pub counterparty_entropy_bits: f64,
    pub type_entropy_bits: f64,
    pub interpretation: String,
}

impl EntropyAnalysis {
    fn empty() -> Self {
        Self {
            amount_entropy: 0.0,
            temporal_entropy: 0.0,
            counterparty_entropy: 0.0,
            type_entropy: 0.0,
            total_entropy: 0.0,
            amount_entropy_bits: 0.0,
            temporal_entropy_bits: 0.0,
            counterparty_entropy_bits: 0.0,
            type_entropy_bits: 0.0,
            interpretation: "No transaction history available; entropy metrics are neutral."
                .to_string(),
        }
    }
}

/// Compute entropy over amount / time / counterparty / type distributions.
///
/// Identical attribute values across all records yield zero entropy for that
/// dimension; maximally diverse values approach 1. Never panics; empty input
/// returns a zero-valued result.
#[must_use]
pub fn analyze_entropy(txs: &[TransactionRecord]) -> EntropyAnalysis {
    if txs.is_empty() {
        return EntropyAnalysis::empty();
    }

    let (amount_bits, amount_norm) = normalized_entropy(&amount_bin_counts(txs));
    let (temporal_bits, temporal_norm) = normalized_entropy(&time_bucket_counts(txs));

    let counterparty_counts: Vec<usize> =
        frequency_map(txs.iter().map(|t| t.counterparty.as_str()))
            .values()
            .copied()
            .collect();
    let (cp_bits, cp_norm) = normalized_entropy(&counterparty_counts);

    let type_counts: Vec<usize> = frequency_map(txs.iter().map(|t| t.tx_type.as_str()))
        .values()
        .copied()
        .collect();
    let (type_bits, type_norm) = normalized_entropy(&type_counts);

    let total = clamp01(
        AMOUNT_WEIGHT * amount_norm
            + TEMPORAL_WEIGHT * temporal_norm
            + COUNTERPARTY_WEIGHT * cp_norm
            + TYPE_WEIGHT * type_norm,
    );

    EntropyAnalysis {
        amount_entropy: amount_norm,
        temporal_entropy: temporal_norm,
        counterparty_entropy: cp_norm,
        type_entropy: type_norm,
        total_entropy: total,
        amount_entropy_bits: amount_bits,
        temporal_entropy_bits: temporal_bits,
        counterparty_entropy_bits: cp_bits,
        type_entropy_bits: type_bits,
        interpretation: interpret(total),
    }
}

fn interpret(total: f64) -> String {
    if total >= 0.7 {
        "High behavioral entropy: transaction patterns are hard to fingerprint.".to_string()
    } else if total >= 0.4 {
        "Moderate behavioral entropy: some dimensions show predictable patterns.".to_string()
    } else {
        "Low behavioral entropy: repetitive amounts, counterparties, or timing make this wallet easy to fingerprint.".to_string()
    }
}
