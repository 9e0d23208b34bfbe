//! Mixer / tumbler usage detection.
//!
//! Flags fixed-denomination amounts and repeated-equal-amount groups as
//! CoinJoin-like structure, plus counterparty matches against the injected
//! mixer registry. Probabilities are heuristic pattern scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AddressRegistries, TransactionRecord};
use crate::engine::stats::{amount_key, clamp01};

const MIN_SAMPLE: usize = 3;

/// Common mixing denominations in SOL.
const FIXED_DENOMINATIONS: &[f64] = &[0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0];
const DENOMINATION_TOLERANCE: f64 = 1e-6;

/// Equal-amount group size that reads as CoinJoin-like.
const EQUAL_GROUP_THRESHOLD: usize = 3;

/// Probability above which mixer usage counts as detected.
const DETECTION_THRESHOLD: f64 = 0.5;

/// Component weights for the combined probability.
const DENOMINATION_WEIGHT: f64 = 0.35;
const EQUAL_GROUP_WEIGHT: f64 = 0.35;
const TUMBLER_WEIGHT: f64 = 0.5;

/// Mixing style suggested by the strongest signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MixerStyle {
    CoinjoinLike,
    Tumbler,
}

/// Mixer detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MixerAnalysis {
    /// Share of transactions at fixed denominations, in [0,1]
    pub fixed_denomination_fraction: f64,
    /// Number of amount values repeated >= 3 times
    pub equal_amount_groups: usize,
    /// True if a counterparty matched the mixer registry or name list
    pub tumbler_counterparty: bool,
    /// Combined probability, capped at 1
    pub mixer_probability: f64,
    pub mixer_usage_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<MixerStyle>,
    pub interpretation: String,
}

impl MixerAnalysis {
    fn empty() -> Self {
        Self {
            fixed_denomination_fraction: 0.0,
            equal_amount_groups: 0,
            tumbler_counterparty: false,
            mixer_probability: 0.0,
            mixer_usage_detected: false,
            style: None,
            interpretation: "Insufficient history for mixer detection.".to_string(),
        }
    }
}

/// Detect mixer-like structure in `txs` against the injected registries.
#[must_use]
pub fn detect_mixer(txs: &[TransactionRecord], registries: &AddressRegistries) -> MixerAnalysis {
    if txs.len() < MIN_SAMPLE {
        return MixerAnalysis::empty();
    }

    let denominated = txs
        .iter()
        .filter(|t| {
            FIXED_DENOMINATIONS
                .iter()
                .any(|d| (t.amount - d).abs() < DENOMINATION_TOLERANCE)
        })
        .count();
    let denomination_fraction = clamp01(denominated as f64 / txs.len() as f64);

    let mut amount_groups: BTreeMap<String, usize> = BTreeMap::new();
    for tx in txs {
        *amount_groups.entry(amount_key(tx.amount)).or_insert(0) += 1;
    }
    let equal_groups = amount_groups
        .values()
        .filter(|&&c| c >= EQUAL_GROUP_THRESHOLD)
        .count();

    let tumbler = txs.iter().any(|t| {
        AddressRegistries::match_entity(&registries.mixers, &t.counterparty).is_some()
            || registries.mixers.iter().any(|m| {
                t.counterparty
                    .to_lowercase()
                    .contains(&m.label.to_lowercase())
            })
    });

    let probability = clamp01(
        DENOMINATION_WEIGHT * denomination_fraction
            + EQUAL_GROUP_WEIGHT * (equal_groups as f64 / 3.0).min(1.0)
            + if tumbler { TUMBLER_WEIGHT } else { 0.0 },
    );
    let detected = probability >= DETECTION_THRESHOLD;

    let style = if tumbler {
        Some(MixerStyle::Tumbler)
    } else if detected {
        Some(MixerStyle::CoinjoinLike)
    } else {
        None
    };

    MixerAnalysis {
        fixed_denomination_fraction: denomination_fraction,
        equal_amount_groups: equal_groups,
        tumbler_counterparty: tumbler,
        mixer_probability: probability,
        mixer_usage_detected: detected,
        style,
        interpretation: match style {
            Some(MixerStyle::Tumbler) => {
                "Counterparty matches a known mixing service.".to_string()
            }
            Some(MixerStyle::CoinjoinLike) => {
                "Fixed-denomination and equal-amount structure resembles CoinJoin-style mixing."
                    .to_string()
            }
            None => "No mixing pattern detected.".to_string(),
        },
    }
}
