//! Address-clustering heuristics.
//!
//! Four independent heuristics borrowed from chain-analysis practice,
//! adapted to account-model ledgers. Confidence values are fixed heuristic
//! constants, not fitted probabilities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TransactionRecord;
use crate::engine::stats::{amount_key, clamp01, inter_arrival_gaps, mean};

const MIN_SAMPLE: usize = 3;

/// Sliding-window lookahead for the change-address heuristic.
const CHANGE_WINDOW: usize = 5;
/// Change candidate: follows within this many seconds...
const CHANGE_MAX_GAP_SECS: i64 = 60;
/// ...at under this fraction of the prior amount.
const CHANGE_AMOUNT_RATIO: f64 = 0.1;

/// Repetitions before a counterparty forms an address-cluster hypothesis.
const COMMON_COUNTERPARTY_THRESHOLD: usize = 3;
/// Positive transfers to one counterparty before it reads as a deposit flow.
const DEPOSIT_PATTERN_THRESHOLD: usize = 10;
/// Inter-arrival gaps under this fraction of the mean count as clustered.
const TEMPORAL_CLUSTER_RATIO: f64 = 0.2;
/// Exact amount repetitions before the value counts as a reused denomination.
const AMOUNT_REPEAT_THRESHOLD: usize = 3;

/// Heuristic constant, not computed: confidence attached to every detected
/// cluster.
const CLUSTER_CONFIDENCE: f64 = 0.65;

/// Weights combining the four heuristics into `clustering_vulnerability`.
const COMMON_COUNTERPARTY_WEIGHT: f64 = 0.30;
const CHANGE_ADDRESS_WEIGHT: f64 = 0.25;
const DEPOSIT_PATTERN_WEIGHT: f64 = 0.25;
const TEMPORAL_AMOUNT_WEIGHT: f64 = 0.20;

/// A cluster detected by one of the heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCluster {
    /// Which heuristic fired (e.g. "common_counterparty")
    pub heuristic: String,
    /// Addresses or signatures involved
    pub members: Vec<String>,
    /// Heuristic constant, not a statistical estimate
    pub confidence: f64,
}

/// Clustering-heuristics analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringAnalysis {
    pub common_counterparty_score: f64,
    pub change_address_score: f64,
    pub deposit_pattern_score: f64,
    pub temporal_amount_score: f64,
    /// Weighted combination, in [0,1]; lower is better
    pub clustering_vulnerability: f64,
    pub clusters: Vec<DetectedCluster>,
    pub interpretation: String,
}

impl ClusteringAnalysis {
    fn empty() -> Self {
        Self {
            common_counterparty_score: 0.0,
            change_address_score: 0.0,
            deposit_pattern_score: 0.0,
            temporal_amount_score: 0.0,
            clustering_vulnerability: 0.0,
            clusters: Vec::new(),
            interpretation: "Insufficient history for clustering analysis.".to_string(),
        }
    }
}

/// Run all four clustering heuristics over `txs`.
#[must_use]
pub fn analyze_clustering(txs: &[TransactionRecord]) -> ClusteringAnalysis {
    if txs.len() < MIN_SAMPLE {
        return ClusteringAnalysis::empty();
    }

    let mut clusters = Vec::new();

    // (a) Common-counterparty repetition.
    let mut cp_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tx in txs {
        *cp_counts.entry(tx.counterparty.as_str()).or_insert(0) += 1;
    }
    let repeated: Vec<(&str, usize)> = cp_counts
        .iter()
        .filter(|&(_, &c)| c >= COMMON_COUNTERPARTY_THRESHOLD)
        .map(|(cp, &c)| (*cp, c))
        .collect();
    for (cp, _) in &repeated {
        clusters.push(DetectedCluster {
            heuristic: "common_counterparty".to_string(),
            members: vec![(*cp).to_string()],
            confidence: CLUSTER_CONFIDENCE,
        });
    }
    let common_score = clamp01(repeated.len() as f64 / 5.0);

    // (b) Change-address heuristic over a time-sorted view.
    let mut sorted: Vec<&TransactionRecord> = txs.iter().collect();
    sorted.sort_by_key(|t| t.timestamp_seconds);
    let mut change_pairs = 0usize;
    for i in 0..sorted.len() {
        let prior = sorted[i];
        if prior.amount <= 0.0 {
            continue;
        }
        for follow in sorted.iter().skip(i + 1).take(CHANGE_WINDOW) {
            let gap = follow.timestamp_seconds - prior.timestamp_seconds;
            if gap > CHANGE_MAX_GAP_SECS {
                break;
            }
            if follow.counterparty != prior.counterparty
                && follow.amount > 0.0
                && follow.amount < prior.amount * CHANGE_AMOUNT_RATIO
            {
                change_pairs += 1;
                clusters.push(DetectedCluster {
                    heuristic: "change_address".to_string(),
                    members: vec![prior.signature.clone(), follow.signature.clone()],
                    confidence: CLUSTER_CONFIDENCE,
                });
            }
        }
    }
    let change_score = clamp01(change_pairs as f64 / 3.0);

    // (c) Deposit-pattern heuristic.
    let mut deposit_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tx in txs {
        if tx.amount > 0.0 {
            *deposit_counts.entry(tx.counterparty.as_str()).or_insert(0) += 1;
        }
    }
    let deposit_targets: Vec<&str> = deposit_counts
        .iter()
        .filter(|&(_, &c)| c >= DEPOSIT_PATTERN_THRESHOLD)
        .map(|(cp, _)| *cp)
        .collect();
    for cp in &deposit_targets {
        clusters.push(DetectedCluster {
            heuristic: "deposit_pattern".to_string(),
            members: vec![(*cp).to_string()],
            confidence: CLUSTER_CONFIDENCE,
        });
    }
    let deposit_score = clamp01(deposit_targets.len() as f64 / 2.0);

    // (d) Temporal + amount clustering.
    let gaps = inter_arrival_gaps(txs);
    let avg_gap = mean(&gaps);
    let tight_fraction = if gaps.is_empty() || avg_gap <= 0.0 {
        0.0
    } else {
        gaps.iter().filter(|&&g| g < avg_gap * TEMPORAL_CLUSTER_RATIO).count() as f64
            / gaps.len() as f64
    };

    let mut amount_counts: BTreeMap<String, usize> = BTreeMap::new();
    for tx in txs {
        *amount_counts.entry(amount_key(tx.amount)).or_insert(0) += 1;
    }
    let repeated_amounts = amount_counts
        .values()
        .filter(|&&c| c >= AMOUNT_REPEAT_THRESHOLD)
        .count();
    let temporal_amount_score =
        clamp01(0.5 * tight_fraction + 0.5 * (repeated_amounts as f64 / 3.0).min(1.0));

    let vulnerability = clamp01(
        COMMON_COUNTERPARTY_WEIGHT * common_score
            + CHANGE_ADDRESS_WEIGHT * change_score
            + DEPOSIT_PATTERN_WEIGHT * deposit_score
            + TEMPORAL_AMOUNT_WEIGHT * temporal_amount_score,
    );

    ClusteringAnalysis {
        common_counterparty_score: common_score,
        change_address_score: change_score,
        deposit_pattern_score: deposit_score,
        temporal_amount_score,
        clustering_vulnerability: vulnerability,
        clusters,
        interpretation: interpret(vulnerability),
    }
}

fn interpret(vulnerability: f64) -> String {
    if vulnerability >= 0.5 {
        "Strong clustering signals: standard chain-analysis heuristics would group this wallet's activity.".to_string()
    } else if vulnerability >= 0.25 {
        "Some clustering signals present.".to_string()
    } else {
        "Few clustering signals; activity resists standard grouping heuristics.".to_string()
    }
}
