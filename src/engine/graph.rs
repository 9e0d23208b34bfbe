//! Local transaction-graph analysis.
//!
//! Only the analyzed address's star-shaped neighborhood is modeled: one
//! center node plus one node per distinct counterparty, edge weight =
//! interaction count. Centrality figures are local approximations, not
//! whole-ledger measurements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AddressRegistries, EntityKind, TransactionRecord};
use crate::engine::stats::clamp01;

/// PageRank damping factor.
const DAMPING: f64 = 0.85;
/// Fixed PageRank iteration count over the local adjacency.
const PAGERANK_ITERATIONS: usize = 20;
/// Interactions with one counterparty before it becomes a same-owner
/// cluster hypothesis.
const CLUSTER_REPEAT_THRESHOLD: usize = 3;
/// Heuristic constant, not computed: confidence attached to same-owner
/// cluster hypotheses.
const CLUSTER_CONFIDENCE: f64 = 0.6;

const MIN_SAMPLE: usize = 3;

/// A same-owner cluster hypothesis over a repeated counterparty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHypothesis {
    pub counterparty: String,
    pub interaction_count: usize,
    /// Heuristic constant, not a statistical estimate
    pub confidence: f64,
}

/// Graph / centrality analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphAnalysis {
    /// Distinct counterparties (star-graph degree)
    pub degree: usize,
    /// Approximation: share of counterparties with repeated interactions
    pub clustering_coefficient: f64,
    /// min(1, degree * clustering / 10)
    pub betweenness_approx: f64,
    /// 1 if any counterparty matches a known exchange/mixer/DeFi registry
    /// entry; null when unknown (not "far")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_entity_hop_distance: Option<u32>,
    /// Center node's PageRank over the local adjacency; visibility proxy
    pub network_visibility: f64,
    pub clusters: Vec<ClusterHypothesis>,
    pub interpretation: String,
}

impl GraphAnalysis {
    fn empty() -> Self {
        Self {
            degree: 0,
            clustering_coefficient: 0.0,
            betweenness_approx: 0.0,
            known_entity_hop_distance: None,
            network_visibility: 0.0,
            clusters: Vec::new(),
            interpretation: "Insufficient history for graph analysis.".to_string(),
        }
    }
}

/// Analyze the local counterparty graph of `txs`.
#[must_use]
pub fn analyze_graph(txs: &[TransactionRecord], registries: &AddressRegistries) -> GraphAnalysis {
    if txs.len() < MIN_SAMPLE {
        return GraphAnalysis::empty();
    }

    // Edge weights: counterparty -> interaction count (deterministic order).
    let mut weights: BTreeMap<&str, usize> = BTreeMap::new();
    for tx in txs {
        *weights.entry(tx.counterparty.as_str()).or_insert(0) += 1;
    }

    let degree = weights.len();
    let repeated = weights.values().filter(|&&w| w > 1).count();
    let clustering = if degree == 0 {
        0.0
    } else {
        clamp01(repeated as f64 / degree as f64)
    };
    let betweenness = clamp01(degree as f64 * clustering / 10.0);

    let hop_distance = weights
        .keys()
        .any(|cp| is_known_entity(registries, cp))
        .then_some(1);

    let visibility = center_pagerank(&weights);

    let mut clusters: Vec<ClusterHypothesis> = weights
        .iter()
        .filter(|&(_, &w)| w >= CLUSTER_REPEAT_THRESHOLD)
        .map(|(cp, &w)| ClusterHypothesis {
            counterparty: (*cp).to_string(),
            interaction_count: w,
            confidence: CLUSTER_CONFIDENCE,
        })
        .collect();
    clusters.sort_by(|a, b| b.interaction_count.cmp(&a.interaction_count));

    GraphAnalysis {
        degree,
        clustering_coefficient: clustering,
        betweenness_approx: betweenness,
        known_entity_hop_distance: hop_distance,
        network_visibility: visibility,
        clusters,
        interpretation: interpret(degree, hop_distance),
    }
}

fn is_known_entity(registries: &AddressRegistries, counterparty: &str) -> bool {
    AddressRegistries::match_entity(&registries.exchanges, counterparty)
        .map(|e| {
            matches!(
                e.kind,
                EntityKind::CexHotWallet | EntityKind::DexProgram | EntityKind::Defi
            )
        })
        .unwrap_or(false)
        || AddressRegistries::match_entity(&registries.mixers, counterparty).is_some()
        || AddressRegistries::match_entity(&registries.bridges, counterparty).is_some()
}

/// Iterative PageRank over the local star adjacency (center plus one node
/// per counterparty, undirected weighted edges). Returns the center node's
/// score; in a star this grows with how much traffic the center hubs.
fn center_pagerank(weights: &BTreeMap<&str, usize>) -> f64 {
    let n = weights.len() + 1;
    if n < 2 {
        return 0.0;
    }

    let total_weight: f64 = weights.values().map(|&w| w as f64).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }

    // ranks[0] = center, ranks[1..] = counterparties in map order.
    let mut ranks = vec![1.0 / n as f64; n];
    let edge_weights: Vec<f64> = weights.values().map(|&w| w as f64).collect();

    for _ in 0..PAGERANK_ITERATIONS {
        let mut next = vec![(1.0 - DAMPING) / n as f64; n];
        // Counterparty nodes have a single edge: all their rank flows to
        // the center. The center distributes proportionally to edge weight.
        for (i, w) in edge_weights.iter().enumerate() {
            next[0] += DAMPING * ranks[i + 1];
            next[i + 1] += DAMPING * ranks[0] * (w / total_weight);
        }
        ranks = next;
    }

    clamp01(ranks[0])
}

fn interpret(degree: usize, hop: Option<u32>) -> String {
    match hop {
        Some(1) => format!(
            "Wallet is one hop from a known entity across {degree} counterparties; direct attribution path exists."
        ),
        _ => format!(
            "Wallet interacts with {degree} counterparties with no registered known-entity link."
        ),
    }
}
